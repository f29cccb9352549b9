pub mod intent;
pub mod lifecycle;
pub mod models;

pub use intent::{
    AttachmentPlan, ComposerAction, ComposerInput, ComposerMode, EditablePost, PostContent,
    PostIntent, TargetStatus,
};
pub use lifecycle::ensure_editable_by;
pub use models::*;
