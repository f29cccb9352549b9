pub mod attachments;
pub mod composer;
pub mod engagement;
pub mod feed;
pub mod lifecycle;
pub mod mentions;

pub use composer::ComposerValidator;
pub use engagement::EngagementLedger;
pub use feed::{CommentView, FeedAssembler, FeedPost, MediaItem, MediaSet};
pub use lifecycle::{PostLifecycleService, SubmitOutcome};
pub use mentions::{extract_handles, MentionResolver, RenderedContent};
