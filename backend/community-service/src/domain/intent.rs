//! Composer input and the validated post intent
//!
//! `ComposerInput` is the loosely shaped form submission. The validator
//! turns it into a `PostIntent` whose content is a closed variant, so mode
//! dependent fields only exist where they apply.

use crate::domain::models::{Attachment, ContentType, Post, PostStatus};
use chrono::{DateTime, Utc};
use media_storage::Upload;
use uuid::Uuid;

/// Raw composer submission
#[derive(Debug, Clone, Default)]
pub struct ComposerInput {
    /// Set when editing an existing draft or scheduled post
    pub post_id: Option<Uuid>,
    pub mode: Option<String>,
    pub action: Option<String>,
    pub message: String,
    pub poll_question: String,
    pub poll_options: Vec<String>,
    /// Schedule timestamp as submitted (RFC 3339 or a zone-less form value)
    pub scheduled_at: Option<String>,
    /// Existing attachments to keep, by id
    pub keep_attachment_ids: Vec<Uuid>,
    pub uploads: Vec<Upload>,
    /// Image pasted from the clipboard, appended after regular uploads
    pub pasted_image: Option<Upload>,
}

impl ComposerInput {
    pub fn attachment_intents(&self, kept_existing: usize) -> usize {
        kept_existing + self.uploads.len() + usize::from(self.pasted_image.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerMode {
    Text,
    Photo,
    Poll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerAction {
    Publish,
    Schedule,
    Draft,
}

/// Status the submission should leave the post in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Draft,
    Scheduled(DateTime<Utc>),
    Published,
}

impl TargetStatus {
    pub fn status(&self) -> PostStatus {
        match self {
            TargetStatus::Draft => PostStatus::Draft,
            TargetStatus::Scheduled(_) => PostStatus::Scheduled,
            TargetStatus::Published => PostStatus::Published,
        }
    }

    pub fn scheduled_for(&self) -> Option<DateTime<Utc>> {
        match self {
            TargetStatus::Scheduled(at) => Some(*at),
            _ => None,
        }
    }
}

/// Attachment reconciliation instructions for a photo post
#[derive(Debug, Clone, Default)]
pub struct AttachmentPlan {
    /// Existing attachment ids to keep, in their current order
    pub keep: Vec<Uuid>,
    /// New uploads to append after the kept ones
    pub uploads: Vec<Upload>,
}

impl AttachmentPlan {
    pub fn total(&self) -> usize {
        self.keep.len() + self.uploads.len()
    }
}

/// Mode-specific content of a validated submission
#[derive(Debug, Clone)]
pub enum PostContent {
    Text {
        body: String,
    },
    Photo {
        body: String,
        attachments: AttachmentPlan,
    },
    Poll {
        body: String,
        question: String,
        options: Vec<String>,
    },
}

impl PostContent {
    pub fn body(&self) -> &str {
        match self {
            PostContent::Text { body }
            | PostContent::Photo { body, .. }
            | PostContent::Poll { body, .. } => body,
        }
    }

    /// Persisted content type; a photo post with several images is a gallery
    pub fn content_type(&self) -> ContentType {
        match self {
            PostContent::Text { .. } => ContentType::Text,
            PostContent::Photo { attachments, .. } if attachments.total() > 1 => {
                ContentType::Gallery
            }
            PostContent::Photo { .. } => ContentType::Photo,
            PostContent::Poll { .. } => ContentType::Poll,
        }
    }

    pub fn poll(&self) -> Option<(&str, &[String])> {
        match self {
            PostContent::Poll {
                question, options, ..
            } => Some((question.as_str(), options.as_slice())),
            _ => None,
        }
    }

    /// Kept ids and uploads; empty for non-photo content
    pub fn into_attachment_plan(self) -> AttachmentPlan {
        match self {
            PostContent::Photo { attachments, .. } => attachments,
            _ => AttachmentPlan::default(),
        }
    }
}

/// Normalized, validated composer submission
#[derive(Debug, Clone)]
pub struct PostIntent {
    /// `None` creates a new post
    pub post_id: Option<Uuid>,
    pub author_id: Uuid,
    pub content: PostContent,
    pub target: TargetStatus,
}

/// A draft or scheduled post reopened in the composer
#[derive(Debug, Clone, serde::Serialize)]
pub struct EditablePost {
    pub post: Post,
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> Upload {
        Upload::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg")
    }

    #[test]
    fn test_photo_with_several_images_is_gallery() {
        let single = PostContent::Photo {
            body: String::new(),
            attachments: AttachmentPlan {
                keep: vec![],
                uploads: vec![upload()],
            },
        };
        assert_eq!(single.content_type(), ContentType::Photo);

        let several = PostContent::Photo {
            body: String::new(),
            attachments: AttachmentPlan {
                keep: vec![Uuid::new_v4()],
                uploads: vec![upload()],
            },
        };
        assert_eq!(several.content_type(), ContentType::Gallery);
    }

    #[test]
    fn test_non_photo_content_has_empty_plan() {
        let text = PostContent::Text {
            body: "ciao".to_string(),
        };
        assert_eq!(text.into_attachment_plan().total(), 0);
    }

    #[test]
    fn test_pasted_image_counts_as_attachment_intent() {
        let input = ComposerInput {
            uploads: vec![upload()],
            pasted_image: Some(upload()),
            ..ComposerInput::default()
        };
        assert_eq!(input.attachment_intents(2), 4);
    }
}
