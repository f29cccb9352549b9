//! Composer Validator
//!
//! Pure validation of a composer submission into a `PostIntent`. Rules run
//! in a fixed precedence so the first failing rule decides the reason shown
//! to the user. Nothing here touches storage or the database.

use crate::config::ComposerConfig;
use crate::domain::intent::{
    AttachmentPlan, ComposerAction, ComposerInput, ComposerMode, EditablePost, PostContent,
    PostIntent, TargetStatus,
};
use crate::domain::lifecycle::ensure_editable_by;
use crate::domain::models::{
    MAX_BODY_CHARS, MAX_POLL_OPTIONS, MAX_POLL_OPTION_CHARS, MAX_POLL_QUESTION_CHARS,
    MIN_POLL_OPTIONS,
};
use crate::error::{AuthorizationError, Rejection, ServiceResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

const NAIVE_SCHEDULE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone)]
pub struct ComposerValidator {
    config: ComposerConfig,
}

impl ComposerValidator {
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Validate a submission.
    ///
    /// `existing` must be the post referenced by `input.post_id` when the
    /// submission edits a saved draft or scheduled post.
    pub fn validate(
        &self,
        author_id: Uuid,
        input: ComposerInput,
        existing: Option<&EditablePost>,
        now: DateTime<Utc>,
    ) -> ServiceResult<PostIntent> {
        let mode = self.normalize_mode(input.mode.as_deref())?;
        let action = self.normalize_action(input.action.as_deref())?;

        // Kept ids only count when they belong to the edited post, in the
        // order the post currently has them.
        let keep: Vec<Uuid> = existing
            .map(|e| {
                e.attachments
                    .iter()
                    .filter(|a| input.keep_attachment_ids.contains(&a.id))
                    .map(|a| a.id)
                    .collect()
            })
            .unwrap_or_default();

        let intents = input.attachment_intents(keep.len());
        let max = self.config.max_attachments();
        if intents > max {
            return Err(Rejection::TooManyAttachments { max }.into());
        }

        let body = input.message.trim().to_string();
        if mode == ComposerMode::Text && body.is_empty() {
            return Err(Rejection::EmptyBody.into());
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(Rejection::BodyTooLong {
                max: MAX_BODY_CHARS,
            }
            .into());
        }

        if mode != ComposerMode::Photo && intents > 0 {
            return Err(Rejection::AttachmentsNotAllowed.into());
        }
        if mode == ComposerMode::Photo && intents == 0 {
            return Err(Rejection::MissingPhoto.into());
        }

        let content = match mode {
            ComposerMode::Text => PostContent::Text { body },
            ComposerMode::Photo => {
                let mut uploads = input.uploads;
                uploads.extend(input.pasted_image);
                PostContent::Photo {
                    body,
                    attachments: AttachmentPlan { keep, uploads },
                }
            }
            ComposerMode::Poll => {
                let question = input.poll_question.trim().to_string();
                if question.is_empty() {
                    return Err(Rejection::MissingPollQuestion.into());
                }
                if question.chars().count() > MAX_POLL_QUESTION_CHARS {
                    return Err(Rejection::PollQuestionTooLong {
                        max: MAX_POLL_QUESTION_CHARS,
                    }
                    .into());
                }
                let options = normalize_poll_options(&input.poll_options);
                if options.len() < MIN_POLL_OPTIONS {
                    return Err(Rejection::NotEnoughPollOptions.into());
                }
                PostContent::Poll {
                    body,
                    question,
                    options,
                }
            }
        };

        let target = match action {
            ComposerAction::Publish => TargetStatus::Published,
            ComposerAction::Draft => TargetStatus::Draft,
            ComposerAction::Schedule => {
                TargetStatus::Scheduled(self.check_schedule(input.scheduled_at.as_deref(), now)?)
            }
        };

        if let Some(post_id) = input.post_id {
            let existing = existing
                .filter(|e| e.post.id == post_id)
                .ok_or(AuthorizationError::PostNotFound)?;
            ensure_editable_by(&existing.post, author_id)?;
        }

        Ok(PostIntent {
            post_id: input.post_id,
            author_id,
            content,
            target,
        })
    }

    fn normalize_mode(&self, raw: Option<&str>) -> Result<ComposerMode, Rejection> {
        let value = raw.map(|m| m.trim().to_ascii_lowercase()).unwrap_or_default();
        match value.as_str() {
            "text" => Ok(ComposerMode::Text),
            "photo" | "gallery" => Ok(ComposerMode::Photo),
            "poll" => Ok(ComposerMode::Poll),
            "" => Ok(ComposerMode::Text),
            other if self.config.strict_enums => Err(Rejection::UnknownMode(other.to_string())),
            _ => Ok(ComposerMode::Text),
        }
    }

    fn normalize_action(&self, raw: Option<&str>) -> Result<ComposerAction, Rejection> {
        let value = raw.map(|a| a.trim().to_ascii_lowercase()).unwrap_or_default();
        match value.as_str() {
            "publish" => Ok(ComposerAction::Publish),
            "schedule" => Ok(ComposerAction::Schedule),
            "draft" => Ok(ComposerAction::Draft),
            "" => Ok(ComposerAction::Publish),
            other if self.config.strict_enums => Err(Rejection::UnknownAction(other.to_string())),
            _ => Ok(ComposerAction::Publish),
        }
    }

    fn check_schedule(
        &self,
        raw: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, Rejection> {
        let raw = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(Rejection::MissingScheduleTime)?;

        let at = parse_schedule_time(raw, self.config.local_utc_offset_minutes)
            .ok_or_else(|| Rejection::InvalidScheduleTime(raw.to_string()))?;

        let lead = self.config.min_schedule_lead_secs;
        if at < now + Duration::seconds(lead) {
            return Err(Rejection::ScheduleTooSoon {
                min_minutes: (lead + 59) / 60,
            });
        }
        Ok(at)
    }
}

/// Trim, truncate and drop empty options, keeping at most four
pub fn normalize_poll_options(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|o| o.trim().chars().take(MAX_POLL_OPTION_CHARS).collect::<String>())
        .map(|o| o.trim_end().to_string())
        .filter(|o| !o.is_empty())
        .take(MAX_POLL_OPTIONS)
        .collect()
}

/// Parse an RFC 3339 timestamp, or a zone-less form value read in the
/// configured local offset
pub fn parse_schedule_time(raw: &str, offset_minutes: i32) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    let offset = FixedOffset::east_opt(offset_minutes * 60)?;
    NAIVE_SCHEDULE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|at| at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Attachment, ContentType, Post, PostStatus};
    use crate::error::ServiceError;
    use chrono::TimeZone;
    use media_storage::Upload;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 0).unwrap()
    }

    fn validator() -> ComposerValidator {
        ComposerValidator::new(ComposerConfig::default())
    }

    fn jpeg() -> Upload {
        Upload::new(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg").with_name("img1.jpg")
    }

    fn input(mode: &str, action: &str, message: &str) -> ComposerInput {
        ComposerInput {
            mode: Some(mode.to_string()),
            action: Some(action.to_string()),
            message: message.to_string(),
            ..ComposerInput::default()
        }
    }

    fn rejection(result: ServiceResult<PostIntent>) -> Rejection {
        match result {
            Err(ServiceError::Rejected(r)) => r,
            other => panic!("expected rejection, got {:?}", other.map(|i| i.target)),
        }
    }

    fn editable(author_id: Uuid, status: PostStatus, attachments: usize) -> EditablePost {
        let post_id = Uuid::new_v4();
        EditablePost {
            post: Post {
                id: post_id,
                author_id,
                body: String::new(),
                content_type: ContentType::Photo,
                poll: None,
                status,
                scheduled_for: None,
                published_at: None,
                legacy_media_url: None,
                cover_attachment_id: None,
                created_at: now(),
                updated_at: now(),
            },
            attachments: (0..attachments)
                .map(|i| Attachment {
                    id: Uuid::new_v4(),
                    post_id,
                    storage_key: format!("community/2026/05/{i}.jpg"),
                    mime_type: "image/jpeg".to_string(),
                    position: i as i32,
                    created_at: now(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_photo_publish_with_one_upload() {
        let mut submission = input("photo", "publish", "Forza!");
        submission.uploads = vec![jpeg()];

        let intent = validator()
            .validate(Uuid::new_v4(), submission, None, now())
            .unwrap();

        assert_eq!(intent.target, TargetStatus::Published);
        assert_eq!(intent.content.content_type(), ContentType::Photo);
        assert_eq!(intent.content.body(), "Forza!");
    }

    #[test]
    fn test_unknown_mode_and_action_default() {
        let intent = validator()
            .validate(Uuid::new_v4(), input("video", "boost", "ciao"), None, now())
            .unwrap();
        assert_eq!(intent.content.content_type(), ContentType::Text);
        assert_eq!(intent.target, TargetStatus::Published);

        let intent = validator()
            .validate(
                Uuid::new_v4(),
                ComposerInput {
                    message: "ciao".to_string(),
                    ..ComposerInput::default()
                },
                None,
                now(),
            )
            .unwrap();
        assert_eq!(intent.target, TargetStatus::Published);
    }

    #[test]
    fn test_strict_enums_reject_unknown_values() {
        let strict = ComposerValidator::new(ComposerConfig {
            strict_enums: true,
            ..ComposerConfig::default()
        });
        assert_eq!(
            rejection(strict.validate(Uuid::new_v4(), input("video", "publish", "x"), None, now())),
            Rejection::UnknownMode("video".to_string())
        );
        assert_eq!(
            rejection(strict.validate(Uuid::new_v4(), input("text", "boost", "x"), None, now())),
            Rejection::UnknownAction("boost".to_string())
        );
    }

    #[test]
    fn test_attachment_ceiling_checked_first() {
        let mut submission = input("text", "publish", "");
        submission.uploads = vec![jpeg(), jpeg(), jpeg(), jpeg()];
        submission.pasted_image = Some(jpeg());

        assert_eq!(
            rejection(validator().validate(Uuid::new_v4(), submission, None, now())),
            Rejection::TooManyAttachments { max: 4 }
        );
    }

    #[test]
    fn test_single_attachment_without_gallery() {
        let v = ComposerValidator::new(ComposerConfig {
            gallery_enabled: false,
            ..ComposerConfig::default()
        });
        let mut submission = input("photo", "publish", "");
        submission.uploads = vec![jpeg(), jpeg()];

        assert_eq!(
            rejection(v.validate(Uuid::new_v4(), submission, None, now())),
            Rejection::TooManyAttachments { max: 1 }
        );
    }

    #[test]
    fn test_text_requires_body() {
        assert_eq!(
            rejection(validator().validate(Uuid::new_v4(), input("text", "publish", "   "), None, now())),
            Rejection::EmptyBody
        );
    }

    #[test]
    fn test_body_over_limit_rejected() {
        let long = "a".repeat(MAX_BODY_CHARS + 1);
        assert_eq!(
            rejection(validator().validate(Uuid::new_v4(), input("text", "publish", &long), None, now())),
            Rejection::BodyTooLong { max: 500 }
        );
    }

    #[test]
    fn test_attachments_are_photo_only() {
        for mode in ["text", "poll"] {
            let mut submission = input(mode, "publish", "ciao");
            submission.pasted_image = Some(jpeg());
            assert_eq!(
                rejection(validator().validate(Uuid::new_v4(), submission, None, now())),
                Rejection::AttachmentsNotAllowed
            );
        }
    }

    #[test]
    fn test_photo_requires_an_image() {
        assert_eq!(
            rejection(validator().validate(Uuid::new_v4(), input("photo", "publish", "x"), None, now())),
            Rejection::MissingPhoto
        );
    }

    #[test]
    fn test_poll_with_two_non_empty_options_is_accepted() {
        let mut submission = input("poll", "publish", "");
        submission.poll_question = "Chi in attacco?".to_string();
        submission.poll_options = vec!["A".into(), "B".into(), "".into()];

        let intent = validator()
            .validate(Uuid::new_v4(), submission, None, now())
            .unwrap();
        let (question, options) = intent.content.poll().unwrap();
        assert_eq!(question, "Chi in attacco?");
        assert_eq!(options, ["A", "B"]);
    }

    #[test]
    fn test_poll_rules() {
        let mut no_question = input("poll", "publish", "");
        no_question.poll_options = vec!["A".into(), "B".into()];
        assert_eq!(
            rejection(validator().validate(Uuid::new_v4(), no_question, None, now())),
            Rejection::MissingPollQuestion
        );

        let mut one_option = input("poll", "publish", "");
        one_option.poll_question = "Chi?".to_string();
        one_option.poll_options = vec!["A".into(), "   ".into()];
        assert_eq!(
            rejection(validator().validate(Uuid::new_v4(), one_option, None, now())),
            Rejection::NotEnoughPollOptions
        );
        assert_eq!(
            Rejection::NotEnoughPollOptions.to_string(),
            "Aggiungi almeno due opzioni."
        );
    }

    #[test]
    fn test_poll_options_trimmed_truncated_and_capped() {
        let raw: Vec<String> = vec![
            "  uno ".into(),
            "".into(),
            "x".repeat(200),
            "tre".into(),
            "quattro".into(),
            "cinque".into(),
        ];
        let options = normalize_poll_options(&raw);
        assert_eq!(options.len(), 4);
        assert_eq!(options[0], "uno");
        assert_eq!(options[1].chars().count(), MAX_POLL_OPTION_CHARS);
        assert_eq!(options[3], "quattro");
    }

    #[test]
    fn test_schedule_lead_time() {
        let mut too_soon = input("text", "schedule", "dopo");
        too_soon.scheduled_at = Some((now() + Duration::minutes(4)).to_rfc3339());
        assert_eq!(
            rejection(validator().validate(Uuid::new_v4(), too_soon, None, now())),
            Rejection::ScheduleTooSoon { min_minutes: 5 }
        );

        let at = now() + Duration::minutes(5) + Duration::seconds(1);
        let mut ok = input("text", "schedule", "dopo");
        ok.scheduled_at = Some(at.to_rfc3339());
        let intent = validator().validate(Uuid::new_v4(), ok, None, now()).unwrap();
        assert_eq!(intent.target, TargetStatus::Scheduled(at));
    }

    #[test]
    fn test_schedule_requires_parseable_time() {
        let missing = input("text", "schedule", "dopo");
        assert_eq!(
            rejection(validator().validate(Uuid::new_v4(), missing, None, now())),
            Rejection::MissingScheduleTime
        );

        let mut garbage = input("text", "schedule", "dopo");
        garbage.scheduled_at = Some("domani sera".to_string());
        assert_eq!(
            rejection(validator().validate(Uuid::new_v4(), garbage, None, now())),
            Rejection::InvalidScheduleTime("domani sera".to_string())
        );
    }

    #[test]
    fn test_naive_schedule_time_uses_local_offset() {
        let at = parse_schedule_time("2026-05-01T20:30", 60).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 5, 1, 19, 30, 0).unwrap());

        let at = parse_schedule_time("2026-05-01 20:30:15", 0).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 5, 1, 20, 30, 15).unwrap());
    }

    #[test]
    fn test_editing_requires_owner_and_unpublished_post() {
        let owner = Uuid::new_v4();

        let draft = editable(owner, PostStatus::Draft, 0);
        let mut submission = input("text", "publish", "ciao");
        submission.post_id = Some(draft.post.id);
        let err = validator()
            .validate(Uuid::new_v4(), submission, Some(&draft), now())
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Unauthorized(AuthorizationError::NotOwner)
        ));

        let published = editable(owner, PostStatus::Published, 0);
        let mut submission = input("text", "draft", "ciao");
        submission.post_id = Some(published.post.id);
        let err = validator()
            .validate(owner, submission, Some(&published), now())
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Unauthorized(AuthorizationError::AlreadyPublished)
        ));
    }

    #[test]
    fn test_kept_ids_follow_existing_order_and_ignore_foreign_ids() {
        let owner = Uuid::new_v4();
        let draft = editable(owner, PostStatus::Draft, 3);
        let first = draft.attachments[0].id;
        let third = draft.attachments[2].id;

        let mut submission = input("photo", "draft", "");
        submission.post_id = Some(draft.post.id);
        submission.keep_attachment_ids = vec![third, Uuid::new_v4(), first];

        let intent = validator()
            .validate(owner, submission, Some(&draft), now())
            .unwrap();
        let plan = intent.content.into_attachment_plan();
        assert_eq!(plan.keep, vec![first, third]);
        assert!(plan.uploads.is_empty());
    }
}
