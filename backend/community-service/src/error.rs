/// Error types for community-service
///
/// Rejections (bad composer input) and authorization failures are typed
/// outcomes returned to the caller with a user-facing reason. Storage and
/// persistence faults keep their full detail for the logs and collapse to a
/// generic message when surfaced.
use media_storage::StorageError;
use thiserror::Error;

/// Message shown for every storage or persistence fault
pub const GENERIC_FAULT_MESSAGE: &str = "Servizio non disponibile, riprova più tardi.";

/// Composer and comment input rejected by validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Tipo di post non riconosciuto.")]
    UnknownMode(String),

    #[error("Azione non riconosciuta.")]
    UnknownAction(String),

    #[error("Puoi allegare al massimo {max} immagini.")]
    TooManyAttachments { max: usize },

    #[error("Scrivi qualcosa prima di pubblicare.")]
    EmptyBody,

    #[error("Il testo supera i {max} caratteri.")]
    BodyTooLong { max: usize },

    #[error("Le immagini sono consentite solo nei post foto.")]
    AttachmentsNotAllowed,

    #[error("Aggiungi almeno una foto.")]
    MissingPhoto,

    #[error("Scrivi la domanda del sondaggio.")]
    MissingPollQuestion,

    #[error("La domanda supera i {max} caratteri.")]
    PollQuestionTooLong { max: usize },

    #[error("Aggiungi almeno due opzioni.")]
    NotEnoughPollOptions,

    #[error("Indica data e ora di pubblicazione.")]
    MissingScheduleTime,

    #[error("Data di pubblicazione non valida.")]
    InvalidScheduleTime(String),

    #[error("La programmazione deve essere ad almeno {min_minutes} minuti da adesso.")]
    ScheduleTooSoon { min_minutes: i64 },

    #[error("Immagine non valida: {0}")]
    InvalidUpload(String),

    #[error("Il commento è vuoto.")]
    EmptyComment,

    #[error("Il commento supera i {max} caratteri.")]
    CommentTooLong { max: usize },
}

impl Rejection {
    /// Stable label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::UnknownMode(_) => "unknown_mode",
            Rejection::UnknownAction(_) => "unknown_action",
            Rejection::TooManyAttachments { .. } => "too_many_attachments",
            Rejection::EmptyBody => "empty_body",
            Rejection::BodyTooLong { .. } => "body_too_long",
            Rejection::AttachmentsNotAllowed => "attachments_not_allowed",
            Rejection::MissingPhoto => "missing_photo",
            Rejection::MissingPollQuestion => "missing_poll_question",
            Rejection::PollQuestionTooLong { .. } => "poll_question_too_long",
            Rejection::NotEnoughPollOptions => "not_enough_poll_options",
            Rejection::MissingScheduleTime => "missing_schedule_time",
            Rejection::InvalidScheduleTime(_) => "invalid_schedule_time",
            Rejection::ScheduleTooSoon { .. } => "schedule_too_soon",
            Rejection::InvalidUpload(_) => "invalid_upload",
            Rejection::EmptyComment => "empty_comment",
            Rejection::CommentTooLong { .. } => "comment_too_long",
        }
    }
}

/// Caller is not allowed to perform the operation on the target
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Devi accedere per continuare.")]
    Unauthenticated,

    #[error("Sessione scaduta, ricarica la pagina.")]
    CsrfInvalid,

    #[error("Non puoi modificare questo post.")]
    NotOwner,

    #[error("Il post è già stato pubblicato.")]
    AlreadyPublished,

    #[error("Post non trovato.")]
    PostNotFound,

    #[error("Notizia non trovata.")]
    NewsItemNotFound,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthorizationError),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Upload problems caused by the client are rejections, the rest are faults
impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Empty
            | StorageError::TooLarge { .. }
            | StorageError::UnsupportedType(_) => {
                ServiceError::Rejected(Rejection::InvalidUpload(err.to_string()))
            }
            other => ServiceError::Storage(other),
        }
    }
}

impl ServiceError {
    /// True for storage and persistence faults, false for typed rejections
    pub fn is_fault(&self) -> bool {
        !matches!(
            self,
            ServiceError::Rejected(_) | ServiceError::Unauthorized(_)
        )
    }

    /// Message safe to show to the end user.
    ///
    /// Faults never leak SQL, paths or backend detail.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Rejected(rejection) => rejection.to_string(),
            ServiceError::Unauthorized(reason) => reason.to_string(),
            _ => GENERIC_FAULT_MESSAGE.to_string(),
        }
    }

    /// Stable label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Rejected(rejection) => rejection.kind(),
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Storage(_) => "storage",
            ServiceError::Database(_) => "database",
            ServiceError::Internal(_) => "internal",
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
