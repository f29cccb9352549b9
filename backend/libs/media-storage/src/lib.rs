/// Shared media storage for community uploads
///
/// Provides the upload policy (MIME allowlist, size ceiling), object key
/// generation and a `MediaStorage` trait with local-filesystem and S3
/// backends. Keys are UUID-based so concurrent requests never collide and
/// the attachment identity never depends on the on-disk layout.
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod config;
pub mod local;
pub mod s3;

pub use config::{StorageBackend, StorageConfig};
pub use local::LocalMediaStorage;
pub use s3::S3MediaStorage;

/// Size ceiling for composer uploads
pub const COMPOSER_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Size ceiling for profile-level assets (avatars, covers)
pub const PROFILE_ASSET_MAX_UPLOAD_BYTES: usize = 7 * 1024 * 1024;

/// Image types accepted from the composer
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("upload is empty")]
    Empty,

    #[error("upload is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Raw upload as received from the request layer
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    /// Content type claimed by the client
    pub declared_mime: String,
    pub original_name: Option<String>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, declared_mime: impl Into<String>) -> Self {
        Self {
            bytes,
            declared_mime: declared_mime.into(),
            original_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

/// Acceptance rules applied before anything touches the backend
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub allowed: Vec<String>,
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub fn composer(max_bytes: usize) -> Self {
        Self {
            allowed: ALLOWED_IMAGE_TYPES.iter().map(|s| s.to_string()).collect(),
            max_bytes,
        }
    }

    /// Validate an upload and return its normalized MIME type.
    ///
    /// The declared type must be on the allowlist and must agree with the
    /// magic bytes of the payload.
    pub fn check(&self, upload: &Upload) -> Result<String, StorageError> {
        if upload.bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: upload.bytes.len(),
                max: self.max_bytes,
            });
        }

        let declared = upload
            .declared_mime
            .parse::<mime::Mime>()
            .map(|m| m.essence_str().to_ascii_lowercase())
            .map_err(|_| StorageError::UnsupportedType(upload.declared_mime.clone()))?;

        if !self.allowed.iter().any(|a| a.eq_ignore_ascii_case(&declared)) {
            return Err(StorageError::UnsupportedType(declared));
        }

        match sniff_image_type(&upload.bytes) {
            Some(sniffed) if sniffed == declared => Ok(declared),
            Some(sniffed) => Err(StorageError::UnsupportedType(format!(
                "declared {} but content is {}",
                declared, sniffed
            ))),
            None => Err(StorageError::UnsupportedType(format!(
                "declared {} but content is not a recognized image",
                declared
            ))),
        }
    }
}

/// Storage collaborator used by the attachment store
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Validate and persist an upload, returning its storage key.
    ///
    /// `now` dates the key prefix.
    async fn save_upload(
        &self,
        upload: &Upload,
        policy: &UploadPolicy,
        now: DateTime<Utc>,
    ) -> Result<StoredObject, StorageError>;

    /// Remove a stored object. Removing a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL for a stored object
    fn public_url(&self, key: &str) -> String;
}

/// Detect the image type from magic bytes
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// File extension for an accepted MIME type
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Build a fresh object key: `<prefix>/<yyyy>/<mm>/<uuid>.<ext>`
pub fn object_key(prefix: &str, mime_type: &str, now: DateTime<Utc>) -> String {
    let prefix = prefix.trim_matches('/');
    let name = format!("{}.{}", Uuid::new_v4(), extension_for(mime_type));
    if prefix.is_empty() {
        format!("{:04}/{:02}/{}", now.year(), now.month(), name)
    } else {
        format!("{}/{:04}/{:02}/{}", prefix, now.year(), now.month(), name)
    }
}

/// Reject keys that could escape the storage root
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment == ".." || segment.is_empty())
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn test_policy_accepts_matching_png() {
        let policy = UploadPolicy::composer(COMPOSER_MAX_UPLOAD_BYTES);
        let upload = Upload::new(PNG.to_vec(), "image/png");
        assert_eq!(policy.check(&upload).unwrap(), "image/png");
    }

    #[test]
    fn test_policy_rejects_disallowed_type() {
        let policy = UploadPolicy::composer(COMPOSER_MAX_UPLOAD_BYTES);
        let upload = Upload::new(b"%PDF-1.7".to_vec(), "application/pdf");
        assert!(matches!(
            policy.check(&upload),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_policy_rejects_spoofed_type() {
        let policy = UploadPolicy::composer(COMPOSER_MAX_UPLOAD_BYTES);
        let upload = Upload::new(PNG.to_vec(), "image/jpeg");
        assert!(matches!(
            policy.check(&upload),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_policy_rejects_oversize_and_empty() {
        let policy = UploadPolicy::composer(4);
        let upload = Upload::new(PNG.to_vec(), "image/png");
        assert!(matches!(
            policy.check(&upload),
            Err(StorageError::TooLarge { size: 10, max: 4 })
        ));

        let empty = Upload::new(Vec::new(), "image/png");
        assert!(matches!(policy.check(&empty), Err(StorageError::Empty)));
    }

    #[test]
    fn test_declared_type_parameters_are_ignored() {
        let policy = UploadPolicy::composer(COMPOSER_MAX_UPLOAD_BYTES);
        let upload = Upload::new(PNG.to_vec(), "IMAGE/PNG; q=1");
        assert_eq!(policy.check(&upload).unwrap(), "image/png");
    }

    #[test]
    fn test_sniff_webp() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(sniff_image_type(&bytes), Some("image/webp"));
    }

    #[test]
    fn test_object_keys_are_unique_and_dated() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let a = object_key("community", "image/jpeg", now);
        let b = object_key("community", "image/jpeg", now);
        assert_ne!(a, b);
        assert!(a.starts_with("community/2026/03/"));
        assert!(a.ends_with(".jpg"));
        assert!(validate_key(&a).is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path.jpg").is_err());
        assert!(validate_key("a//b.jpg").is_err());
        assert!(validate_key("").is_err());
    }
}
