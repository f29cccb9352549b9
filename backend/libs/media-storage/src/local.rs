/// Local filesystem backend
use crate::{object_key, validate_key, MediaStorage, StorageConfig, StorageError, StoredObject};
use crate::{Upload, UploadPolicy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
    key_prefix: String,
    public_base_url: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, key_prefix: &str, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            key_prefix: key_prefix.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.local_root.clone(),
            &config.key_prefix,
            &config.public_base_url,
        )
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn save_upload(
        &self,
        upload: &Upload,
        policy: &UploadPolicy,
        now: DateTime<Utc>,
    ) -> Result<StoredObject, StorageError> {
        let mime_type = policy.check(upload)?;
        let key = object_key(&self.key_prefix, &mime_type, now);
        let path = self.path_for(&key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &upload.bytes).await?;

        tracing::debug!(key = %key, size = upload.bytes.len(), "stored upload on local disk");

        Ok(StoredObject {
            key,
            mime_type,
            size_bytes: upload.bytes.len(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::COMPOSER_MAX_UPLOAD_BYTES;
    use chrono::TimeZone;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[tokio::test]
    async fn test_save_and_delete_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "community", "/uploads");
        let policy = UploadPolicy::composer(COMPOSER_MAX_UPLOAD_BYTES);

        let now = Utc.with_ymd_and_hms(2026, 11, 2, 9, 30, 0).unwrap();

        let stored = storage
            .save_upload(&Upload::new(JPEG.to_vec(), "image/jpeg"), &policy, now)
            .await
            .unwrap();

        let path = dir.path().join(&stored.key);
        assert!(path.exists());
        assert!(stored.key.starts_with("community/2026/11/"));
        assert_eq!(stored.mime_type, "image/jpeg");
        assert_eq!(storage.public_url(&stored.key), format!("/uploads/{}", stored.key));

        storage.delete(&stored.key).await.unwrap();
        assert!(!path.exists());

        // Second delete is a no-op
        storage.delete(&stored.key).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "community", "/uploads");
        let policy = UploadPolicy::composer(COMPOSER_MAX_UPLOAD_BYTES);

        let result = storage
            .save_upload(
                &Upload::new(b"not an image".to_vec(), "image/png"),
                &policy,
                Utc::now(),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_refuses_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "community", "/uploads");
        assert!(matches!(
            storage.delete("../outside.jpg").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
