/// S3 backend for media uploads
use crate::{object_key, validate_key, MediaStorage, StorageConfig, StorageError, StoredObject};
use crate::{Upload, UploadPolicy};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct S3MediaStorage {
    client: Arc<Client>,
    config: StorageConfig,
}

impl S3MediaStorage {
    pub fn new(client: Arc<Client>, config: StorageConfig) -> Self {
        Self { client, config }
    }

    /// Create a client from the ambient AWS environment
    pub async fn from_env(config: StorageConfig) -> Self {
        let aws_config = aws_config::load_from_env().await;
        let client = Client::new(&aws_config);
        Self::new(Arc::new(client), config)
    }
}

#[async_trait]
impl MediaStorage for S3MediaStorage {
    async fn save_upload(
        &self,
        upload: &Upload,
        policy: &UploadPolicy,
        now: DateTime<Utc>,
    ) -> Result<StoredObject, StorageError> {
        let mime_type = policy.check(upload)?;
        let key = object_key(&self.config.key_prefix, &mime_type, now);

        self.client
            .put_object()
            .bucket(&self.config.s3_bucket)
            .key(&key)
            .content_type(&mime_type)
            .body(ByteStream::from(upload.bytes.clone()))
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        tracing::debug!(key = %key, bucket = %self.config.s3_bucket, "stored upload in S3");

        Ok(StoredObject {
            key,
            mime_type,
            size_bytes: upload.bytes.len(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        // S3 DeleteObject already succeeds for missing keys
        self.client
            .delete_object()
            .bucket(&self.config.s3_bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.config.public_url(key)
    }
}
