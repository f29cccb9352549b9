/// Storage configuration shared by the local and S3 backends
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local backend
    pub local_root: PathBuf,
    /// Base URL objects are served from
    pub public_base_url: String,
    /// S3 bucket name
    pub s3_bucket: String,
    /// Key prefix for community uploads
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_root: PathBuf::from("./uploads"),
            public_base_url: "/uploads".to_string(),
            s3_bucket: "curva-media".to_string(),
            key_prefix: "community".to_string(),
        }
    }
}

impl StorageConfig {
    /// Load storage configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "local" => StorageBackend::Local,
                "s3" => StorageBackend::S3,
                other => return Err(format!("unknown STORAGE_BACKEND '{}'", other)),
            },
            Err(_) => defaults.backend,
        };

        Ok(Self {
            backend,
            local_root: std::env::var("STORAGE_LOCAL_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_root),
            public_base_url: std::env::var("STORAGE_PUBLIC_BASE_URL")
                .unwrap_or(defaults.public_base_url),
            s3_bucket: std::env::var("S3_BUCKET").unwrap_or(defaults.s3_bucket),
            key_prefix: std::env::var("STORAGE_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        })
    }

    /// Public URL for an object key
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}
