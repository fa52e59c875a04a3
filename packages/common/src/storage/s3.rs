use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tokio::time::timeout;
use uuid::Uuid;

use super::error::StorageError;
use super::traits::{AssetRef, ObjectStore};

/// Connection settings for the S3-compatible media bucket.
#[derive(Clone, Debug)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers; empty for AWS.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL assets are publicly served from.
    pub public_base_url: String,
    /// Per-call deadline. A timed-out call counts as a failed call.
    pub timeout_secs: u64,
}

/// S3-backed object store.
///
/// Keys follow `{folder}/{uuid}.{ext}` so an asset's public id is also its
/// bucket key, and the public URL is `{public_base_url}/{public_id}`.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_base_url: String,
    timeout: Duration,
}

impl S3ObjectStore {
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let region = if config.endpoint.is_empty() {
            config
                .region
                .parse::<Region>()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?
        } else {
            Region::Custom {
                region: config.region.clone(),
                endpoint: config.endpoint.clone(),
            }
        };

        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .with_path_style();

        Ok(Self {
            bucket,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn object_key(local_path: &Path, folder: &str) -> String {
        match local_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{folder}/{}.{ext}", Uuid::new_v4()),
            None => format!("{folder}/{}", Uuid::new_v4()),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, local_path: &Path, folder: &str) -> Result<AssetRef, StorageError> {
        let content = tokio::fs::read(local_path).await?;
        let public_id = Self::object_key(local_path, folder);

        let response = timeout(self.timeout, self.bucket.put_object(&public_id, &content))
            .await
            .map_err(|_| StorageError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        if response.status_code() >= 300 {
            return Err(StorageError::Backend(format!(
                "put_object returned status {}",
                response.status_code()
            )));
        }

        Ok(AssetRef {
            secure_url: format!("{}/{public_id}", self.public_base_url),
            public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), StorageError> {
        let response = timeout(self.timeout, self.bucket.delete_object(public_id))
            .await
            .map_err(|_| StorageError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status_code() {
            code if code < 300 => Ok(()),
            404 => Err(StorageError::NotFound(public_id.to_string())),
            code => Err(StorageError::Backend(format!(
                "delete_object returned status {code}"
            ))),
        }
    }
}
