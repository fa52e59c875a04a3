use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::error::StorageError;
use super::traits::{AssetRef, ObjectStore};

/// In-memory object store used for local development and tests.
///
/// Assets are keyed by `{folder}/{uuid}` like the remote store. Failures can
/// be injected per call site: a substring match against the local path (for
/// uploads) or the public id (for destroys) makes that call fail, which is how
/// the workflow tests drive partial-failure scenarios.
#[derive(Default)]
pub struct InMemoryObjectStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    assets: HashMap<String, String>,
    fail_uploads: Vec<String>,
    fail_destroys: Vec<String>,
    failed_destroy_attempts: usize,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make any upload whose local path contains `needle` fail.
    pub fn fail_uploads_matching(&self, needle: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_uploads
            .push(needle.to_string());
    }

    /// Make any destroy whose public id contains `needle` fail.
    pub fn fail_destroys_matching(&self, needle: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_destroys
            .push(needle.to_string());
    }

    /// Whether an asset currently exists under `public_id`.
    pub fn contains(&self, public_id: &str) -> bool {
        self.inner.lock().unwrap().assets.contains_key(public_id)
    }

    /// Number of stored assets, across all folders.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of destroy calls that returned an error. Each failed
    /// compensating destroy corresponds to one leak warning upstream.
    pub fn failed_destroy_attempts(&self) -> usize {
        self.inner.lock().unwrap().failed_destroy_attempts
    }

    /// Number of assets under the given folder prefix.
    pub fn count_in_folder(&self, folder: &str) -> usize {
        let prefix = format!("{folder}/");
        self.inner
            .lock()
            .unwrap()
            .assets
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .count()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, local_path: &Path, folder: &str) -> Result<AssetRef, StorageError> {
        let mut inner = self.inner.lock().unwrap();

        let path_str = local_path.to_string_lossy();
        if inner.fail_uploads.iter().any(|n| path_str.contains(n)) {
            return Err(StorageError::Backend(format!(
                "injected upload failure for {path_str}"
            )));
        }

        let public_id = format!("{folder}/{}", Uuid::new_v4());
        let secure_url = format!("memory://{public_id}");
        inner.assets.insert(public_id.clone(), secure_url.clone());

        Ok(AssetRef {
            public_id,
            secure_url,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.fail_destroys.iter().any(|n| public_id.contains(n)) {
            inner.failed_destroy_attempts += 1;
            return Err(StorageError::Backend(format!(
                "injected destroy failure for {public_id}"
            )));
        }

        match inner.assets.remove(public_id) {
            Some(_) => Ok(()),
            None => {
                inner.failed_destroy_attempts += 1;
                Err(StorageError::NotFound(public_id.to_string()))
            }
        }
    }
}
