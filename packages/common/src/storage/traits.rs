use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Durable reference to an asset held by the external object store.
///
/// The two fields form one value: a record either carries the whole pair or
/// carries nothing. They are persisted together as a single JSON column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AssetRef {
    /// Stable storage identifier used for deletion.
    pub public_id: String,
    /// Publicly retrievable URL.
    pub secure_url: String,
}

/// Remote object storage for uploaded media.
///
/// Calls are at-least-once network operations: they may fail or time out, and
/// callers own the compensating cleanup for anything already confirmed.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file into the named folder.
    ///
    /// Returns the confirmed asset reference on success. On failure nothing is
    /// retained under the returned id.
    async fn upload(&self, local_path: &Path, folder: &str) -> Result<AssetRef, StorageError>;

    /// Delete an asset by its storage identifier.
    ///
    /// Deleting an id that does not exist is an error (`NotFound`), so callers
    /// can distinguish a lost asset from a clean removal.
    async fn destroy(&self, public_id: &str) -> Result<(), StorageError>;
}
