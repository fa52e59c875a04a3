//! Compensating workflow executor.
//!
//! Every mutating handler that touches both the database and the object store
//! goes through this module instead of hand-rolling rollback logic. The
//! contract: a failure at any step leaves the system either fully rolled back
//! or forward-completed — never with a record pointing at an asset that does
//! not exist.
//!
//! Asset lifecycle: absent → uploading → confirmed → (referenced |
//! orphaned-pending-cleanup) → deleted. A failed compensating delete leaves a
//! permanently orphaned asset; each one is logged as a leak candidate for
//! out-of-band reconciliation and never surfaced to the caller.

use std::path::PathBuf;

use common::{AssetRef, ObjectStore, StorageError};
use sea_orm::{DbErr, SqlErr};

/// Failure classes a workflow run can end in.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// An object store call failed or timed out. Any sibling uploads confirmed
    /// in the same run have already been rolled back.
    #[error("upload failed: {0}")]
    Upload(#[from] StorageError),
    /// The record write hit a unique constraint. Uploaded assets have been
    /// rolled back; the caller should answer 409.
    #[error("{0}")]
    Conflict(String),
    /// The record write failed for any other reason. Uploaded assets have been
    /// rolled back; the caller should answer 500.
    #[error("persist failed: {0}")]
    Persist(DbErr),
}

/// Split duplicate-key conflicts from other database errors, so callers can
/// answer 409 vs 500.
fn classify_db_err(err: DbErr) -> WorkflowError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            WorkflowError::Conflict(format!("Duplicate value: {detail}"))
        }
        _ => WorkflowError::Persist(err),
    }
}

/// Best-effort deletion of assets the caller no longer wants.
///
/// A failed destroy is logged as a leak candidate and otherwise swallowed:
/// by the time this runs the decision about the record has already been made,
/// and the record must never end up referencing a missing asset because a
/// cleanup call failed.
pub async fn release_assets(store: &dyn ObjectStore, assets: &[AssetRef]) {
    for asset in assets {
        if let Err(e) = store.destroy(&asset.public_id).await {
            tracing::warn!(
                public_id = %asset.public_id,
                error = %e,
                "leak candidate: compensating delete failed"
            );
        }
    }
}

/// Upload every file into `folder`, all-or-nothing.
///
/// Uploads fan out concurrently and are joined before returning. If any of
/// them failed, every sibling that did succeed is destroyed again and the
/// first failure is returned — a partial multi-file upload never leaves some
/// files confirmed while others never landed.
pub async fn upload_all(
    store: &dyn ObjectStore,
    files: &[PathBuf],
    folder: &str,
) -> Result<Vec<AssetRef>, WorkflowError> {
    let results =
        futures::future::join_all(files.iter().map(|file| store.upload(file, folder))).await;

    let mut confirmed = Vec::with_capacity(results.len());
    let mut first_failure = None;
    for result in results {
        match result {
            Ok(asset) => confirmed.push(asset),
            Err(e) if first_failure.is_none() => first_failure = Some(e),
            Err(_) => {}
        }
    }

    if let Some(err) = first_failure {
        release_assets(store, &confirmed).await;
        return Err(WorkflowError::Upload(err));
    }

    Ok(confirmed)
}

/// Create-with-asset: upload all files, then persist the record.
///
/// On persist failure every uploaded asset is destroyed before the error is
/// returned, so a failed create leaves zero assets attributable to it. On
/// success the created record is returned untouched.
pub async fn create_with_assets<T, F, Fut>(
    store: &dyn ObjectStore,
    files: &[PathBuf],
    folder: &str,
    persist: F,
) -> Result<T, WorkflowError>
where
    F: FnOnce(Vec<AssetRef>) -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let assets = upload_all(store, files, folder).await?;

    match persist(assets.clone()).await {
        Ok(record) => Ok(record),
        Err(e) => {
            release_assets(store, &assets).await;
            Err(classify_db_err(e))
        }
    }
}

/// Update-with-asset: optionally upload replacement files, persist the
/// mutation, then retire the superseded assets.
///
/// New files are uploaded first (same all-or-nothing rule as create); the old
/// assets are not touched until the save has committed. On save failure the
/// replacements are destroyed — rollback the new, never the old — and the
/// record is left exactly as it was. Once the save commits, failure to destroy
/// an old asset is non-fatal: it is logged as a leak candidate and the update
/// still reports success.
pub async fn update_with_assets<T, F, Fut>(
    store: &dyn ObjectStore,
    new_files: &[PathBuf],
    folder: &str,
    old_assets: &[AssetRef],
    persist: F,
) -> Result<T, WorkflowError>
where
    F: FnOnce(Option<Vec<AssetRef>>) -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    if new_files.is_empty() {
        return persist(None).await.map_err(classify_db_err);
    }

    let replacements = upload_all(store, new_files, folder).await?;

    match persist(Some(replacements.clone())).await {
        Ok(record) => {
            release_assets(store, old_assets).await;
            Ok(record)
        }
        Err(e) => {
            release_assets(store, &replacements).await;
            Err(classify_db_err(e))
        }
    }
}

/// Delete-with-asset: database record first, then the assets.
///
/// If the record delete fails, storage is never touched. If an asset destroy
/// fails afterwards, the failure mode is an orphaned asset with no dangling
/// record — the resource is gone as far as callers are concerned, so the leak
/// is logged and the operation still succeeds.
pub async fn delete_with_assets<T, F, Fut>(
    store: &dyn ObjectStore,
    assets: &[AssetRef],
    delete_record: F,
) -> Result<T, WorkflowError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let out = delete_record().await.map_err(classify_db_err)?;
    release_assets(store, assets).await;
    Ok(out)
}
