use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

/// A multipart file spooled to a local temp path, ready for the object store.
#[derive(Debug)]
pub struct SpooledFile {
    pub path: PathBuf,
}

/// Text fields and spooled files extracted from one multipart request.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<SpooledFile>,
}

impl MultipartForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Paths of all spooled files, in upload order.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Drain a multipart request, spooling every part named `file_field` to a
/// temp file and collecting the rest as text fields.
///
/// Upload parts with any other name are ignored. On error the already-spooled
/// files are removed before returning.
pub async fn collect_multipart(
    mut multipart: Multipart,
    file_field: &str,
    max_size: usize,
) -> Result<MultipartForm, AppError> {
    let mut form = MultipartForm::default();

    let result = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some(name) if name == file_field => {
                    form.files.push(spool_field(field, max_size).await?);
                }
                Some(name) => {
                    let name = name.to_string();
                    let text = field.text().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read field '{name}': {e}"))
                    })?;
                    form.fields.insert(name, text);
                }
                None => {} // Ignore unnamed fields.
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = result {
        discard(&form.files).await;
        return Err(e);
    }

    Ok(form)
}

/// Stream a multipart field to a temp file.
///
/// The temp name keeps the upload's extension so the object store key does
/// too.
async fn spool_field(mut field: Field<'_>, max_size: usize) -> Result<SpooledFile, AppError> {
    let extension = field
        .file_name()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_string());

    let temp_name = match extension {
        Some(ext) => format!("apex-upload-{}.{ext}", Uuid::new_v4()),
        None => format!("apex-upload-{}", Uuid::new_v4()),
    };
    let temp_path = std::env::temp_dir().join(temp_name);

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: usize = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len();
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

        Ok(())
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(SpooledFile { path: temp_path })
}

/// Best-effort removal of spooled temp files.
pub async fn discard(files: &[SpooledFile]) {
    for file in files {
        let _ = tokio::fs::remove_file(&file.path).await;
    }
}
