use std::fmt;

/// Errors that can occur during object storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested asset was not found.
    NotFound(String),
    /// The remote call did not complete within the configured deadline.
    Timeout { seconds: u64 },
    /// An I/O error occurred while reading the local file.
    Io(std::io::Error),
    /// The storage backend rejected or failed the call.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "asset not found: {id}"),
            Self::Timeout { seconds } => {
                write!(f, "object store call timed out after {seconds}s")
            }
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
