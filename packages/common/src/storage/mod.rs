mod error;
mod traits;

pub mod memory;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use memory::InMemoryObjectStore;
#[cfg(feature = "object-storage")]
pub use s3::S3ObjectStore;
pub use traits::{AssetRef, ObjectStore};
