pub mod storage;

pub use storage::{AssetRef, ObjectStore, StorageError};
