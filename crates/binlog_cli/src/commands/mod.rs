//! CLI command implementations.

pub mod inspect;
pub mod path;
pub mod verify;

use binlog_storage::{LocalObjectStore, ObjectStore};
use std::path::Path;

/// Returns the key root of the store backed by `dir`.
pub async fn store_root(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let store = LocalObjectStore::open(dir).await?;
    Ok(store.root_path().to_string())
}
