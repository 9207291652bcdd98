use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use wikindex::storage::file::FileStorageConfig;
use wikindex::{IndexConfig, IndexMeta, QueryEngine, Storage, StorageConfig, StorageFactory};

/// Load build settings, falling back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<IndexConfig> {
    let Some(path) = path else {
        return Ok(IndexConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = IndexConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

/// Create the storage for a new index, refusing to reuse a built one.
pub fn create_storage(data_dir: &Path) -> Result<Arc<dyn Storage>> {
    let storage = StorageFactory::create(StorageConfig::File(FileStorageConfig::new(data_dir)))
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
    if IndexMeta::exists(storage.as_ref()) {
        bail!(
            "Index already exists at {}. Delete the directory first to rebuild.",
            data_dir.display()
        );
    }
    Ok(storage)
}

/// Open the storage of an existing index.
pub fn open_storage(data_dir: &Path) -> Result<Arc<dyn Storage>> {
    let storage = StorageFactory::open(StorageConfig::File(FileStorageConfig::new(data_dir)))
        .with_context(|| format!("No index found at {}", data_dir.display()))?;
    if !IndexMeta::exists(storage.as_ref()) {
        bail!(
            "No index found at {}. Run 'wikindex index <dump>' first.",
            data_dir.display()
        );
    }
    Ok(storage)
}

/// Open the query engine of an existing index.
pub fn open_engine(data_dir: &Path) -> Result<QueryEngine> {
    let storage = open_storage(data_dir)?;
    QueryEngine::open(storage)
        .with_context(|| format!("Failed to open index at {}", data_dir.display()))
}
