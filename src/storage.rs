//! Storage abstraction for index files.
//!
//! Every artifact of the index (segments, shards, secondary indices, title
//! shards, metadata) is a named file inside a [`Storage`]. Names are relative
//! and use `/` as the separator, e.g. `body/3.txt` or `sec_ind/title`.
//!
//! Two backends are provided:
//!
//! - [`file::FileStorage`]: a directory on the local filesystem
//! - [`memory::MemoryStorage`]: an in-process map, mainly for tests

use std::fmt::Debug;
use std::io::{BufRead, BufReader, Read, Write};
use std::sync::Arc;

use crate::error::Result;

pub mod file;
pub mod memory;

use self::file::{FileStorage, FileStorageConfig};
use self::memory::{MemoryStorage, MemoryStorageConfig};

/// A readable handle to a stored file.
pub trait StorageInput: Read + Send + Debug {}

impl<T: Read + Send + Debug> StorageInput for T {}

/// A writable handle to a stored file.
///
/// Data written to an output becomes visible to readers once the output is
/// closed (or dropped).
pub trait StorageOutput: Write + Send + Debug {
    /// Flush buffered data and finalize the file.
    fn close(&mut self) -> Result<()>;
}

/// A directory-like key/value store of files.
pub trait Storage: Send + Sync + Debug {
    /// Open an existing file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check whether a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all file names, sorted.
    fn list_files(&self) -> Result<Vec<String>>;
}

/// Open a file as a buffered line reader.
pub fn open_lines(storage: &dyn Storage, name: &str) -> Result<BufReader<Box<dyn StorageInput>>> {
    Ok(BufReader::new(storage.open_input(name)?))
}

/// Read the next line into `buf` without its trailing newline.
///
/// Returns `false` at end of file.
pub fn read_line_trimmed<R: BufRead>(reader: &mut R, buf: &mut String) -> Result<bool> {
    buf.clear();
    if reader.read_line(buf)? == 0 {
        return Ok(false);
    }
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(true)
}

/// Configuration selecting a storage backend.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    File(FileStorageConfig),
    Memory(MemoryStorageConfig),
}

/// Factory for creating storage backends from a [`StorageConfig`].
pub struct StorageFactory;

impl StorageFactory {
    /// Create a storage, creating the backing directory if needed.
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::File(config) => Ok(Arc::new(FileStorage::create(config)?)),
            StorageConfig::Memory(config) => Ok(Arc::new(MemoryStorage::new(config))),
        }
    }

    /// Open an existing storage.
    pub fn open(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::File(config) => Ok(Arc::new(FileStorage::open(config)?)),
            StorageConfig::Memory(config) => Ok(Arc::new(MemoryStorage::new(config))),
        }
    }
}
