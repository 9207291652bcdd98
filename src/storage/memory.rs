//! In-memory storage.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, WikindexError};
use crate::storage::{Storage, StorageInput, StorageOutput};

/// Configuration for [`MemoryStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageConfig {
    /// Initial capacity reserved for each output buffer.
    pub initial_buffer_capacity: usize,
}

type FileMap = Arc<RwLock<BTreeMap<String, Arc<Vec<u8>>>>>;

/// Storage keeping all files in process memory.
///
/// Readers get a snapshot of the file taken when they were opened.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: FileMap,
    config: MemoryStorageConfig,
}

impl MemoryStorage {
    pub fn new(config: MemoryStorageConfig) -> Self {
        MemoryStorage {
            files: Arc::new(RwLock::new(BTreeMap::new())),
            config,
        }
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let files = self.files.read();
        let data = files
            .get(name)
            .cloned()
            .ok_or_else(|| WikindexError::not_found(format!("file {name} does not exist")))?;
        Ok(Box::new(Cursor::new(SharedBytes(data))))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        if name.is_empty() {
            return Err(WikindexError::invalid_argument("empty storage file name"));
        }
        // Creating truncates, as on a filesystem.
        self.files
            .write()
            .insert(name.to_string(), Arc::new(Vec::new()));
        Ok(Box::new(MemoryOutput {
            name: name.to_string(),
            buffer: Vec::with_capacity(self.config.initial_buffer_capacity),
            files: Arc::clone(&self.files),
            closed: false,
        }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| WikindexError::not_found(format!("file {name} does not exist")))
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.read().keys().cloned().collect())
    }
}

#[derive(Debug)]
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

#[derive(Debug)]
struct MemoryOutput {
    name: String,
    buffer: Vec<u8>,
    files: FileMap,
    closed: bool,
}

impl MemoryOutput {
    fn publish(&mut self) {
        let data = Arc::new(std::mem::take(&mut self.buffer));
        self.files.write().insert(self.name.clone(), data);
    }
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(std::io::Error::other("write to closed output"));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.publish();
            self.closed = true;
        }
        Ok(())
    }
}

impl Drop for MemoryOutput {
    fn drop(&mut self) {
        if !self.closed {
            self.publish();
        }
    }
}
