//! Filesystem-backed storage.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, WikindexError};
use crate::storage::{Storage, StorageInput, StorageOutput};

/// Configuration for [`FileStorage`].
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    /// Root directory of the index.
    pub path: PathBuf,
    /// Capacity of the write buffer for each output.
    pub buffer_size: usize,
}

impl FileStorageConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileStorageConfig {
            path: path.as_ref().to_path_buf(),
            buffer_size: 64 * 1024,
        }
    }
}

/// Storage rooted at a directory on the local filesystem.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
    buffer_size: usize,
}

impl FileStorage {
    /// Create the root directory (if missing) and return a storage over it.
    pub fn create(config: FileStorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        Ok(FileStorage {
            root: config.path,
            buffer_size: config.buffer_size,
        })
    }

    /// Open an existing root directory.
    pub fn open(config: FileStorageConfig) -> Result<Self> {
        if !config.path.is_dir() {
            return Err(WikindexError::not_found(format!(
                "index directory {} does not exist",
                config.path.display()
            )));
        }
        Ok(FileStorage {
            root: config.path,
            buffer_size: config.buffer_size,
        })
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.starts_with('/') || name.split('/').any(|part| part == "..") {
            return Err(WikindexError::invalid_argument(format!(
                "invalid storage file name: {name:?}"
            )));
        }
        Ok(self.root.join(name))
    }

    fn collect_files(&self, dir: &Path, prefix: &str, files: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            if entry.file_type()?.is_dir() {
                self.collect_files(&entry.path(), &relative, files)?;
            } else {
                files.push(relative);
            }
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let path = self.resolve(name)?;
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WikindexError::not_found(format!("file {name} does not exist"))
            } else {
                WikindexError::Io(e)
            }
        })?;
        Ok(Box::new(file))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        Ok(Box::new(FileOutput {
            writer: BufWriter::with_capacity(self.buffer_size, file),
        }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.resolve(name).map(|path| path.is_file()).unwrap_or(false)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        fs::remove_file(self.resolve(name)?)?;
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        self.collect_files(&self.root, "", &mut files)?;
        files.sort();
        Ok(files)
    }
}

#[derive(Debug)]
struct FileOutput {
    writer: BufWriter<File>,
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_nested_write_read_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::create(FileStorageConfig::new(temp_dir.path())).unwrap();

        let mut output = storage.create_output("body/1.txt").unwrap();
        output.write_all(b"rust 1:2\n").unwrap();
        output.close().unwrap();

        let mut content = String::new();
        storage
            .open_input("body/1.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "rust 1:2\n");

        storage.create_output("sec_ind/body").unwrap().close().unwrap();
        assert_eq!(storage.list_files().unwrap(), vec!["body/1.txt", "sec_ind/body"]);
        storage.delete_file("body/1.txt").unwrap();
        assert!(!storage.file_exists("body/1.txt"));
        assert_eq!(storage.list_files().unwrap(), vec!["sec_ind/body"]);
    }

    #[test]
    fn test_rejects_escaping_names() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::create(FileStorageConfig::new(temp_dir.path())).unwrap();
        assert!(storage.create_output("../outside.txt").is_err());
        assert!(!storage.file_exists("/etc/passwd"));
    }

    #[test]
    fn test_open_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let err = FileStorage::open(FileStorageConfig::new(missing)).unwrap_err();
        assert!(matches!(err, WikindexError::NotFound(_)));
    }
}
