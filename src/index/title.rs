//! Sharded document id -> title store.
//!
//! Titles are written in document id order, one per line, and split with the
//! same granularity as the index shards. Document `id` lives on line
//! `((id - 1) % shard_size) + 1` of `titles/<ceil(id / shard_size)>.txt`, so
//! no lookup table is needed.

use std::io::Write;
use std::sync::Arc;

use log::info;

use crate::error::{Result, WikindexError};
use crate::index::posting::DocId;
use crate::index::shard::split_into_shards;
use crate::storage::{Storage, StorageOutput, open_lines, read_line_trimmed};

/// Staging file receiving titles during the build.
pub const TITLE_STAGING_FILE: &str = "titles/staging.txt";

/// Storage name of title shard `shard` (1-based).
pub fn title_shard_file_name(shard: usize) -> String {
    format!("titles/{shard}.txt")
}

/// Shard number and 1-based line of `doc_id`.
pub fn title_location(doc_id: DocId, shard_size: usize) -> (usize, usize) {
    let offset = doc_id as usize - 1;
    (offset / shard_size + 1, offset % shard_size + 1)
}

/// Appends titles in document id order during the build.
#[derive(Debug)]
pub struct TitleStoreWriter {
    storage: Arc<dyn Storage>,
    output: Box<dyn StorageOutput>,
    count: u64,
}

impl TitleStoreWriter {
    pub fn new(storage: Arc<dyn Storage>) -> Result<Self> {
        let output = storage.create_output(TITLE_STAGING_FILE)?;
        Ok(TitleStoreWriter {
            storage,
            output,
            count: 0,
        })
    }

    /// Append the title of the next document.
    ///
    /// `doc_id` must be the successor of the previous one.
    pub fn append(&mut self, doc_id: DocId, title: &str) -> Result<()> {
        if u64::from(doc_id) != self.count + 1 {
            return Err(WikindexError::invalid_argument(format!(
                "title for document {doc_id} appended after {} titles",
                self.count
            )));
        }
        if title.contains(['\n', '\r']) {
            let flattened = title.replace(['\n', '\r'], " ");
            self.output.write_all(flattened.as_bytes())?;
        } else {
            self.output.write_all(title.as_bytes())?;
        }
        self.output.write_all(b"\n")?;
        self.count += 1;
        Ok(())
    }

    /// Split the staged titles into title shards. Returns the shard count.
    pub fn finish(mut self, shard_size: usize) -> Result<usize> {
        self.output.close()?;
        let storage = self.storage.as_ref();
        let summary =
            split_into_shards(storage, TITLE_STAGING_FILE, shard_size, title_shard_file_name)?;
        storage.delete_file(TITLE_STAGING_FILE)?;
        info!(
            "titles: {} shards for {} documents",
            summary.shards, summary.lines
        );
        Ok(summary.shards)
    }
}

/// Read side of the title store.
#[derive(Debug, Clone)]
pub struct TitleStore {
    storage: Arc<dyn Storage>,
    shard_size: usize,
    total_docs: u64,
}

impl TitleStore {
    pub fn new(storage: Arc<dyn Storage>, shard_size: usize, total_docs: u64) -> Self {
        TitleStore {
            storage,
            shard_size,
            total_docs,
        }
    }

    /// Title of `doc_id`, or `None` for ids outside `1..=total_docs`.
    pub fn lookup(&self, doc_id: DocId) -> Result<Option<String>> {
        if doc_id == 0 || u64::from(doc_id) > self.total_docs {
            return Ok(None);
        }
        let (shard, line_no) = title_location(doc_id, self.shard_size);
        let mut reader = open_lines(self.storage.as_ref(), &title_shard_file_name(shard))?;
        let mut line = String::new();
        for _ in 0..line_no {
            if !read_line_trimmed(&mut reader, &mut line)? {
                return Err(WikindexError::index(format!(
                    "title shard {shard} ends before line {line_no}"
                )));
            }
        }
        Ok(Some(line))
    }
}
