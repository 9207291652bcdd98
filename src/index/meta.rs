//! Index-wide metadata persisted as `meta.json`.

use std::io::Read;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WikindexError};
use crate::index::field::PerField;
use crate::storage::Storage;

/// Storage name of the metadata record.
pub const META_FILE: &str = "meta.json";

/// Current layout version.
pub const FORMAT_VERSION: u32 = 1;

/// Statistics of one field's index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStats {
    pub unique_terms: u64,
    pub shards: usize,
    pub postings: u64,
}

/// Metadata written once at the end of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    /// Number of indexed documents; ids run from 1 to `total_docs`.
    pub total_docs: u64,
    pub batch_size: usize,
    pub shard_size: usize,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: u64,
    /// Raw tokens seen across all fields before filtering.
    pub raw_tokens: u64,
    pub title_shards: usize,
    pub fields: PerField<FieldStats>,
}

impl IndexMeta {
    pub fn new(total_docs: u64, batch_size: usize, shard_size: usize) -> Self {
        IndexMeta {
            version: FORMAT_VERSION,
            total_docs,
            batch_size,
            shard_size,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            raw_tokens: 0,
            title_shards: 0,
            fields: PerField::default(),
        }
    }

    pub fn exists(storage: &dyn Storage) -> bool {
        storage.file_exists(META_FILE)
    }

    pub fn load(storage: &dyn Storage) -> Result<Self> {
        if !storage.file_exists(META_FILE) {
            return Err(WikindexError::not_found(format!(
                "{META_FILE}: no index has been built here"
            )));
        }
        let mut json = String::new();
        storage.open_input(META_FILE)?.read_to_string(&mut json)?;
        let meta: IndexMeta = serde_json::from_str(&json)?;
        if meta.version != FORMAT_VERSION {
            return Err(WikindexError::index(format!(
                "unsupported index version {} (expected {FORMAT_VERSION})",
                meta.version
            )));
        }
        if meta.shard_size == 0 {
            return Err(WikindexError::index("shard size recorded as 0"));
        }
        Ok(meta)
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let mut output = storage.create_output(META_FILE)?;
        serde_json::to_writer_pretty(&mut output, self)?;
        output.close()
    }
}
