//! Build and query configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WikindexError};

/// Default number of documents accumulated in memory before a segment flush.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Default number of terms per index shard (and titles per title shard).
pub const DEFAULT_SHARD_SIZE: usize = 10_000;

/// Configuration of an index build.
///
/// `batch_size` trades build-time memory for merge-tree depth: larger batches
/// mean fewer segments and fewer merge rounds. `shard_size` trades the memory
/// held by the secondary indices for per-term scan cost at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Documents per in-memory batch before flushing segments.
    pub batch_size: usize,

    /// Terms per index shard and titles per title shard.
    pub shard_size: usize,

    /// Run per-field flush, merge and sharding on the rayon thread pool.
    pub parallel: bool,
}

impl IndexConfig {
    pub fn new() -> Self {
        IndexConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            shard_size: DEFAULT_SHARD_SIZE,
            parallel: true,
        }
    }

    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    /// Parse a configuration from TOML text.
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: IndexConfig = toml::from_str(text)
            .map_err(|e| WikindexError::invalid_config(format!("failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the sizes are usable.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(WikindexError::invalid_config("batch_size must be at least 1"));
        }
        if self.shard_size == 0 {
            return Err(WikindexError::invalid_config("shard_size must be at least 1"));
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`IndexConfig`].
#[derive(Debug, Default)]
pub struct IndexConfigBuilder {
    batch_size: Option<usize>,
    shard_size: Option<usize>,
    parallel: Option<bool>,
}

impl IndexConfigBuilder {
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn shard_size(mut self, shard_size: usize) -> Self {
        self.shard_size = Some(shard_size);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    pub fn build(self) -> IndexConfig {
        let defaults = IndexConfig::new();
        IndexConfig {
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            shard_size: self.shard_size.unwrap_or(defaults.shard_size),
            parallel: self.parallel.unwrap_or(defaults.parallel),
        }
    }
}
