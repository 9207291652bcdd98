//! # wikindex
//!
//! A disk-resident, sharded, multi-field inverted index for encyclopedia
//! dumps.
//!
//! ## Features
//!
//! - Streaming construction with bounded memory: documents are batched into
//!   term-sorted segments and combined by an external pairwise merge
//! - Six independent fields: title, body, ref, infobox, link, category
//! - Sharded on-disk layout with an in-memory secondary index per field, so
//!   one term lookup reads one shard
//! - Multi-field relevance vectors with an all-fields fallback
//! - Pluggable storage backends (filesystem, memory)
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use wikindex::{IndexBuilder, IndexConfig, QueryEngine, RawDocument};
//! use wikindex::storage::memory::{MemoryStorage, MemoryStorageConfig};
//!
//! let storage = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
//! let builder = IndexBuilder::with_wiki_extractor(storage.clone(), IndexConfig::default())?;
//! builder.build_from(vec![Ok(RawDocument::new("Rust", "A systems language"))])?;
//!
//! let engine = QueryEngine::open(storage)?;
//! let results = engine.search("rust", 10)?;
//! assert_eq!(results.hits[0].title, "Rust");
//! # Ok::<(), wikindex::WikindexError>(())
//! ```

pub mod analysis;
pub mod config;
mod error;
pub mod index;
pub mod query;
pub mod source;
pub mod storage;

// Re-exports for the public API
pub use analysis::{Analyzer, FieldExtractor, WikiFieldExtractor};
pub use config::IndexConfig;
pub use error::{Result, WikindexError};
pub use index::{DocId, Field, IndexBuilder, IndexMeta};
pub use query::{QueryEngine, SearchHit, SearchResults};
pub use source::{RawDocument, SourceFormat};
pub use storage::{Storage, StorageConfig, StorageFactory};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
