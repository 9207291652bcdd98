//! Query side: parsing, lookup, scoring and batch I/O.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use wikindex::query::QueryEngine;
//! use wikindex::storage::file::{FileStorage, FileStorageConfig};
//!
//! let storage = Arc::new(FileStorage::open(FileStorageConfig::new("./wikindex_data"))?);
//! let engine = QueryEngine::open(storage)?;
//! for hit in engine.search("t:rust b:compiler", 10)?.hits {
//!     println!("{} {}", hit.doc_id, hit.title);
//! }
//! # Ok::<(), wikindex::WikindexError>(())
//! ```

pub mod batch;
pub mod engine;
pub mod parser;
pub mod scoring;

pub use batch::{BatchSummary, QueryError, QueryRequest, run_batch};
pub use engine::{QueryEngine, SearchHit, SearchResults};
pub use parser::{ParsedQuery, QueryParser};
pub use scoring::RelevanceVector;
