//! On-disk inverted index: construction and layout.
//!
//! # Layout
//!
//! ```text
//! <field>/<n>.txt      shard n of a field: `term d1:f1 d2:f2 ...` per line
//! sec_ind/<field>      first term of every shard of a field
//! titles/<n>.txt       title shard n: one title per line, in id order
//! meta.json            document count, sizes and statistics
//! ```
//!
//! During a build the transient files `<field>/segment_<round>_<n>.txt` and
//! `titles/staging.txt` also exist; none of them survive a successful build.

pub mod builder;
pub mod field;
pub mod merge;
pub mod meta;
pub mod posting;
pub mod segment;
pub mod shard;
pub mod title;

pub use builder::IndexBuilder;
pub use field::{Field, PerField};
pub use meta::{FieldStats, IndexMeta};
pub use posting::{DocId, Posting};
pub use segment::{Segment, SegmentBuilder};
pub use shard::{IndexSharder, SecondaryIndex};
pub use title::{TitleStore, TitleStoreWriter};
