pub mod index;
pub mod query;
pub mod search;
pub mod stats;
