//! Query execution over a built index.

use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::error::{Result, WikindexError};
use crate::index::field::{Field, PerField};
use crate::index::meta::IndexMeta;
use crate::index::posting::{DocId, Posting};
use crate::index::shard::{SecondaryIndex, scan_shard};
use crate::index::title::TitleStore;
use crate::query::parser::{ParsedQuery, QueryParser};
use crate::query::scoring::{RelevanceVector, Scorer};
use crate::storage::Storage;

/// One ranked result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub title: String,
    pub score: RelevanceVector,
}

/// Ranked results of one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    /// At most `num_results` hits, best first.
    pub hits: Vec<SearchHit>,
    /// Number of documents matching the query.
    pub total: usize,
    /// Whether the all-fields retry produced these results.
    pub widened: bool,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Read-only query engine.
///
/// Loads the secondary indices and the document count once; every query
/// then reads at most one shard per (field, term). The engine holds no
/// mutable state and can be shared between threads.
#[derive(Debug)]
pub struct QueryEngine {
    storage: Arc<dyn Storage>,
    meta: IndexMeta,
    secondary: PerField<SecondaryIndex>,
    titles: TitleStore,
    parser: QueryParser,
}

impl QueryEngine {
    pub fn open(storage: Arc<dyn Storage>) -> Result<Self> {
        Self::with_parser(storage, QueryParser::new()?)
    }

    pub fn with_parser(storage: Arc<dyn Storage>, parser: QueryParser) -> Result<Self> {
        let meta = IndexMeta::load(storage.as_ref())?;
        let mut secondary = PerField::from_fn(SecondaryIndex::empty);
        for field in Field::ALL {
            let index = SecondaryIndex::load(storage.as_ref(), field)?;
            if index.len() != meta.fields.get(field).shards {
                return Err(WikindexError::index(format!(
                    "secondary index of {field} lists {} shards, metadata says {}",
                    index.len(),
                    meta.fields.get(field).shards
                )));
            }
            *secondary.get_mut(field) = index;
        }
        let titles = TitleStore::new(storage.clone(), meta.shard_size, meta.total_docs);
        debug!(
            "opened index with {} documents, shards per field: {:?}",
            meta.total_docs,
            secondary.iter().map(|(_, s)| s.len()).collect::<Vec<_>>()
        );
        Ok(QueryEngine {
            storage,
            meta,
            secondary,
            titles,
            parser,
        })
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn total_docs(&self) -> u64 {
        self.meta.total_docs
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    /// Posting list of `term` in `field`; empty if the term is absent.
    pub fn postings(&self, field: Field, term: &str) -> Result<Vec<Posting>> {
        match self.secondary.get(field).shard_for(term) {
            Some(shard) => scan_shard(self.storage.as_ref(), field, shard, term),
            None => Ok(Vec::new()),
        }
    }

    /// Title of `doc_id`.
    pub fn title(&self, doc_id: DocId) -> Result<Option<String>> {
        self.titles.lookup(doc_id)
    }

    /// Parse and run `raw`, returning the best `num_results` documents.
    ///
    /// A query with no searchable terms (blank, only markers, punctuation or
    /// stop words) is an invalid argument.
    pub fn search(&self, raw: &str, num_results: usize) -> Result<SearchResults> {
        let query = self.parser.parse(raw);
        if query.is_empty() {
            return Err(WikindexError::invalid_argument(format!(
                "query {raw:?} has no searchable terms"
            )));
        }
        self.search_parsed(&query, num_results)
    }

    /// Run an already parsed query.
    ///
    /// When nothing matches, every term of the query is retried in all six
    /// fields before giving up.
    pub fn search_parsed(&self, query: &ParsedQuery, num_results: usize) -> Result<SearchResults> {
        if num_results == 0 {
            return Err(WikindexError::invalid_argument(
                "number of results must be at least 1",
            ));
        }

        let mut widened = false;
        let mut scorer = self.score(query)?;
        if scorer.matched() == 0 && !query.is_empty() {
            debug!("no match in the requested fields, retrying in all fields");
            scorer = self.score(&query.widened())?;
            widened = true;
        }

        let (ranked, total) = scorer.top(num_results);
        let hits = ranked
            .into_iter()
            .map(|scored| {
                let title = self.titles.lookup(scored.doc_id)?.ok_or_else(|| {
                    WikindexError::index(format!("no title for document {}", scored.doc_id))
                })?;
                Ok(SearchHit {
                    doc_id: scored.doc_id,
                    title,
                    score: scored.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SearchResults {
            hits,
            total,
            widened,
        })
    }

    fn score(&self, query: &ParsedQuery) -> Result<Scorer> {
        let mut scorer = Scorer::new(self.meta.total_docs);
        for (field, terms) in query.fields() {
            for term in terms {
                let postings = self.postings(field, term)?;
                scorer.add_postings(field, &postings);
            }
        }
        Ok(scorer)
    }
}
