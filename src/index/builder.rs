//! Index construction orchestrator.
//!
//! A build runs in two phases:
//!
//! 1. Documents stream through the [`FieldExtractor`] into the
//!    [`SegmentBuilder`]; a segment per field is flushed every `batch_size`
//!    documents and titles are staged in document id order.
//! 2. When the stream ends, each field's segments are merged and the merged
//!    file is sharded (fields in parallel), titles are sharded, and the
//!    [`IndexMeta`] record is written last.
//!
//! A directory that already contains `meta.json` is never built into.

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;

use crate::analysis::{Extracted, FieldExtractor, WikiFieldExtractor};
use crate::config::IndexConfig;
use crate::error::{Result, WikindexError};
use crate::index::field::Field;
use crate::index::merge::SegmentMerger;
use crate::index::meta::{FieldStats, IndexMeta, META_FILE};
use crate::index::posting::DocId;
use crate::index::segment::{Segment, SegmentBuilder};
use crate::index::shard::{IndexSharder, ShardedField};
use crate::index::title::TitleStoreWriter;
use crate::source::RawDocument;
use crate::storage::Storage;

/// Builds a complete index into an empty storage.
#[derive(Debug)]
pub struct IndexBuilder {
    storage: Arc<dyn Storage>,
    config: IndexConfig,
    extractor: Arc<dyn FieldExtractor>,
    segments: SegmentBuilder,
    titles: TitleStoreWriter,
    last_doc_id: DocId,
    raw_tokens: u64,
    started: Instant,
}

impl IndexBuilder {
    /// Start a build using the given extractor.
    ///
    /// Fails if the configuration is invalid or an index already exists in
    /// `storage`.
    pub fn new(
        storage: Arc<dyn Storage>,
        config: IndexConfig,
        extractor: Arc<dyn FieldExtractor>,
    ) -> Result<Self> {
        config.validate()?;
        if IndexMeta::exists(storage.as_ref()) {
            return Err(WikindexError::invalid_argument(format!(
                "an index already exists here ({META_FILE} found)"
            )));
        }
        let segments = SegmentBuilder::new(storage.clone(), config.parallel);
        let titles = TitleStoreWriter::new(storage.clone())?;
        info!(
            "starting build: batch size {}, shard size {}",
            config.batch_size, config.shard_size
        );
        Ok(IndexBuilder {
            storage,
            config,
            extractor,
            segments,
            titles,
            last_doc_id: 0,
            raw_tokens: 0,
            started: Instant::now(),
        })
    }

    /// Start a build with the MediaWiki extractor.
    pub fn with_wiki_extractor(storage: Arc<dyn Storage>, config: IndexConfig) -> Result<Self> {
        Self::new(storage, config, Arc::new(WikiFieldExtractor::new()?))
    }

    /// Number of documents added so far.
    pub fn doc_count(&self) -> u64 {
        u64::from(self.last_doc_id)
    }

    /// Extract and add one document. Returns its id.
    pub fn add_document(&mut self, document: &RawDocument) -> Result<DocId> {
        let extracted = self.extractor.extract(&document.title, &document.text);
        self.add_extracted(&document.title, &extracted)
    }

    /// Add a document whose fields were already extracted.
    pub fn add_extracted(&mut self, title: &str, extracted: &Extracted) -> Result<DocId> {
        let doc_id = self
            .last_doc_id
            .checked_add(1)
            .ok_or_else(|| WikindexError::invalid_argument("document id space exhausted"))?;

        self.segments.ingest(doc_id, &extracted.tokens)?;
        self.titles.append(doc_id, title)?;
        self.last_doc_id = doc_id;
        self.raw_tokens += extracted.raw_tokens;

        if self.segments.pending_docs() >= self.config.batch_size {
            self.segments.flush()?;
            info!(
                "{} documents processed, {} batches flushed",
                doc_id,
                self.segments.batches_flushed()
            );
        }
        Ok(doc_id)
    }

    /// Add every document of `documents`, then finish the build.
    ///
    /// Documents the source reports as invalid are skipped with a warning;
    /// any other error aborts the build.
    pub fn build_from<I>(mut self, documents: I) -> Result<IndexMeta>
    where
        I: IntoIterator<Item = Result<RawDocument>>,
    {
        for document in documents {
            match document {
                Ok(document) => {
                    self.add_document(&document)?;
                }
                Err(WikindexError::InvalidArgument(reason)) => {
                    warn!("skipping document: {reason}");
                }
                Err(e) => return Err(e),
            }
        }
        self.finish()
    }

    /// Flush the last batch, merge and shard every field, shard the titles
    /// and write the metadata record.
    pub fn finish(self) -> Result<IndexMeta> {
        let IndexBuilder {
            storage,
            config,
            segments,
            titles,
            last_doc_id,
            raw_tokens,
            started,
            ..
        } = self;

        let segments = segments.finish()?;
        info!(
            "ingested {} documents in {:.2}s",
            last_doc_id,
            started.elapsed().as_secs_f64()
        );

        let merge_started = Instant::now();
        let merger = SegmentMerger::new(storage.clone(), config.parallel);
        let sharder = IndexSharder::new(storage.clone(), config.shard_size);
        let finalize = |(field, field_segments): (Field, Vec<Segment>)| {
            let merged = merger.merge(field, field_segments)?;
            sharder.shard(field, merged).map(|sharded| (field, sharded))
        };
        let work: Vec<(Field, Vec<Segment>)> = segments.into_iter().collect();
        let sharded: Vec<(Field, ShardedField)> = if config.parallel {
            work.into_par_iter().map(finalize).collect::<Result<_>>()?
        } else {
            work.into_iter().map(finalize).collect::<Result<_>>()?
        };

        let mut meta = IndexMeta::new(u64::from(last_doc_id), config.batch_size, config.shard_size);
        meta.raw_tokens = raw_tokens;
        meta.title_shards = titles.finish(config.shard_size)?;
        for (field, result) in sharded {
            *meta.fields.get_mut(field) = FieldStats {
                unique_terms: result.terms,
                shards: result.secondary.len(),
                postings: result.postings,
            };
        }
        info!(
            "merged, sharded and wrote secondary indices in {:.2}s",
            merge_started.elapsed().as_secs_f64()
        );

        meta.save(storage.as_ref())?;
        info!(
            "index ready: {} documents, {} raw tokens, {:.2}s total",
            meta.total_docs,
            meta.raw_tokens,
            started.elapsed().as_secs_f64()
        );
        Ok(meta)
    }
}
