//! In-memory accumulation of postings and flushing to segment files.
//!
//! A [`SegmentBuilder`] collects `term -> postings` maps for every field while
//! documents are ingested. When a batch is complete the maps are written as
//! one term-sorted segment per field and the memory is released.

use std::sync::Arc;

use ahash::AHashMap;
use log::debug;
use rayon::prelude::*;

use crate::analysis::FieldTokens;
use crate::error::{Result, WikindexError};
use crate::index::field::{Field, PerField};
use crate::index::posting::{self, DocId, Posting};
use crate::storage::Storage;

/// Owned handle to a term-sorted segment file of one field.
///
/// Handles are not `Clone`: whoever holds the handle owns the
/// file, and consuming the handle (see [`Segment::delete`]) is the way the
/// file is destroyed.
#[derive(Debug, PartialEq, Eq)]
pub struct Segment {
    field: Field,
    name: String,
    terms: u64,
    postings: u64,
}

impl Segment {
    pub(crate) fn new(field: Field, name: String, terms: u64, postings: u64) -> Self {
        Segment {
            field,
            name,
            terms,
            postings,
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Storage file name of the segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of term lines in the segment.
    pub fn terms(&self) -> u64 {
        self.terms
    }

    /// Number of postings across all lines.
    pub fn postings(&self) -> u64 {
        self.postings
    }

    /// Delete the segment file, consuming the handle.
    pub fn delete(self, storage: &dyn Storage) -> Result<()> {
        storage.delete_file(&self.name)
    }
}

/// Storage name of segment `seq` produced in merge round `round`.
///
/// Round 0 holds the segments flushed by the builder.
pub fn segment_file_name(field: Field, round: u32, seq: u32) -> String {
    format!("{}/segment_{:03}_{:06}.txt", field.name(), round, seq)
}

#[derive(Debug, Default)]
struct FieldAccumulator {
    terms: AHashMap<String, Vec<Posting>>,
}

impl FieldAccumulator {
    fn add(&mut self, doc_id: DocId, token: &str) {
        let postings = match self.terms.get_mut(token) {
            Some(postings) => postings,
            None => self.terms.entry(token.to_string()).or_default(),
        };
        match postings.last_mut() {
            Some(last) if last.doc_id == doc_id => last.frequency += 1,
            _ => postings.push(Posting::new(doc_id, 1)),
        }
    }
}

/// Accumulates postings for a bounded batch of documents.
#[derive(Debug)]
pub struct SegmentBuilder {
    storage: Arc<dyn Storage>,
    parallel: bool,
    fields: PerField<FieldAccumulator>,
    segments: PerField<Vec<Segment>>,
    last_doc_id: DocId,
    pending_docs: usize,
    batches_flushed: u32,
}

impl SegmentBuilder {
    pub fn new(storage: Arc<dyn Storage>, parallel: bool) -> Self {
        SegmentBuilder {
            storage,
            parallel,
            fields: PerField::default(),
            segments: PerField::default(),
            last_doc_id: 0,
            pending_docs: 0,
            batches_flushed: 0,
        }
    }

    /// Record one occurrence per token per field for `doc_id`.
    ///
    /// Document ids must be strictly increasing across calls.
    pub fn ingest(&mut self, doc_id: DocId, tokens: &FieldTokens) -> Result<()> {
        if doc_id <= self.last_doc_id {
            return Err(WikindexError::invalid_argument(format!(
                "document {doc_id} ingested after document {}",
                self.last_doc_id
            )));
        }
        for (field, field_tokens) in tokens.iter() {
            let accumulator = self.fields.get_mut(field);
            for token in field_tokens {
                accumulator.add(doc_id, token);
            }
        }
        self.last_doc_id = doc_id;
        self.pending_docs += 1;
        Ok(())
    }

    /// Number of documents ingested since the last flush.
    pub fn pending_docs(&self) -> usize {
        self.pending_docs
    }

    /// Number of batches written so far.
    pub fn batches_flushed(&self) -> u32 {
        self.batches_flushed
    }

    /// Write one segment per field for the current batch and reset memory.
    ///
    /// Every field gets a segment, possibly empty, so all fields end up with
    /// the same number of segments. Flushing an empty batch is a no-op.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending_docs == 0 {
            return Ok(());
        }
        let batch = self.batches_flushed + 1;
        let storage = &self.storage;

        let work: Vec<(Field, AHashMap<String, Vec<Posting>>)> = self
            .fields
            .iter_mut()
            .map(|(field, acc)| (field, std::mem::take(&mut acc.terms)))
            .collect();

        let written: Vec<Segment> = if self.parallel {
            work.into_par_iter()
                .map(|(field, terms)| write_segment(storage.as_ref(), field, batch, terms))
                .collect::<Result<_>>()?
        } else {
            work.into_iter()
                .map(|(field, terms)| write_segment(storage.as_ref(), field, batch, terms))
                .collect::<Result<_>>()?
        };

        for segment in written {
            self.segments.get_mut(segment.field()).push(segment);
        }
        self.batches_flushed = batch;
        self.pending_docs = 0;
        Ok(())
    }

    /// Flush any pending batch and hand over the segments, in creation order.
    pub fn finish(mut self) -> Result<PerField<Vec<Segment>>> {
        self.flush()?;
        Ok(self.segments)
    }
}

fn write_segment(
    storage: &dyn Storage,
    field: Field,
    batch: u32,
    terms: AHashMap<String, Vec<Posting>>,
) -> Result<Segment> {
    let mut entries: Vec<(String, Vec<Posting>)> = terms.into_iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let name = segment_file_name(field, 0, batch);
    let mut output = storage.create_output(&name)?;
    let mut scratch = String::new();
    let mut total_postings = 0u64;
    for (term, postings) in &entries {
        posting::write_line(&mut output, term, postings, &mut scratch)?;
        total_postings += postings.len() as u64;
    }
    output.close()?;

    debug!(
        "flushed segment {name} with {} terms for field {field}",
        entries.len()
    );
    Ok(Segment::new(
        field,
        name,
        entries.len() as u64,
        total_postings,
    ))
}
