//! Relevance vectors and ranking.
//!
//! Every matched document gets an 8-slot vector:
//!
//! | slot | meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | max of slots 1-6                                          |
//! | 1-6  | matched query terms in title, body, ref, infobox, link, category |
//! | 7    | sum of `ln(tf + 1) * ln(N / df)` over matched (field, term) |
//!
//! Documents are ranked by their vectors in descending lexicographic order,
//! ties broken by descending document id.

use std::cmp::Ordering;

use ahash::AHashMap;
use serde::ser::{Serialize, Serializer};

use crate::index::field::Field;
use crate::index::posting::{DocId, Posting};

/// Number of slots of a [`RelevanceVector`].
pub const SLOTS: usize = 8;

/// Per-document relevance, compared lexicographically.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceVector {
    field_matches: [u32; 6],
    weight: f64,
}

impl RelevanceVector {
    /// Slot 0: the best per-field match count.
    pub fn best_field_matches(&self) -> u32 {
        self.field_matches.iter().copied().max().unwrap_or(0)
    }

    /// Matched query terms in `field`.
    pub fn field_matches(&self, field: Field) -> u32 {
        self.field_matches[field.index()]
    }

    /// Slot 7: the accumulated tf-idf weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn slots(&self) -> [f64; SLOTS] {
        let mut slots = [0.0; SLOTS];
        slots[0] = f64::from(self.best_field_matches());
        for (slot, count) in slots[1..7].iter_mut().zip(self.field_matches) {
            *slot = f64::from(count);
        }
        slots[7] = self.weight;
        slots
    }

    fn record(&mut self, field: Field, weight: f64) {
        self.field_matches[field.index()] += 1;
        self.weight += weight;
    }
}

impl Ord for RelevanceVector {
    fn cmp(&self, other: &Self) -> Ordering {
        self.best_field_matches()
            .cmp(&other.best_field_matches())
            .then_with(|| self.field_matches.cmp(&other.field_matches))
            .then_with(|| self.weight.total_cmp(&other.weight))
    }
}

impl PartialOrd for RelevanceVector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RelevanceVector {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RelevanceVector {}

impl Serialize for RelevanceVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.slots().serialize(serializer)
    }
}

/// A document and its relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: RelevanceVector,
}

/// Ranking order: best first.
pub fn rank_order(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score.cmp(&a.score).then_with(|| b.doc_id.cmp(&a.doc_id))
}

/// Accumulates relevance vectors over the posting lists of a query.
#[derive(Debug)]
pub struct Scorer {
    total_docs: f64,
    docs: AHashMap<DocId, RelevanceVector>,
}

impl Scorer {
    /// `total_docs` is the corpus size N.
    pub fn new(total_docs: u64) -> Self {
        Scorer {
            total_docs: total_docs as f64,
            docs: AHashMap::new(),
        }
    }

    /// Add the posting list of one (field, term) pair.
    pub fn add_postings(&mut self, field: Field, postings: &[Posting]) {
        if postings.is_empty() {
            return;
        }
        let idf = (self.total_docs / postings.len() as f64).ln();
        for posting in postings {
            let tf_weight = (f64::from(posting.frequency) + 1.0).ln();
            self.docs
                .entry(posting.doc_id)
                .or_default()
                .record(field, tf_weight * idf);
        }
    }

    /// Number of documents matched so far.
    pub fn matched(&self) -> usize {
        self.docs.len()
    }

    /// The best `limit` documents, best first, and the total match count.
    pub fn top(self, limit: usize) -> (Vec<ScoredDoc>, usize) {
        let total = self.docs.len();
        let mut ranked: Vec<ScoredDoc> = self
            .docs
            .into_iter()
            .map(|(doc_id, score)| ScoredDoc { doc_id, score })
            .collect();
        if limit == 0 {
            return (Vec::new(), total);
        }
        if limit < ranked.len() {
            ranked.select_nth_unstable_by(limit - 1, rank_order);
            ranked.truncate(limit);
        }
        ranked.sort_unstable_by(rank_order);
        (ranked, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(matches: [u32; 6], weight: f64) -> RelevanceVector {
        RelevanceVector {
            field_matches: matches,
            weight,
        }
    }

    #[test]
    fn test_slots() {
        let v = vector([1, 2, 0, 0, 0, 1], 3.5);
        assert_eq!(v.slots(), [2.0, 1.0, 2.0, 0.0, 0.0, 0.0, 1.0, 3.5]);
    }

    #[test]
    fn test_lexicographic_order() {
        let title_and_body = vector([1, 1, 0, 0, 0, 0], 0.1);
        let body_only = vector([0, 1, 0, 0, 0, 0], 9.0);
        assert!(title_and_body > body_only);

        let two_body = vector([0, 2, 0, 0, 0, 0], 0.0);
        assert!(two_body > title_and_body);

        let heavier = vector([1, 1, 0, 0, 0, 0], 0.2);
        assert!(heavier > title_and_body);
    }

    #[test]
    fn test_scorer_weights() {
        let mut scorer = Scorer::new(100);
        scorer.add_postings(Field::Body, &[Posting::new(1, 3), Posting::new(2, 1)]);
        scorer.add_postings(Field::Title, &[Posting::new(2, 1)]);
        let (ranked, total) = scorer.top(10);
        assert_eq!(total, 2);
        assert_eq!(ranked[0].doc_id, 2);

        let expected = 2f64.ln() * 50f64.ln() + 2f64.ln() * 100f64.ln();
        assert!((ranked[0].score.weight() - expected).abs() < 1e-9);
        assert_eq!(ranked[0].score.best_field_matches(), 1);
        assert_eq!(ranked[1].score.field_matches(Field::Body), 1);
    }

    #[test]
    fn test_ties_break_by_doc_id_descending() {
        let mut scorer = Scorer::new(10);
        scorer.add_postings(
            Field::Body,
            &[Posting::new(3, 1), Posting::new(7, 1), Posting::new(5, 1)],
        );
        let (ranked, _) = scorer.top(10);
        let ids: Vec<DocId> = ranked.iter().map(|d| d.doc_id).collect();
        assert_eq!(ids, vec![7, 5, 3]);
    }

    #[test]
    fn test_top_is_prefix_of_full_ranking() {
        let build = || {
            let mut scorer = Scorer::new(1000);
            let postings: Vec<Posting> = (1..=50).map(|d| Posting::new(d, d % 7 + 1)).collect();
            scorer.add_postings(Field::Body, &postings);
            scorer.add_postings(Field::Title, &postings[10..20]);
            scorer
        };
        let (full, total) = build().top(usize::MAX);
        let (top, top_total) = build().top(5);
        assert_eq!(total, 50);
        assert_eq!(top_total, 50);
        assert_eq!(top, full[..5]);
    }
}
