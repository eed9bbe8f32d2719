//! Abstract index surface the search core consumes, plus the in-memory
//! implementation backed by a catalog snapshot.

use std::{cmp::Reverse, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    catalog::{CatalogSnapshot, Work},
    search::predicate::WorkPredicate,
};

#[derive(Debug, Error)]
pub enum IndexError {
    /// The backing index cannot be reached right now; callers may retry.
    #[error("index unavailable: {0}")]
    Unavailable(String),
}

/// Ranked candidate source. Implementations must return candidates in a
/// stable relevance order, restartable from any offset.
#[async_trait]
pub trait Index: Send + Sync {
    /// Fetch up to `limit` matching works starting at `offset` in rank order.
    async fn ranked_candidates(
        &self,
        predicate: &WorkPredicate,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Work>, IndexError>;

    /// Total number of works matching the predicate.
    async fn count(&self, predicate: &WorkPredicate) -> Result<usize, IndexError>;

    /// Similarity-ranked works for a seed identifier, seed excluded.
    /// `None` when the identifier is unknown.
    async fn similar_to(&self, identifier: &str) -> Result<Option<Vec<Work>>, IndexError>;
}

/// Index over an immutable in-memory catalog snapshot.
pub struct InMemoryIndex {
    snapshot: Arc<CatalogSnapshot>,
}

impl InMemoryIndex {
    pub fn new(snapshot: Arc<CatalogSnapshot>) -> Self {
        Self { snapshot }
    }

    fn ranked_matches(&self, predicate: &WorkPredicate) -> Vec<&Work> {
        let mut matches: Vec<&Work> = self
            .snapshot
            .works
            .iter()
            .filter(|work| predicate.matches(work))
            .collect();

        // Identifier tie-break keeps the order stable across calls, which the
        // pagination guarantees depend on.
        matches.sort_by_key(|work| (Reverse(predicate.relevance(work)), work.identifier.clone()));
        matches
    }
}

#[async_trait]
impl Index for InMemoryIndex {
    async fn ranked_candidates(
        &self,
        predicate: &WorkPredicate,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Work>, IndexError> {
        Ok(self
            .ranked_matches(predicate)
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, predicate: &WorkPredicate) -> Result<usize, IndexError> {
        Ok(self
            .snapshot
            .works
            .iter()
            .filter(|work| predicate.matches(work))
            .count())
    }

    async fn similar_to(&self, identifier: &str) -> Result<Option<Vec<Work>>, IndexError> {
        let Some(seed) = self
            .snapshot
            .works
            .iter()
            .find(|work| work.identifier == identifier)
        else {
            return Ok(None);
        };

        let others: Vec<&Work> = self
            .snapshot
            .works
            .iter()
            .filter(|work| work.identifier != seed.identifier)
            .collect();

        let mut scored: Vec<(usize, &Work)> = others
            .iter()
            .map(|&work| (similarity(seed, work), work))
            .filter(|(score, _)| *score > 0)
            .collect();
        if scored.is_empty() {
            // The seed shares no tags and no source with anything else. A
            // known identifier still gets recommendations, so fall back to a
            // weaker tier ranked by matching media type.
            scored = others
                .into_iter()
                .map(|work| {
                    let score = usize::from(seed.extension.eq_ignore_ascii_case(&work.extension));
                    (score, work)
                })
                .collect();
        }
        scored.sort_by_key(|(score, work)| (Reverse(*score), work.identifier.clone()));

        Ok(Some(
            scored.into_iter().map(|(_, work)| work.clone()).collect(),
        ))
    }
}

/// Shared-tag count, with a small bonus for works from the same source.
fn similarity(seed: &Work, other: &Work) -> usize {
    let shared_tags = seed
        .tags
        .iter()
        .filter(|tag| {
            other
                .tags
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(tag))
        })
        .count();
    let source_bonus = usize::from(seed.source.eq_ignore_ascii_case(&other.source));
    shared_tags * 2 + source_bonus
}
