//! Dead-link filtering over a ranked candidate stream.
//!
//! Liveness is only known by probing, so the filter pulls candidates in
//! expanding batches from the source, probes each batch with bounded
//! concurrency, and accumulates live items until the requested live-prefix
//! length is reached or the source runs dry. Relative rank order is preserved
//! throughout, which is what makes offset-based pagination over the live
//! subset consistent: page N is always the tail slice of the first
//! `N * page_size` live items.

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use tracing::debug;

use crate::{
    catalog::Work,
    index::{Index, IndexError},
    liveness::{Liveness, LivenessOracle},
    search::predicate::WorkPredicate,
};

/// Smallest batch worth fetching; keeps tiny pages from degenerating into
/// one-probe round trips when most links are live.
const MIN_BATCH: usize = 20;

/// Restartable ranked stream of candidate works.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch(&self, offset: usize, limit: usize) -> Result<Vec<Work>, IndexError>;
}

/// Candidate source backed by an index predicate query.
pub struct PredicateCandidates<'a> {
    index: &'a dyn Index,
    predicate: &'a WorkPredicate,
}

impl<'a> PredicateCandidates<'a> {
    pub fn new(index: &'a dyn Index, predicate: &'a WorkPredicate) -> Self {
        Self { index, predicate }
    }
}

#[async_trait]
impl CandidateSource for PredicateCandidates<'_> {
    async fn fetch(&self, offset: usize, limit: usize) -> Result<Vec<Work>, IndexError> {
        self.index
            .ranked_candidates(self.predicate, offset, limit)
            .await
    }
}

/// Candidate source over an already-materialized ranked list, used by the
/// recommendation pipeline.
pub struct SliceCandidates {
    works: Vec<Work>,
}

impl SliceCandidates {
    pub fn new(works: Vec<Work>) -> Self {
        Self { works }
    }
}

#[async_trait]
impl CandidateSource for SliceCandidates {
    async fn fetch(&self, offset: usize, limit: usize) -> Result<Vec<Work>, IndexError> {
        Ok(self
            .works
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// One page-construction pass of the batch-expansion loop.
enum FilterState {
    FetchingBatch {
        offset: usize,
    },
    Probing {
        offset: usize,
        batch: Vec<Work>,
        exhausted: bool,
    },
    Accumulating {
        offset: usize,
        probed: Vec<(Work, Liveness)>,
        exhausted: bool,
    },
    Done,
}

pub struct DeadLinkFilter<'a> {
    oracle: &'a dyn LivenessOracle,
    probe_concurrency: usize,
}

impl<'a> DeadLinkFilter<'a> {
    pub fn new(oracle: &'a dyn LivenessOracle, probe_concurrency: usize) -> Self {
        Self {
            oracle,
            probe_concurrency: probe_concurrency.max(1),
        }
    }

    /// Collect the first `needed` live works from the head of the candidate
    /// stream, in source order.
    ///
    /// Returns fewer than `needed` only when the source is exhausted.
    pub async fn live_prefix(
        &self,
        source: &dyn CandidateSource,
        needed: usize,
    ) -> Result<Vec<Work>, IndexError> {
        // No capacity hint: `needed` is caller-controlled and may be far
        // larger than the source will ever yield.
        let mut live: Vec<Work> = Vec::new();
        let mut state = FilterState::FetchingBatch { offset: 0 };

        loop {
            state = match state {
                FilterState::FetchingBatch { offset } => {
                    let want = batch_size(needed - live.len());
                    let batch = source.fetch(offset, want).await?;
                    let exhausted = batch.len() < want;
                    if batch.is_empty() {
                        FilterState::Done
                    } else {
                        FilterState::Probing {
                            offset: offset + batch.len(),
                            batch,
                            exhausted,
                        }
                    }
                }
                FilterState::Probing {
                    offset,
                    batch,
                    exhausted,
                } => {
                    let oracle = self.oracle;
                    // `buffered` probes concurrently but yields in input
                    // order, so rank order survives the probe.
                    let probed: Vec<(Work, Liveness)> = stream::iter(batch)
                        .map(|work| async move {
                            let liveness = oracle.probe(&work.url).await;
                            (work, liveness)
                        })
                        .buffered(self.probe_concurrency)
                        .collect()
                        .await;
                    FilterState::Accumulating {
                        offset,
                        probed,
                        exhausted,
                    }
                }
                FilterState::Accumulating {
                    offset,
                    probed,
                    exhausted,
                } => {
                    let batch_len = probed.len();
                    let dead = probed
                        .iter()
                        .filter(|(_, liveness)| *liveness == Liveness::Dead)
                        .count();
                    if dead > 0 {
                        debug!(dead, batch = batch_len, "dropped dead links from batch");
                    }

                    live.extend(
                        probed
                            .into_iter()
                            .filter(|(_, liveness)| *liveness == Liveness::Live)
                            .map(|(work, _)| work),
                    );

                    if live.len() >= needed || exhausted {
                        FilterState::Done
                    } else {
                        FilterState::FetchingBatch { offset }
                    }
                }
                FilterState::Done => break,
            };
        }

        live.truncate(needed);
        Ok(live)
    }
}

fn batch_size(remaining: usize) -> usize {
    // Over-fetch so a sprinkling of dead links rarely costs a second round.
    remaining.saturating_mul(2).max(MIN_BATCH)
}
