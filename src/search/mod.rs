//! Search core: request validation, predicate composition, dead-link
//! routing, and pagination slicing.

pub mod dead_links;
pub mod predicate;
pub mod query;
pub mod related;

use std::sync::Arc;

use thiserror::Error;

use crate::{
    catalog::Work,
    index::{Index, IndexError},
    liveness::LivenessOracle,
    search::{
        dead_links::{DeadLinkFilter, PredicateCandidates},
        predicate::WorkPredicate,
        query::{MAX_PAGE_SIZE, SearchRequest},
    },
};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("work '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// One page of ranked results.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    pub items: Vec<Work>,
    /// Count over the filtered corpus as reported by the index. With
    /// `filter_dead` this is an upper bound that ignores liveness; pages past
    /// the live prefix come back empty rather than erroring.
    pub result_count: usize,
    pub page: usize,
    pub page_size: usize,
}

pub struct SearchCore {
    index: Arc<dyn Index>,
    oracle: Arc<dyn LivenessOracle>,
    probe_concurrency: usize,
}

impl SearchCore {
    pub fn new(
        index: Arc<dyn Index>,
        oracle: Arc<dyn LivenessOracle>,
        probe_concurrency: usize,
    ) -> Self {
        Self {
            index,
            oracle,
            probe_concurrency,
        }
    }

    pub fn index(&self) -> &dyn Index {
        &*self.index
    }

    pub fn oracle(&self) -> &dyn LivenessOracle {
        &*self.oracle
    }

    pub fn probe_concurrency(&self) -> usize {
        self.probe_concurrency
    }

    /// Execute a search request and return the requested page.
    ///
    /// Pagination bounds are checked before the index is touched.
    pub async fn search(&self, request: &SearchRequest) -> Result<ResultPage, SearchError> {
        validate_bounds(request.page, request.page_size)?;

        let predicate = WorkPredicate::from_request(request);
        let result_count = self.index.count(&predicate).await?;
        // Offsets are computed with checked arithmetic: a window whose end
        // does not fit in usize is a caller error, not a crash.
        let end = request
            .page
            .checked_mul(request.page_size)
            .ok_or_else(|| SearchError::InvalidRequest("pagination window is too deep".into()))?;
        let start = end - request.page_size;

        let items = if request.filter_dead {
            let source = PredicateCandidates::new(&*self.index, &predicate);
            let filter = DeadLinkFilter::new(&*self.oracle, self.probe_concurrency);
            let prefix = filter.live_prefix(&source, end).await?;
            prefix.into_iter().skip(start).collect()
        } else {
            self.index
                .ranked_candidates(&predicate, start, request.page_size)
                .await?
        };

        Ok(ResultPage {
            items,
            result_count,
            page: request.page,
            page_size: request.page_size,
        })
    }
}

fn validate_bounds(page: usize, page_size: usize) -> Result<(), SearchError> {
    if page == 0 {
        return Err(SearchError::InvalidRequest(
            "page must be greater than or equal to 1".into(),
        ));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(SearchError::InvalidRequest(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}
