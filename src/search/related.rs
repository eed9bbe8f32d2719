//! Related-works recommendations: a similarity-ranked candidate source fed
//! through the same dead-link filtering pipeline as text search.

use crate::search::{
    ResultPage, SearchCore, SearchError,
    dead_links::{DeadLinkFilter, SliceCandidates},
};

/// Recommendations are served as a single fixed-size page; consistency across
/// deep pagination matters less here than for text search.
const RELATED_PAGE_SIZE: usize = 10;

impl SearchCore {
    /// Works similar to the given seed, dead links filtered out.
    ///
    /// An unknown identifier is a distinct not-found error, never an empty
    /// success.
    pub async fn related(&self, identifier: &str) -> Result<ResultPage, SearchError> {
        let candidates = self
            .index()
            .similar_to(identifier)
            .await?
            .ok_or_else(|| SearchError::NotFound(identifier.to_string()))?;

        let result_count = candidates.len();
        let source = SliceCandidates::new(candidates);
        let filter = DeadLinkFilter::new(self.oracle(), self.probe_concurrency());
        let items = filter.live_prefix(&source, RELATED_PAGE_SIZE).await?;

        Ok(ResultPage {
            items,
            result_count,
            page: 1,
            page_size: RELATED_PAGE_SIZE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{CatalogSnapshot, Work},
        index::InMemoryIndex,
        liveness::{Liveness, LivenessOracle},
    };
    use async_trait::async_trait;
    use std::{collections::HashSet, sync::Arc};

    struct StaticOracle {
        dead: HashSet<String>,
    }

    #[async_trait]
    impl LivenessOracle for StaticOracle {
        async fn probe(&self, url: &str) -> Liveness {
            if self.dead.contains(url) {
                Liveness::Dead
            } else {
                Liveness::Live
            }
        }
    }

    fn work(identifier: &str, tags: &[&str]) -> Work {
        Work {
            identifier: identifier.into(),
            title: Some("Dog".into()),
            creator: None,
            license: "by".into(),
            license_version: "3.0".into(),
            raw_license_url: None,
            source: "flickr".into(),
            extension: "jpg".into(),
            url: format!("https://images.example.org/{identifier}.jpg"),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    fn core(works: Vec<Work>, dead: &[&str]) -> SearchCore {
        let snapshot = Arc::new(CatalogSnapshot::new(works));
        SearchCore::new(
            Arc::new(InMemoryIndex::new(snapshot)),
            Arc::new(StaticOracle {
                dead: dead.iter().map(|url| url.to_string()).collect(),
            }),
            4,
        )
    }

    #[tokio::test]
    async fn related_returns_similar_works() {
        let core = core(
            vec![
                work("seed", &["dog", "beach"]),
                work("near", &["dog", "beach"]),
                work("far", &["dog"]),
                work("off", &["cat"]),
            ],
            &[],
        );

        let page = core.related("seed").await.unwrap();
        assert!(page.result_count > 0);
        let ids: Vec<&str> = page.items.iter().map(|w| w.identifier.as_str()).collect();
        assert_eq!(ids[0], "near");
        assert!(!ids.contains(&"seed"));
    }

    #[tokio::test]
    async fn related_filters_dead_links() {
        let core = core(
            vec![
                work("seed", &["dog"]),
                work("alive", &["dog"]),
                work("broken", &["dog"]),
            ],
            &["https://images.example.org/broken.jpg"],
        );

        let page = core.related("seed").await.unwrap();
        let ids: Vec<&str> = page.items.iter().map(|w| w.identifier.as_str()).collect();
        assert!(ids.contains(&"alive"));
        assert!(!ids.contains(&"broken"));
    }

    #[tokio::test]
    async fn isolated_seed_still_gets_recommendations() {
        let mut seed = work("seed", &[]);
        seed.source = "solo-archive".into();
        let core = core(vec![seed, work("other", &["cat"])], &[]);

        let page = core.related("seed").await.unwrap();
        assert!(page.result_count > 0);
        assert_eq!(page.items[0].identifier, "other");
    }

    #[tokio::test]
    async fn unknown_seed_is_not_found() {
        let core = core(vec![work("only", &["dog"])], &[]);
        assert!(matches!(
            core.related("missing").await,
            Err(SearchError::NotFound(_))
        ));
    }
}
