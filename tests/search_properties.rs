//! End-to-end properties of the search core over a fixed catalog snapshot
//! with a deterministic liveness oracle.

use std::{
    collections::HashSet,
    sync::Arc,
};

use async_trait::async_trait;
use commons_search::{
    catalog::{CatalogSnapshot, Work},
    index::InMemoryIndex,
    licenses,
    liveness::{Liveness, LivenessOracle},
    search::{
        ResultPage, SearchCore,
        query::{RawSearchParams, SearchRequest},
    },
};

const LICENSE_CYCLE: &[&str] = &[
    "by", "by-nc", "by-nc-nd", "by-nc-sa", "by-nd", "by-sa", "pdm", "cc0",
];

/// Every 7th work has an unreachable URL.
const DEAD_STRIDE: usize = 7;

struct StubOracle {
    dead: HashSet<String>,
}

#[async_trait]
impl LivenessOracle for StubOracle {
    async fn probe(&self, url: &str) -> Liveness {
        if self.dead.contains(url) {
            Liveness::Dead
        } else {
            Liveness::Live
        }
    }
}

fn fixture_work(i: usize) -> Work {
    let creator = match i % 5 {
        0 | 1 => Some("William Ford Stanley".to_string()),
        2 => Some("Ford William Stanley".to_string()),
        3 => Some("Ada Jones".to_string()),
        _ => None,
    };
    let title = if i % 2 == 0 {
        Some(format!("Dog photo {i}"))
    } else {
        Some(format!("Cat photo {i}"))
    };

    Work {
        identifier: format!("w{i:03}"),
        title,
        creator,
        license: LICENSE_CYCLE[i % LICENSE_CYCLE.len()].to_string(),
        license_version: "3.0".to_string(),
        raw_license_url: if i % 11 == 0 {
            Some("null".to_string())
        } else {
            None
        },
        source: if i % 3 == 0 { "flickr" } else { "museum" }.to_string(),
        extension: if i % 4 == 0 { "png" } else { "jpg" }.to_string(),
        url: format!("https://images.example.org/w{i:03}.jpg"),
        tags: vec!["animal".to_string()],
    }
}

fn fixture_core(size: usize) -> SearchCore {
    let works: Vec<Work> = (0..size).map(fixture_work).collect();
    let dead: HashSet<String> = works
        .iter()
        .enumerate()
        .filter(|(i, _)| i % DEAD_STRIDE == 0)
        .map(|(_, work)| work.url.clone())
        .collect();

    let snapshot = Arc::new(CatalogSnapshot::new(works));
    SearchCore::new(
        Arc::new(InMemoryIndex::new(snapshot)),
        Arc::new(StubOracle { dead }),
        8,
    )
}

async fn search(core: &SearchCore, params: RawSearchParams) -> ResultPage {
    let request = SearchRequest::from_params(params).expect("valid request");
    core.search(&request).await.expect("search succeeds")
}

#[tokio::test]
async fn license_type_filter_is_conjunctive() {
    let core = fixture_core(120);
    let page = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            license_type: Some("commercial,modification".into()),
            page_size: Some(100),
            ..Default::default()
        },
    )
    .await;

    assert!(!page.items.is_empty());
    for work in &page.items {
        assert!(
            licenses::is_in_group(&work.license, "commercial")
                && licenses::is_in_group(&work.license, "modification"),
            "license {} escaped the group intersection",
            work.license
        );
    }
}

#[tokio::test]
async fn single_license_type_filter_holds() {
    let core = fixture_core(120);
    let page = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            license_type: Some("commercial".into()),
            page_size: Some(100),
            ..Default::default()
        },
    )
    .await;

    assert!(!page.items.is_empty());
    for work in &page.items {
        assert!(licenses::is_in_group(&work.license, "commercial"));
    }
}

#[tokio::test]
async fn specific_license_filter_is_exact() {
    let core = fixture_core(120);
    let page = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            license: Some("by".into()),
            page_size: Some(100),
            ..Default::default()
        },
    )
    .await;

    assert!(!page.items.is_empty());
    for work in &page.items {
        assert_eq!(work.license, "by");
    }
}

#[tokio::test]
async fn quoted_creator_narrows_results() {
    let core = fixture_core(120);
    let unquoted = search(
        &core,
        RawSearchParams {
            creator: Some("william ford stanley".into()),
            page_size: Some(200),
            filter_dead: Some(false),
            ..Default::default()
        },
    )
    .await;
    let quoted = search(
        &core,
        RawSearchParams {
            creator: Some("\"william ford stanley\"".into()),
            page_size: Some(200),
            filter_dead: Some(false),
            ..Default::default()
        },
    )
    .await;

    assert!(quoted.result_count < unquoted.result_count);
    assert!(!quoted.items.is_empty());
    for work in &quoted.items {
        let creator = work.creator.as_deref().unwrap_or_default().to_lowercase();
        assert!(creator.contains("william ford stanley"));
    }
}

#[tokio::test]
async fn source_and_extension_filters_hold() {
    let core = fixture_core(120);
    let page = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            source: Some("flickr".into()),
            extension: Some("jpg".into()),
            page_size: Some(100),
            ..Default::default()
        },
    )
    .await;

    assert!(page.result_count > 0);
    for work in &page.items {
        assert_eq!(work.source, "flickr");
        assert_eq!(work.extension, "jpg");
    }
}

#[tokio::test]
async fn dead_link_filtering_keeps_pages_full() {
    // Enough works that >= 100 survive the dead stride.
    let core = fixture_core(220);
    let page = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            page_size: Some(100),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(page.items.len(), 100);
}

#[tokio::test]
async fn filtered_and_unfiltered_windows_differ() {
    let core = fixture_core(220);
    let with_dead = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            page_size: Some(100),
            filter_dead: Some(false),
            ..Default::default()
        },
    )
    .await;
    let without_dead = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            page_size: Some(100),
            ..Default::default()
        },
    )
    .await;

    let matched = with_dead
        .items
        .iter()
        .zip(without_dead.items.iter())
        .filter(|(a, b)| a.identifier == b.identifier)
        .count();
    assert!(matched < 100, "dead-link filter changed nothing");
}

#[tokio::test]
async fn pagination_sweep_never_repeats_or_skips() {
    let core = fixture_core(220);
    let total_pages = 30;
    let page_size = 5;

    let mut ids = Vec::new();
    for page in 1..=total_pages {
        let result = search(
            &core,
            RawSearchParams {
                q: Some("*".into()),
                page: Some(page),
                page_size: Some(page_size),
                ..Default::default()
            },
        )
        .await;
        ids.extend(result.items.into_iter().map(|work| work.identifier));
    }

    assert_eq!(ids.len(), total_pages * page_size);
    let distinct: HashSet<&String> = ids.iter().collect();
    assert_eq!(distinct.len(), ids.len(), "a work appeared on two pages");

    // The sweep is exactly the live prefix of the ranked stream: a single
    // deep request over the same window returns the same identifiers in the
    // same order.
    let deep = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            page: Some(1),
            page_size: Some(total_pages * page_size),
            ..Default::default()
        },
    )
    .await;
    let deep_ids: Vec<String> = deep.items.into_iter().map(|work| work.identifier).collect();
    assert_eq!(ids, deep_ids);
}

#[tokio::test]
async fn result_count_bounds_reachable_offsets() {
    let core = fixture_core(60);
    let page = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            page_size: Some(10),
            ..Default::default()
        },
    )
    .await;
    assert!(page.result_count >= page.items.len());
}

#[tokio::test]
async fn related_works_flow_through_the_same_pipeline() {
    let core = fixture_core(60);
    let page = core.related("w001").await.expect("related succeeds");
    assert!(page.result_count > 0);
    assert!(page.items.iter().all(|work| work.identifier != "w001"));

    // Dead links are filtered from recommendations too.
    for work in &page.items {
        let index: usize = work.identifier[1..].parse().unwrap();
        assert_ne!(index % DEAD_STRIDE, 0, "dead link in recommendations");
    }

    let missing = core.related("nope").await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn license_url_sentinel_never_leaks() {
    let core = fixture_core(60);
    let page = search(
        &core,
        RawSearchParams {
            q: Some("*".into()),
            page_size: Some(60),
            filter_dead: Some(false),
            ..Default::default()
        },
    )
    .await;

    for work in &page.items {
        assert_ne!(work.license_url(), "null");
        assert!(work.license_url().starts_with("https://"));
    }
}
