use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;

use crate::{
    api::ApiResult,
    catalog::Work,
    routes::AppState,
    search::{
        ResultPage,
        query::{RawSearchParams, SearchRequest},
    },
};

/// Wire representation of a single search result.
#[derive(Debug, Serialize)]
pub struct WorkResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub license: String,
    pub license_version: String,
    pub license_url: String,
    pub source: String,
    pub extension: String,
    pub url: String,
    pub attribution: String,
    pub tags: Vec<String>,
}

impl From<Work> for WorkResponse {
    fn from(work: Work) -> Self {
        let license_url = work.license_url();
        let attribution = work.attribution();
        Self {
            id: work.identifier,
            title: work.title,
            creator: work.creator,
            license: work.license,
            license_version: work.license_version,
            license_url,
            source: work.source,
            extension: work.extension,
            url: work.url,
            attribution,
            tags: work.tags,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub result_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub results: Vec<WorkResponse>,
}

impl From<ResultPage> for SearchResponse {
    fn from(page: ResultPage) -> Self {
        Self {
            result_count: page.result_count,
            page: page.page,
            page_size: page.page_size,
            results: page.items.into_iter().map(WorkResponse::from).collect(),
        }
    }
}

pub async fn image_search(
    State(state): State<AppState>,
    Query(params): Query<RawSearchParams>,
) -> ApiResult<SearchResponse> {
    let request = SearchRequest::from_params(params).map_err(crate::api::ApiError::bad_request)?;
    let page = state.core.search(&request).await?;
    Ok(Json(SearchResponse::from(page)))
}
