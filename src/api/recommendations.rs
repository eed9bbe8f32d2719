use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    api::{ApiError, ApiResult, search::SearchResponse},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RelatedParams {
    pub id: Option<String>,
}

pub async fn related_images(
    State(state): State<AppState>,
    Query(params): Query<RelatedParams>,
) -> ApiResult<SearchResponse> {
    let identifier = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("id query parameter is required"))?;

    let page = state.core.related(&identifier).await?;
    Ok(Json(SearchResponse::from(page)))
}
