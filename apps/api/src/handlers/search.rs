use axum::Json;
use axum::extract::{Extension, Query, State};
use envkeep_core::UserIdentity;
use serde::Deserialize;

use crate::dto::SearchResponse;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let results = state
        .search_service
        .search(&user, query.q.as_str())
        .await?;

    Ok(Json(SearchResponse::from(results)))
}
