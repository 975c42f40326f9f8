use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use findpepe_core::Selection;

use crate::infra::{app_state::AppState, errors::AppResult};

/// Raw query parameters. Kept as strings so malformed values surface as
/// catalog errors with their own messages rather than extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub category: Option<String>,
    pub board: Option<String>,
    pub offset: Option<String>,
}

/// `GET /`: one page of public image paths.
pub async fn select_images(
    State(state): State<AppState>,
    query: Result<Query<SelectionQuery>, QueryRejection>,
) -> AppResult<Json<Vec<String>>> {
    let Query(query) = query?;
    let selection = Selection::from_params(
        query.category.as_deref(),
        query.board.as_deref(),
        query.offset.as_deref(),
        state.config.catalog.page_size,
    )?;

    let page = state.engine().select_public_paths(&selection).await?;
    Ok(Json(page.into_items()))
}
