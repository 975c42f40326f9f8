use axum::{
    Json,
    extract::{Path, State},
};
use findpepe_core::{Board, Category};

use crate::infra::{app_state::AppState, errors::AppResult};

/// `GET /boards`: distinct boards across every category.
pub async fn list_all_boards(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Board>>> {
    let boards = state.engine().list_boards(None).await?;
    Ok(Json(boards))
}

/// `GET /boards/{category}`: distinct boards for one category. The category
/// is validated before the backing is touched.
pub async fn list_category_boards(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<Board>>> {
    let category = category.parse::<Category>()?;
    let boards = state.engine().list_boards(Some(category)).await?;
    Ok(Json(boards))
}
