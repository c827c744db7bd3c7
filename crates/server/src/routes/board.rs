use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use db::models::board_config::{BoardColumn, BoardConfig, validate_columns};
use serde::Deserialize;
use ts_rs::TS;

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new().route("/board/columns", get(get_columns).put(put_columns))
}

async fn get_columns(State(state): State<AppState>) -> Result<Json<BoardConfig>, ApiError> {
    let config = BoardConfig::get_or_init(state.pool()).await?;
    Ok(Json(config))
}

#[derive(Debug, Deserialize, TS)]
pub struct ReplaceColumns {
    pub columns: Vec<BoardColumn>,
}

async fn put_columns(
    State(state): State<AppState>,
    Json(payload): Json<ReplaceColumns>,
) -> Result<Json<BoardConfig>, ApiError> {
    validate_columns(&payload.columns)?;
    let config = BoardConfig::replace(state.pool(), payload.columns).await?;
    Ok(Json(config))
}
