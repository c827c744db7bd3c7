//! Middleware that resolves `{id}` path params into loaded models.
//!
//! Handlers downstream take the entity via `Extension`, so the not-found
//! path is handled in exactly one place per entity.

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::{card::KanbanCard, equipment::Equipment, process::Process};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn load_card_middleware(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let card = KanbanCard::find_by_id(state.pool(), card_id)
        .await?
        .ok_or(ApiError::NotFound("card"))?;
    request.extensions_mut().insert(card);
    Ok(next.run(request).await)
}

pub async fn load_equipment_middleware(
    State(state): State<AppState>,
    Path(equipment_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let equipment = Equipment::find_by_id(state.pool(), equipment_id)
        .await?
        .ok_or(ApiError::NotFound("equipment"))?;
    request.extensions_mut().insert(equipment);
    Ok(next.run(request).await)
}

pub async fn load_process_middleware(
    State(state): State<AppState>,
    Path(process_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let process = Process::find_by_id(state.pool(), process_id)
        .await?
        .ok_or(ApiError::NotFound("process"))?;
    request.extensions_mut().insert(process);
    Ok(next.run(request).await)
}
