use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use db::{
    models::{
        board_config::BoardConfig,
        card::{CreateCard, KanbanCard, UpdateCard},
        process::{Process, SetProcesses},
    },
    validation::require_non_empty,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, middleware::load_card_middleware};

pub fn router(state: &AppState) -> Router<AppState> {
    let card_router = Router::new()
        .route("/", get(get_card).put(update_card).delete(delete_card))
        .route("/move", post(move_card))
        .route("/processes", get(get_card_processes).put(set_card_processes))
        .layer(from_fn_with_state(state.clone(), load_card_middleware));

    Router::new()
        .route("/cards", get(get_cards).post(create_card))
        .nest("/cards/{card_id}", card_router)
}

#[derive(Debug, Deserialize)]
struct CardFilter {
    column_id: Option<String>,
}

async fn get_cards(
    State(state): State<AppState>,
    Query(filter): Query<CardFilter>,
) -> Result<Json<Vec<KanbanCard>>, ApiError> {
    let cards = match filter.column_id {
        Some(column_id) => KanbanCard::find_by_column(state.pool(), &column_id).await?,
        None => KanbanCard::find_all(state.pool()).await?,
    };
    Ok(Json(cards))
}

async fn create_card(
    State(state): State<AppState>,
    Json(payload): Json<CreateCard>,
) -> Result<(StatusCode, Json<KanbanCard>), ApiError> {
    require_non_empty("title", &payload.title)?;
    require_target_column(&state, &payload.column_id).await?;
    let card = KanbanCard::create(state.pool(), &payload).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

async fn get_card(Extension(card): Extension<KanbanCard>) -> Json<KanbanCard> {
    Json(card)
}

async fn update_card(
    Extension(card): Extension<KanbanCard>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateCard>,
) -> Result<Json<KanbanCard>, ApiError> {
    if let Some(title) = &payload.title {
        require_non_empty("title", title)?;
    }
    let card = KanbanCard::update(state.pool(), card.id, &payload).await?;
    Ok(Json(card))
}

#[derive(Debug, Deserialize)]
struct MoveCard {
    column_id: String,
}

async fn move_card(
    Extension(card): Extension<KanbanCard>,
    State(state): State<AppState>,
    Json(payload): Json<MoveCard>,
) -> Result<Json<KanbanCard>, ApiError> {
    require_target_column(&state, &payload.column_id).await?;
    let card = KanbanCard::move_to_column(state.pool(), card.id, &payload.column_id).await?;
    Ok(Json(card))
}

async fn delete_card(
    Extension(card): Extension<KanbanCard>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let rows = KanbanCard::delete(state.pool(), card.id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("card"));
    }
    if let Some(image_url) = &card.image_url {
        // External URLs are ignored by the image store.
        state.images().delete_by_url(image_url).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn get_card_processes(
    Extension(card): Extension<KanbanCard>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Process>>, ApiError> {
    let processes = Process::find_for_card(state.pool(), card.id).await?;
    Ok(Json(processes))
}

async fn set_card_processes(
    Extension(card): Extension<KanbanCard>,
    State(state): State<AppState>,
    Json(payload): Json<SetProcesses>,
) -> Result<Json<Vec<Process>>, ApiError> {
    KanbanCard::set_processes(state.pool(), card.id, &payload.process_ids).await?;
    let processes = Process::find_for_card(state.pool(), card.id).await?;
    Ok(Json(processes))
}

async fn require_target_column(state: &AppState, column_id: &str) -> Result<(), ApiError> {
    let config = BoardConfig::get_or_init(state.pool()).await?;
    if !config.has_column(column_id) {
        return Err(ApiError::Validation(format!(
            "unknown board column: {column_id}"
        )));
    }
    Ok(())
}
