use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};
use db::{
    models::process::{CreateProcess, Process, UpdateProcess},
    validation::require_non_empty,
};

use crate::{AppState, error::ApiError, middleware::load_process_middleware};

pub fn router(state: &AppState) -> Router<AppState> {
    let process_router = Router::new()
        .route(
            "/",
            get(get_process).put(update_process).delete(delete_process),
        )
        .layer(from_fn_with_state(state.clone(), load_process_middleware));

    Router::new()
        .route("/processes", get(list_processes).post(create_process))
        .nest("/processes/{process_id}", process_router)
}

async fn list_processes(State(state): State<AppState>) -> Result<Json<Vec<Process>>, ApiError> {
    let processes = Process::find_all(state.pool()).await?;
    Ok(Json(processes))
}

async fn create_process(
    State(state): State<AppState>,
    Json(payload): Json<CreateProcess>,
) -> Result<(StatusCode, Json<Process>), ApiError> {
    require_non_empty("name", &payload.name)?;
    let process = Process::create(state.pool(), &payload).await?;
    Ok((StatusCode::CREATED, Json(process)))
}

async fn get_process(Extension(process): Extension<Process>) -> Json<Process> {
    Json(process)
}

async fn update_process(
    Extension(process): Extension<Process>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProcess>,
) -> Result<Json<Process>, ApiError> {
    if let Some(name) = &payload.name {
        require_non_empty("name", name)?;
    }
    let process = Process::update(state.pool(), process.id, &payload).await?;
    Ok(Json(process))
}

async fn delete_process(
    Extension(process): Extension<Process>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let rows = Process::delete(state.pool(), process.id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("process"));
    }
    Ok(StatusCode::NO_CONTENT)
}
