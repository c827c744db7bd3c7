use axum::{
    Extension, Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use db::{
    models::{
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
        process::{Process, SetProcesses},
    },
    validation::require_non_empty,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, middleware::load_equipment_middleware};

pub fn router(state: &AppState) -> Router<AppState> {
    let item_router = Router::new()
        .route(
            "/",
            get(get_equipment).put(update_equipment).delete(delete_equipment),
        )
        .route(
            "/processes",
            get(get_equipment_processes).put(set_equipment_processes),
        )
        .route("/images", post(upload_image).delete(remove_image))
        .layer(from_fn_with_state(state.clone(), load_equipment_middleware));

    Router::new()
        .route("/equipment", get(list_equipment).post(create_equipment))
        .nest("/equipment/{equipment_id}", item_router)
}

async fn list_equipment(State(state): State<AppState>) -> Result<Json<Vec<Equipment>>, ApiError> {
    let equipment = Equipment::find_all(state.pool()).await?;
    Ok(Json(equipment))
}

async fn create_equipment(
    State(state): State<AppState>,
    Json(payload): Json<CreateEquipment>,
) -> Result<(StatusCode, Json<Equipment>), ApiError> {
    require_non_empty("name", &payload.name)?;
    let equipment = Equipment::create(state.pool(), &payload).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

async fn get_equipment(Extension(equipment): Extension<Equipment>) -> Json<Equipment> {
    Json(equipment)
}

async fn update_equipment(
    Extension(equipment): Extension<Equipment>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateEquipment>,
) -> Result<Json<Equipment>, ApiError> {
    if let Some(name) = &payload.name {
        require_non_empty("name", name)?;
    }
    let equipment = Equipment::update(state.pool(), equipment.id, &payload).await?;
    Ok(Json(equipment))
}

async fn delete_equipment(
    Extension(equipment): Extension<Equipment>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let rows = Equipment::delete(state.pool(), equipment.id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("equipment"));
    }
    state.images().delete_all(&equipment.images.0).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_equipment_processes(
    Extension(equipment): Extension<Equipment>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Process>>, ApiError> {
    let processes = Process::find_for_equipment(state.pool(), equipment.id).await?;
    Ok(Json(processes))
}

async fn set_equipment_processes(
    Extension(equipment): Extension<Equipment>,
    State(state): State<AppState>,
    Json(payload): Json<SetProcesses>,
) -> Result<Json<Vec<Process>>, ApiError> {
    Equipment::set_processes(state.pool(), equipment.id, &payload.process_ids).await?;
    let processes = Process::find_for_equipment(state.pool(), equipment.id).await?;
    Ok(Json(processes))
}

async fn upload_image(
    Extension(equipment): Extension<Equipment>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Equipment>), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let data = field.bytes().await?;
        let stored = state.images().save(&data, filename.as_deref()).await?;
        let updated = Equipment::append_image(state.pool(), equipment.id, &stored.url).await?;
        return Ok((StatusCode::CREATED, Json(updated)));
    }
    Err(ApiError::Validation(
        "multipart field 'image' is required".to_string(),
    ))
}

#[derive(Debug, Deserialize)]
struct RemoveImage {
    url: String,
}

async fn remove_image(
    Extension(equipment): Extension<Equipment>,
    State(state): State<AppState>,
    Json(payload): Json<RemoveImage>,
) -> Result<Json<Equipment>, ApiError> {
    let (updated, removed) =
        Equipment::remove_image(state.pool(), equipment.id, &payload.url).await?;
    if removed {
        state.images().delete_by_url(&payload.url).await?;
    }
    Ok(Json(updated))
}
