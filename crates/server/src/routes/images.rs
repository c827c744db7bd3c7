//! Upload and serve stored images.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use ts_rs::TS;

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/images", post(upload_image))
        .route("/images/{filename}", get(serve_image))
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct UploadedImage {
    pub filename: String,
    pub url: String,
}

async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let data = field.bytes().await?;
        let stored = state.images().save(&data, filename.as_deref()).await?;
        return Ok((
            StatusCode::CREATED,
            Json(UploadedImage {
                filename: stored.filename,
                url: stored.url,
            }),
        ));
    }
    Err(ApiError::Validation(
        "multipart field 'image' is required".to_string(),
    ))
}

async fn serve_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = state.images().path_for(&filename)?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("image"));
        }
        Err(e) => return Err(services::services::image::ImageError::from(e).into()),
    };
    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
