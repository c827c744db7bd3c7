//! Thin proxy over the Onshape REST API.
//!
//! Every handler runs the refresh guard first: a still-valid token passes
//! through, a stale one is refreshed and the rewritten cookie rides back on
//! the response, and a dead refresh token clears the session entirely.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use services::services::onshape::AuthTokens;

use crate::{AppState, error::ApiError, session};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/onshape/documents/{document_id}/versions",
            get(document_versions),
        )
        .route(
            "/onshape/documents/{document_id}/{wvm}/{wvm_id}/elements/{element_id}/parts",
            get(element_parts),
        )
        .route("/onshape/thumbnail", get(element_thumbnail))
}

/// Run the refresh guard against the cookie session. Returns the jar to
/// attach to the response (rewritten when a refresh happened) plus the
/// tokens to call the vendor with. A missing or unrecoverable session
/// short-circuits with cleared cookies and a 401.
async fn with_fresh_tokens(
    state: &AppState,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, AuthTokens), Response> {
    let Some(tokens) = session::tokens(&jar) else {
        return Err((session::clear(jar), ApiError::Unauthenticated).into_response());
    };

    match state.auth().ensure_fresh(&tokens).await {
        Ok(None) => Ok((jar, tokens)),
        Ok(Some(fresh)) => {
            let jar = session::store_tokens(jar, &fresh);
            Ok((jar, fresh))
        }
        Err(error) => Err((session::clear(jar), ApiError::from(error)).into_response()),
    }
}

async fn document_versions(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(document_id): Path<String>,
) -> Response {
    let (jar, tokens) = match with_fresh_tokens(&state, jar).await {
        Ok(ok) => ok,
        Err(response) => return response,
    };
    match state
        .onshape()
        .document_versions(&tokens.access_token, &document_id)
        .await
    {
        Ok(versions) => (jar, Json(versions)).into_response(),
        Err(error) => (jar, ApiError::from(error)).into_response(),
    }
}

async fn element_parts(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path((document_id, wvm, wvm_id, element_id)): Path<(String, String, String, String)>,
) -> Response {
    let (jar, tokens) = match with_fresh_tokens(&state, jar).await {
        Ok(ok) => ok,
        Err(response) => return response,
    };
    match state
        .onshape()
        .element_parts(&tokens.access_token, &document_id, &wvm, &wvm_id, &element_id)
        .await
    {
        Ok(parts) => (jar, Json(parts)).into_response(),
        Err(error) => (jar, ApiError::from(error)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThumbnailQuery {
    document_id: String,
    workspace_id: String,
    element_id: String,
    #[serde(default = "default_thumbnail_size")]
    size: String,
}

fn default_thumbnail_size() -> String {
    "300x300".to_string()
}

async fn element_thumbnail(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<ThumbnailQuery>,
) -> Response {
    let (jar, tokens) = match with_fresh_tokens(&state, jar).await {
        Ok(ok) => ok,
        Err(response) => return response,
    };
    match state
        .onshape()
        .element_thumbnail(
            &tokens.access_token,
            &query.document_id,
            &query.workspace_id,
            &query.element_id,
            &query.size,
        )
        .await
    {
        Ok((bytes, content_type)) => {
            (jar, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(error) => (jar, ApiError::from(error)).into_response(),
    }
}
