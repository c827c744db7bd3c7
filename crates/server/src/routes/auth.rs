//! OAuth login flow: redirect to the vendor, handle the callback, and
//! expose the logged-in user.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::SignedCookieJar;
use db::models::user::OnshapeUser;
use serde::Deserialize;

use crate::{AppState, error::ApiError, session};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

async fn login(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    let csrf_state = services::services::onshape::OnshapeAuthService::generate_state();
    let url = state.auth().authorize_url(&csrf_state);
    let jar = session::store_oauth_state(jar, &csrf_state);
    (jar, Redirect::temporary(&url)).into_response()
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    /// Set by the vendor when the user denies the grant.
    error: Option<String>,
}

// Returns a raw `Response` so the state-cookie removal rides back even on
// rejected callbacks.
async fn callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let expected = session::oauth_state(&jar);
    let jar = session::clear_oauth_state(jar);

    if let Some(error) = query.error {
        let error = ApiError::Validation(format!("authorization was not granted: {error}"));
        return (jar, error).into_response();
    }

    match (&expected, &query.state) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => {
            let error: ApiError =
                services::services::onshape::OnshapeAuthError::StateMismatch.into();
            return (jar, error).into_response();
        }
    }

    let Some(code) = query.code else {
        let error = ApiError::Validation("missing authorization code".to_string());
        return (jar, error).into_response();
    };

    let result = async {
        let tokens = state.auth().exchange_code(&code).await?;
        let info = state.onshape().session_info(&tokens.access_token).await?;
        let user = OnshapeUser::upsert(state.pool(), &info.id, &info.name).await?;
        Ok::<_, ApiError>((tokens, user))
    }
    .await;

    match result {
        Ok((tokens, user)) => {
            let jar = session::store_tokens(jar, &tokens);
            let jar = session::store_user_id(jar, &user.id);
            (jar, Redirect::temporary("/")).into_response()
        }
        Err(error) => (jar, error).into_response(),
    }
}

async fn logout(jar: SignedCookieJar) -> Response {
    (session::clear(jar), StatusCode::NO_CONTENT).into_response()
}

async fn me(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Json<OnshapeUser>, ApiError> {
    let user_id = session::user_id(&jar).ok_or(ApiError::Unauthenticated)?;
    let user = OnshapeUser::find_by_id(state.pool(), &user_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Json(user))
}
