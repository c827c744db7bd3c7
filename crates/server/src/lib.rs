use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use db::DBService;
use services::services::{
    config::AppConfig,
    image::ImageService,
    onshape::{OnshapeAuthService, OnshapeClient},
};
use sqlx::SqlitePool;

pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;

#[derive(Clone)]
pub struct AppState {
    db: DBService,
    auth: OnshapeAuthService,
    onshape: OnshapeClient,
    images: ImageService,
    cookie_key: Key,
}

impl AppState {
    pub fn new(config: &AppConfig, db: DBService) -> Self {
        Self::with_parts(
            db,
            OnshapeAuthService::new(config.onshape.clone()),
            OnshapeClient::new(config.onshape.api_base_url.clone()),
            ImageService::new(),
            Key::from(&config.cookie_key),
        )
    }

    /// Assemble state from pre-built services (used by tests).
    pub fn with_parts(
        db: DBService,
        auth: OnshapeAuthService,
        onshape: OnshapeClient,
        images: ImageService,
        cookie_key: Key,
    ) -> Self {
        Self {
            db,
            auth,
            onshape,
            images,
            cookie_key,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn auth(&self) -> &OnshapeAuthService {
        &self.auth
    }

    pub fn onshape(&self) -> &OnshapeClient {
        &self.onshape
    }

    pub fn images(&self) -> &ImageService {
        &self.images
    }
}

// Lets extractors pull the signed-cookie key straight from state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
