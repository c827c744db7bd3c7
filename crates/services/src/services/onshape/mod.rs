//! Thin proxy layer over the Onshape CAD API: OAuth token handling and a
//! bearer-authenticated REST client.

pub mod auth;
pub mod client;

pub use auth::{AuthTokens, OnshapeAuthError, OnshapeAuthService, REFRESH_MARGIN_SECS};
pub use client::{DocumentVersion, OnshapeClient, OnshapeError, SessionInfo};
