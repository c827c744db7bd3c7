//! OAuth2 authorization-code flow and token refresh against the Onshape
//! OAuth endpoints.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::services::config::OnshapeConfig;

/// Refresh this many seconds before the access token actually expires.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// The OAuth token pair as stored in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthTokens {
    /// Whether the access token is expired or within the refresh margin.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

#[derive(Debug, Error)]
pub enum OnshapeAuthError {
    #[error("not authenticated with Onshape")]
    NotAuthenticated,
    #[error("oauth state mismatch")]
    StateMismatch,
    #[error("token endpoint returned status {0}")]
    TokenEndpoint(u16),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Wire shape of the Onshape token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    /// Seconds until the access token expires
    expires_in: i64,
}

impl TokenResponse {
    fn into_tokens(self, now: DateTime<Utc>) -> AuthTokens {
        AuthTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + Duration::seconds(self.expires_in),
        }
    }
}

/// Drives the authorization-code exchange and guards vendor calls with a
/// refresh check.
#[derive(Clone)]
pub struct OnshapeAuthService {
    http: reqwest::Client,
    config: OnshapeConfig,
}

impl OnshapeAuthService {
    pub fn new(config: OnshapeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Random CSRF state token for the authorization redirect.
    pub fn generate_state() -> String {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// The vendor authorization URL the browser is redirected to.
    pub fn authorize_url(&self, state: &str) -> String {
        let url = Url::parse_with_params(
            &format!("{}/oauth/authorize", self.config.oauth_base_url),
            [
                ("response_type", "code"),
                ("client_id", &self.config.client_id),
                ("redirect_uri", &self.config.redirect_uri),
                ("state", state),
            ],
        )
        .expect("base URL is validated at config load");
        url.into()
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<AuthTokens, OnshapeAuthError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", &self.config.client_id),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("redirect_uri", &self.config.redirect_uri),
        ])
        .await
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, OnshapeAuthError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.config.client_id),
            ("client_secret", self.config.client_secret.expose_secret()),
        ])
        .await
    }

    /// Token refresh guard: returns `None` when the stored pair is still
    /// valid, or the refreshed pair when the expiry (minus margin) has
    /// passed. Refresh failure means the refresh token itself is dead, so
    /// the caller must clear stored tokens and force re-auth.
    ///
    /// There is no cross-request deduplication here: concurrent requests
    /// may each trigger their own refresh.
    pub async fn ensure_fresh(
        &self,
        tokens: &AuthTokens,
    ) -> Result<Option<AuthTokens>, OnshapeAuthError> {
        if !tokens.needs_refresh(Utc::now()) {
            return Ok(None);
        }

        match self.refresh(&tokens.refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(error) => {
                warn!(?error, "token refresh failed; forcing re-authentication");
                Err(OnshapeAuthError::NotAuthenticated)
            }
        }
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<AuthTokens, OnshapeAuthError> {
        let response = self
            .http
            .post(format!("{}/oauth/token", self.config.oauth_base_url))
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OnshapeAuthError::TokenEndpoint(response.status().as_u16()));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.into_tokens(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_config() -> OnshapeConfig {
        OnshapeConfig {
            client_id: "client".to_string(),
            client_secret: SecretString::from("secret"),
            redirect_uri: "http://localhost:3000/api/auth/callback".to_string(),
            oauth_base_url: "https://oauth.onshape.example".to_string(),
            api_base_url: "https://cad.onshape.example/api/v6".to_string(),
        }
    }

    #[test]
    fn authorize_url_carries_client_and_state() {
        let service = OnshapeAuthService::new(test_config());
        let url = service.authorize_url("abc123");
        assert!(url.starts_with("https://oauth.onshape.example/oauth/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client"));
        assert!(url.contains("state=abc123"));
    }

    #[test]
    fn generated_states_are_unique() {
        let a = OnshapeAuthService::generate_state();
        let b = OnshapeAuthService::generate_state();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn fresh_token_skips_the_network() {
        // oauth_base_url points nowhere routable; ensure_fresh must not
        // touch it for a token that is still valid.
        let service = OnshapeAuthService::new(test_config());
        let tokens = AuthTokens {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        };
        let refreshed = service.ensure_fresh(&tokens).await.unwrap();
        assert!(refreshed.is_none());
    }

    #[test]
    fn needs_refresh_honors_margin() {
        let now = Utc::now();
        let tokens = AuthTokens {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: now + Duration::seconds(REFRESH_MARGIN_SECS - 1),
        };
        assert!(tokens.needs_refresh(now));

        let tokens = AuthTokens {
            expires_at: now + Duration::seconds(REFRESH_MARGIN_SECS + 5),
            ..tokens
        };
        assert!(!tokens.needs_refresh(now));
    }
}
