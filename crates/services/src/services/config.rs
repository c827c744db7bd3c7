//! Environment-driven application configuration.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default Onshape OAuth endpoint base.
const DEFAULT_OAUTH_BASE_URL: &str = "https://oauth.onshape.com";

/// Default Onshape REST API base.
const DEFAULT_API_BASE_URL: &str = "https://cad.onshape.com/api/v6";

/// Minimum cookie signing key length required by the cookie jar.
const MIN_COOKIE_KEY_BYTES: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("PB_COOKIE_SECRET must be base64 and decode to at least 64 bytes")]
    InvalidCookieSecret,
    #[error("{0} must be a valid http(s) URL")]
    InvalidUrl(&'static str),
}

/// Base URLs are joined with fixed paths and query strings later; parsing
/// them here keeps those call sites infallible.
fn validate_base_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    let parsed = Url::parse(&value).map_err(|_| ConfigError::InvalidUrl(name))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(name));
    }
    Ok(value)
}

/// Vendor OAuth/API settings.
#[derive(Debug, Clone)]
pub struct OnshapeConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    /// OAuth endpoint base (override for tests)
    pub oauth_base_url: String,
    /// REST API base (override for tests)
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub onshape: OnshapeConfig,
    /// Decoded cookie signing key (>= 64 bytes)
    pub cookie_key: Vec<u8>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| lookup(name).ok_or(ConfigError::MissingVar(name));

        let cookie_key = BASE64
            .decode(require("PB_COOKIE_SECRET")?)
            .ok()
            .filter(|key| key.len() >= MIN_COOKIE_KEY_BYTES)
            .ok_or(ConfigError::InvalidCookieSecret)?;

        Ok(AppConfig {
            onshape: OnshapeConfig {
                client_id: require("ONSHAPE_CLIENT_ID")?,
                client_secret: SecretString::from(require("ONSHAPE_CLIENT_SECRET")?),
                redirect_uri: require("ONSHAPE_REDIRECT_URI")?,
                oauth_base_url: validate_base_url(
                    "ONSHAPE_OAUTH_URL",
                    lookup("ONSHAPE_OAUTH_URL")
                        .unwrap_or_else(|| DEFAULT_OAUTH_BASE_URL.to_string()),
                )?,
                api_base_url: validate_base_url(
                    "ONSHAPE_API_URL",
                    lookup("ONSHAPE_API_URL")
                        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
                )?,
            },
            cookie_key,
        })
    }
}
