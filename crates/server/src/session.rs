//! Signed-cookie session storage for OAuth tokens and CSRF state.
//!
//! Tokens live in signed, http-only cookies; nothing auth-related is kept
//! server-side. Reads go through the signed jar, so a tampered cookie is
//! simply absent.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use services::services::onshape::AuthTokens;

/// Serialized `AuthTokens` JSON.
pub const TOKEN_COOKIE: &str = "pb_tokens";
/// CSRF state held between the authorize redirect and the callback.
pub const STATE_COOKIE: &str = "pb_oauth_state";
/// Onshape user id of the logged-in user.
pub const USER_COOKIE: &str = "pb_user";

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

pub fn tokens(jar: &SignedCookieJar) -> Option<AuthTokens> {
    let cookie = jar.get(TOKEN_COOKIE)?;
    serde_json::from_str(cookie.value()).ok()
}

pub fn store_tokens(jar: SignedCookieJar, tokens: &AuthTokens) -> SignedCookieJar {
    let value = serde_json::to_string(tokens).expect("AuthTokens serializes");
    jar.add(session_cookie(TOKEN_COOKIE, value))
}

pub fn oauth_state(jar: &SignedCookieJar) -> Option<String> {
    jar.get(STATE_COOKIE).map(|c| c.value().to_string())
}

pub fn store_oauth_state(jar: SignedCookieJar, state: &str) -> SignedCookieJar {
    jar.add(session_cookie(STATE_COOKIE, state.to_string()))
}

pub fn clear_oauth_state(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(removal_cookie(STATE_COOKIE))
}

pub fn user_id(jar: &SignedCookieJar) -> Option<String> {
    jar.get(USER_COOKIE).map(|c| c.value().to_string())
}

pub fn store_user_id(jar: SignedCookieJar, user_id: &str) -> SignedCookieJar {
    jar.add(session_cookie(USER_COOKIE, user_id.to_string()))
}

/// Drop every auth-related cookie (logout, or refresh-token death).
pub fn clear(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(removal_cookie(TOKEN_COOKIE))
        .remove(removal_cookie(STATE_COOKIE))
        .remove(removal_cookie(USER_COOKIE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;
    use chrono::Utc;

    fn jar() -> SignedCookieJar {
        SignedCookieJar::new(Key::from(&[3u8; 64]))
    }

    #[test]
    fn token_roundtrip() {
        let stored = AuthTokens {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: Utc::now(),
        };
        let jar = store_tokens(jar(), &stored);
        assert_eq!(tokens(&jar), Some(stored));
    }

    #[test]
    fn clear_removes_everything() {
        let jar = store_user_id(store_oauth_state(jar(), "s"), "u");
        let jar = clear(jar);
        assert!(oauth_state(&jar).is_none());
        assert!(user_id(&jar).is_none());
        assert!(tokens(&jar).is_none());
    }
}
