//! Bearer-authenticated wrapper over the Onshape REST API.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum OnshapeError {
    #[error("onshape session is not authorized")]
    Unauthorized,
    #[error("onshape api returned status {0}")]
    Status(u16),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Identity data from `/users/sessioninfo`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SessionInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One entry from the document versions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    #[ts(optional)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct OnshapeClient {
    http: reqwest::Client,
    api_base_url: String,
}

impl OnshapeClient {
    pub fn new(api_base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url,
        }
    }

    /// Identity of the user owning the access token.
    pub async fn session_info(&self, access_token: &str) -> Result<SessionInfo, OnshapeError> {
        let response = self
            .http
            .get(format!("{}/users/sessioninfo", self.api_base_url))
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(check(response)?.json().await?)
    }

    /// All versions of a document, newest first (vendor ordering).
    pub async fn document_versions(
        &self,
        access_token: &str,
        document_id: &str,
    ) -> Result<Vec<DocumentVersion>, OnshapeError> {
        let response = self
            .http
            .get(format!(
                "{}/documents/d/{document_id}/versions",
                self.api_base_url
            ))
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(check(response)?.json().await?)
    }

    /// Part metadata for an element, passed through untyped: the board only
    /// surfaces it, it never interprets it.
    pub async fn element_parts(
        &self,
        access_token: &str,
        document_id: &str,
        wvm: &str,
        wvm_id: &str,
        element_id: &str,
    ) -> Result<serde_json::Value, OnshapeError> {
        let response = self
            .http
            .get(format!(
                "{}/parts/d/{document_id}/{wvm}/{wvm_id}/e/{element_id}",
                self.api_base_url
            ))
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(check(response)?.json().await?)
    }

    /// Element thumbnail bytes plus the vendor content type.
    pub async fn element_thumbnail(
        &self,
        access_token: &str,
        document_id: &str,
        workspace_id: &str,
        element_id: &str,
        size: &str,
    ) -> Result<(Bytes, String), OnshapeError> {
        let response = self
            .http
            .get(format!(
                "{}/thumbnails/d/{document_id}/w/{workspace_id}/e/{element_id}/s/{size}",
                self.api_base_url
            ))
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = check(response)?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        Ok((response.bytes().await?, content_type))
    }
}

fn check(response: reqwest::Response) -> Result<reqwest::Response, OnshapeError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            Err(OnshapeError::Unauthorized)
        }
        status => Err(OnshapeError::Status(status.as_u16())),
    }
}
