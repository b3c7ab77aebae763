//! The governed call executed by the dispatcher.
#![allow(clippy::future_not_send)]

use reqwest::Client;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use super::params::CatalogRequest;
use super::types::JikanErrorResponse;
use crate::error::{ApiError, Result};

/// Executes one catalog request.
///
/// The dispatcher owns exactly one transport and never calls it
/// concurrently. Tests substitute a scripted implementation.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Performs the request and returns the decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when no response was received,
    /// [`ApiError::Http`] on a non-success status, and
    /// [`ApiError::Decode`] when the body is not JSON.
    async fn execute(&self, request: &CatalogRequest) -> Result<Value>;
}

/// HTTP transport against the Jikan REST API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client (reqwest, gzip enabled).
    http_client: Client,
    /// Base URL, ending in `/`.
    base_url: Url,
}

impl HttpTransport {
    /// Creates a transport sending requests relative to `base_url`.
    #[must_use]
    pub const fn new(http_client: Client, base_url: Url) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the failure for a non-success response body.
    fn http_error(status: reqwest::StatusCode, body: &str) -> ApiError {
        let message = serde_json::from_str::<JikanErrorResponse>(body)
            .ok()
            .and_then(|e| match (e.message, e.error) {
                (Some(message), _) => Some(message),
                (None, Some(error)) => Some(error),
                (None, None) => e.kind,
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map_or_else(|| String::from("request failed"), String::from)
            });
        ApiError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

impl Transport for HttpTransport {
    #[instrument(skip_all, fields(path = %request.path))]
    async fn execute(&self, request: &CatalogRequest) -> Result<Value> {
        let url = self.base_url.join(&request.path).map_err(|e| {
            ApiError::InvalidRequest(format!("failed to join URL path {}: {e}", request.path))
        })?;

        let response = self
            .http_client
            .get(url)
            .query(&request.query)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(%status, url = %response.url(), "Jikan API response");

        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("{}: {e}", request.path)))
    }
}
