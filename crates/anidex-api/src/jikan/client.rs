//! `JikanClient` - catalog client routed through the dispatcher.

use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::api::LocalCatalogApi;
use super::dispatcher::{DEFAULT_SPACING, Dispatcher, DispatcherConfig};
use super::params::{CatalogRequest, MediaType, PAGE_LIMIT, TOP_LIMIT, TopFilter};
use super::transport::HttpTransport;
use super::types::{
    Anime, CharacterEntry, Envelope, Genre, PageEnvelope, PaginatedResult, Recommendation,
};
use crate::error::{ApiError, Result};

/// Default base URL for Jikan API v4.
const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4/";

/// Jikan catalog client.
///
/// Every operation is a translation to a [`CatalogRequest`] submitted to
/// the shared [`Dispatcher`]; the client itself holds no state between calls.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct JikanClient {
    /// Single-flight queue all requests go through.
    dispatcher: Dispatcher,
}

/// Builder for `JikanClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct JikanClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
    spacing: Option<Duration>,
    max_queue_depth: Option<usize>,
}

impl JikanClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            spacing: None,
            max_queue_depth: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the spacing between requests (default: 350ms).
    #[must_use]
    pub const fn spacing(mut self, spacing: Duration) -> Self {
        self.spacing = Some(spacing);
        self
    }

    /// Caps the number of waiting requests (default: unbounded).
    #[must_use]
    pub const fn max_queue_depth(mut self, depth: usize) -> Self {
        self.max_queue_depth = Some(depth);
        self
    }

    /// Builds the client and starts its dispatcher.
    ///
    /// # Errors
    ///
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn build(self) -> AnyResult<JikanClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL).context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        let config = DispatcherConfig {
            spacing: self.spacing.unwrap_or(DEFAULT_SPACING),
            max_queue_depth: self.max_queue_depth,
        };
        let dispatcher = Dispatcher::spawn(HttpTransport::new(http_client, base_url), config);

        Ok(JikanClient { dispatcher })
    }
}

impl JikanClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> JikanClientBuilder {
        JikanClientBuilder::new()
    }

    /// Creates a client that shares an existing dispatcher.
    #[must_use]
    pub const fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Dispatcher this client submits to.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Fetches one page of top movies.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher failure or a decode error.
    pub async fn movies(&self, page: u32) -> Result<PaginatedResult<Anime>> {
        self.top_by_type(MediaType::Movie, page).await
    }

    /// Fetches one page of top TV series.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher failure or a decode error.
    pub async fn series(&self, page: u32) -> Result<PaginatedResult<Anime>> {
        self.top_by_type(MediaType::Tv, page).await
    }

    /// Submits `request` and decodes the settled payload.
    async fn fetch<T: DeserializeOwned>(&self, request: CatalogRequest) -> Result<T> {
        let path = request.path.clone();
        let body = self.dispatcher.submit(request).await?;
        serde_json::from_value(body).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }

    /// Submits a list request and normalizes its envelope.
    async fn fetch_page<T: DeserializeOwned>(
        &self,
        request: CatalogRequest,
    ) -> Result<PaginatedResult<T>> {
        let page: PageEnvelope<T> = self.fetch(request).await?;
        Ok(PaginatedResult::from(page))
    }
}

impl LocalCatalogApi for JikanClient {
    #[instrument(skip_all)]
    async fn top_anime(&self, filter: TopFilter) -> Result<PaginatedResult<Anime>> {
        let request = CatalogRequest::new("top/anime")
            .param("filter", filter)
            .param("limit", TOP_LIMIT);
        self.fetch_page(request).await
    }

    #[instrument(skip_all)]
    async fn search_anime(&self, query: &str, page: u32) -> Result<PaginatedResult<Anime>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidRequest(String::from(
                "search query must not be blank",
            )));
        }
        let request = CatalogRequest::new("anime")
            .param("q", query)
            .param("page", page)
            .param("limit", PAGE_LIMIT)
            .param("sfw", true);
        self.fetch_page(request).await
    }

    #[instrument(skip_all)]
    async fn anime_details(&self, id: u64) -> Result<Anime> {
        let envelope: Envelope<Anime> = self.fetch(CatalogRequest::new(format!("anime/{id}"))).await?;
        Ok(envelope.data)
    }

    #[instrument(skip_all)]
    async fn anime_characters(&self, id: u64) -> Result<Vec<CharacterEntry>> {
        let request = CatalogRequest::new(format!("anime/{id}/characters"));
        let envelope: PageEnvelope<CharacterEntry> = self.fetch(request).await?;
        Ok(envelope.data)
    }

    #[instrument(skip_all)]
    async fn anime_recommendations(&self, id: u64) -> Result<Vec<Recommendation>> {
        let request = CatalogRequest::new(format!("anime/{id}/recommendations"));
        let envelope: PageEnvelope<Recommendation> = self.fetch(request).await?;
        Ok(envelope.data)
    }

    #[instrument(skip_all)]
    async fn top_by_type(
        &self,
        media_type: MediaType,
        page: u32,
    ) -> Result<PaginatedResult<Anime>> {
        let request = CatalogRequest::new("top/anime")
            .param("type", media_type)
            .param("page", page)
            .param("limit", PAGE_LIMIT);
        self.fetch_page(request).await
    }

    #[instrument(skip_all)]
    async fn genres(&self) -> Result<Vec<Genre>> {
        let envelope: PageEnvelope<Genre> = self.fetch(CatalogRequest::new("genres/anime")).await?;
        Ok(envelope.data)
    }

    #[instrument(skip_all)]
    async fn anime_by_genre(&self, genre_id: u64, page: u32) -> Result<PaginatedResult<Anime>> {
        let request = CatalogRequest::new("anime")
            .param("genres", genre_id)
            .param("page", page)
            .param("limit", PAGE_LIMIT)
            .param("order_by", "score")
            .param("sort", "desc");
        self.fetch_page(request).await
    }
}
