//! `SessionClient` - direct client for the account backend.

use anyhow::{Context, Result as AnyResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::api::LocalSessionApi;
use super::types::{
    AuthResponse, Credentials, ListKind, Profile, RegisterRequest, Session, SessionErrorResponse,
    ToggleRequest, ToggleResponse,
};
use crate::error::{ApiError, Result};

/// Default base URL of the account backend.
const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/users/";

/// How a failed response is reported.
#[derive(Debug, Clone, Copy)]
enum Failure {
    /// Any non-success status is an HTTP failure.
    Public(&'static str),
    /// 401/403 is an authentication failure.
    Protected(&'static str),
}

/// Account backend client.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct SessionClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL, ending in `/`.
    base_url: Url,
}

/// Builder for `SessionClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SessionClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
}

impl SessionClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
        }
    }

    /// Overrides the base URL.
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

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> AnyResult<SessionClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL).context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .build()
            .context("failed to build HTTP client")?;

        Ok(SessionClient {
            http_client,
            base_url,
        })
    }
}

impl SessionClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> SessionClientBuilder {
        SessionClientBuilder::new()
    }

    /// Logs in and fetches the profile in one step.
    ///
    /// # Errors
    ///
    /// Returns the first failing call's error.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let auth = self.login(credentials).await?;
        let profile = self.me(&auth.token).await?;
        Ok(Session::new(auth.token, profile))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("failed to join URL path {path}: {e}")))
    }

    fn require_token(token: &str) -> Result<&str> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::Auth(String::from("missing bearer token")));
        }
        Ok(token)
    }

    /// Sends `request` and decodes a success body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, failure: Failure) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%status, url = %response.url(), "session backend response");

        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::failure(status, &body, failure));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn failure(status: StatusCode, body: &str, failure: Failure) -> ApiError {
        let backend_message = serde_json::from_str::<SessionErrorResponse>(body)
            .ok()
            .and_then(|e| e.message);

        match failure {
            Failure::Protected(fallback)
                if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) =>
            {
                ApiError::Auth(backend_message.unwrap_or_else(|| String::from(fallback)))
            }
            Failure::Protected(fallback) | Failure::Public(fallback) => ApiError::Http {
                status: status.as_u16(),
                message: backend_message.unwrap_or_else(|| String::from(fallback)),
            },
        }
    }
}

impl LocalSessionApi for SessionClient {
    #[instrument(skip_all)]
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let url = self.endpoint("register")?;
        let builder = self.http_client.post(url).json(request);
        self.send(builder, Failure::Public("Registration failed"))
            .await
    }

    #[instrument(skip_all)]
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let url = self.endpoint("login")?;
        let builder = self.http_client.post(url).json(credentials);
        self.send(builder, Failure::Public("Login failed")).await
    }

    #[instrument(skip_all)]
    async fn me(&self, token: &str) -> Result<Profile> {
        let token = Self::require_token(token)?;
        let url = self.endpoint("me")?;
        let builder = self.http_client.get(url).bearer_auth(token);
        self.send(builder, Failure::Protected("Failed to fetch profile"))
            .await
    }

    #[instrument(skip_all, fields(list = %kind))]
    async fn toggle(&self, token: &str, kind: ListKind, anime_id: &str) -> Result<ToggleResponse> {
        let token = Self::require_token(token)?;
        let url = self.endpoint("toggle")?;
        let body = ToggleRequest {
            list_type: kind,
            anime_id,
        };
        let builder = self.http_client.post(url).bearer_auth(token).json(&body);
        let response = self
            .send(builder, Failure::Protected("Failed to update list"))
            .await?;
        tracing::info!(anime_id, "list membership toggled");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn client_for(server: &wiremock::MockServer) -> SessionClient {
        let base_url = format!("{}/api/users/", server.uri());
        SessionClient::builder()
            .base_url(base_url.parse().unwrap())
            .user_agent("test/0.0.0")
            .build()
            .unwrap()
    }

    fn credentials() -> Credentials {
        Credentials {
            email: String::from("himmel@example.com"),
            password: String::from("hero"),
        }
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = SessionClient::builder().build();

        // Assert
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/session/login.json");
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/api/users/login"))
            .and(wiremock::matchers::body_json(serde_json::json!({
                "email": "himmel@example.com",
                "password": "hero",
            })))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);

        // Act
        let auth = client.login(&credentials()).await.unwrap();

        // Assert
        assert_eq!(auth.token, "eyJhbGciOiJIUzI1NiJ9.test.signature");
        assert_eq!(auth.username, "himmel");
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_backend_message() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(400)
                    .set_body_string(r#"{"message":"Invalid credentials"}"#),
            )
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);

        // Act
        let result = client.login(&credentials()).await;

        // Assert
        assert_eq!(
            result.unwrap_err(),
            ApiError::Http {
                status: 400,
                message: String::from("Invalid credentials"),
            }
        );
    }

    #[tokio::test]
    async fn test_register_failure_uses_generic_message() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/api/users/register"))
            .respond_with(wiremock::ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);
        let request = RegisterRequest {
            username: String::from("himmel"),
            email: String::from("himmel@example.com"),
            password: String::from("hero"),
        };

        // Act
        let result = client.register(&request).await;

        // Assert
        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("Registration failed"));
    }

    #[tokio::test]
    async fn test_me_sends_bearer_token() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/session/me.json");
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/users/me"))
            .and(wiremock::matchers::header(
                "Authorization",
                "Bearer secret-token",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);

        // Act
        let profile = client.me("secret-token").await.unwrap();

        // Assert
        assert_eq!(profile.email, "himmel@example.com");
        assert_eq!(profile.watchlist.len(), 2);
    }

    #[tokio::test]
    async fn test_me_rejected_token_is_auth_failure() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(401)
                    .set_body_string(r#"{"message":"Not authorized, token failed"}"#),
            )
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);

        // Act
        let result = client.me("expired").await;

        // Assert
        let err = result.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(
            err,
            ApiError::Auth(String::from("Not authorized, token failed"))
        );
    }

    #[tokio::test]
    async fn test_blank_token_is_rejected_without_request() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(wiremock::ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);

        // Act
        let me = client.me("  ").await;
        let toggle = client.toggle("", ListKind::Watchlist, "52991").await;

        // Assert
        assert!(me.unwrap_err().is_auth());
        assert!(toggle.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_toggle_posts_list_and_id() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/api/users/toggle"))
            .and(wiremock::matchers::header(
                "Authorization",
                "Bearer secret-token",
            ))
            .and(wiremock::matchers::body_json(serde_json::json!({
                "listType": "bookmarks",
                "animeId": "52991",
            })))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                r#"{"message":"List updated","bookmarks":["52991"]}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);

        // Act
        let response = client
            .toggle("secret-token", ListKind::Bookmarks, "52991")
            .await
            .unwrap();

        // Assert
        assert_eq!(response.message.as_deref(), Some("List updated"));
        assert!(response.extra.contains_key("bookmarks"));
    }

    #[tokio::test]
    async fn test_toggle_server_error_uses_generic_message() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(500).set_body_string("{}"))
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);

        // Act
        let result = client
            .toggle("secret-token", ListKind::Favorites, "1")
            .await;

        // Assert
        assert_eq!(
            result.unwrap_err(),
            ApiError::Http {
                status: 500,
                message: String::from("Failed to update list"),
            }
        );
    }

    #[tokio::test]
    async fn test_sign_in_builds_session() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/api/users/login"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/session/login.json"
            )))
            .mount(&mock_server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/users/me"))
            .and(wiremock::matchers::header(
                "Authorization",
                "Bearer eyJhbGciOiJIUzI1NiJ9.test.signature",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/session/me.json"
            )))
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);

        // Act
        let session = client.sign_in(&credentials()).await.unwrap();

        // Assert
        assert_eq!(session.token, "eyJhbGciOiJIUzI1NiJ9.test.signature");
        assert!(session.membership("33352").watchlist);
    }
}
