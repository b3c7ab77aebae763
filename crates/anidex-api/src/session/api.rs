//! `SessionApi` trait definition.
#![allow(clippy::future_not_send)]

use super::types::{AuthResponse, Credentials, ListKind, Profile, RegisterRequest, ToggleResponse};
use crate::error::Result;

/// Session backend API trait.
///
/// Calls are sent directly, outside the catalog dispatcher.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(SessionApi: Send)]
pub trait LocalSessionApi {
    /// Creates an account and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`](crate::ApiError::Http) with the backend
    /// message, or a transport failure.
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;

    /// Validates credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`](crate::ApiError::Http) with the backend
    /// message, or a transport failure.
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;

    /// Fetches the profile behind `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Auth`](crate::ApiError::Auth) for a blank or
    /// rejected token.
    async fn me(&self, token: &str) -> Result<Profile>;

    /// Flips membership of `anime_id` in the `kind` list server-side.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Auth`](crate::ApiError::Auth) for a blank or
    /// rejected token, [`ApiError::Http`](crate::ApiError::Http) otherwise.
    async fn toggle(&self, token: &str, kind: ListKind, anime_id: &str) -> Result<ToggleResponse>;
}
