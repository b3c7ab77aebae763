//! `CatalogApi` trait definition.
#![allow(clippy::future_not_send)]

use super::params::{MediaType, TopFilter};
use super::types::{Anime, CharacterEntry, Genre, PaginatedResult, Recommendation};
use crate::error::Result;

/// Anime catalog API trait.
///
/// Abstracts catalog queries for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(CatalogApi: Send)]
pub trait LocalCatalogApi {
    /// Fetches the top list for `filter` (10 entries).
    ///
    /// # Errors
    ///
    /// Returns the dispatcher failure or a decode error.
    async fn top_anime(&self, filter: TopFilter) -> Result<PaginatedResult<Anime>>;

    /// Searches titles by free text (24 per page, safe-for-work only).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`](crate::ApiError::InvalidRequest)
    /// for a blank query, otherwise the dispatcher failure or a decode error.
    async fn search_anime(&self, query: &str, page: u32) -> Result<PaginatedResult<Anime>>;

    /// Fetches a single item.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher failure or a decode error.
    async fn anime_details(&self, id: u64) -> Result<Anime>;

    /// Fetches the cast of an item.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher failure or a decode error.
    async fn anime_characters(&self, id: u64) -> Result<Vec<CharacterEntry>>;

    /// Fetches user recommendations for an item.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher failure or a decode error.
    async fn anime_recommendations(&self, id: u64) -> Result<Vec<Recommendation>>;

    /// Fetches one page of the top list restricted to `media_type`.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher failure or a decode error.
    async fn top_by_type(&self, media_type: MediaType, page: u32)
    -> Result<PaginatedResult<Anime>>;

    /// Lists all genres.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher failure or a decode error.
    async fn genres(&self) -> Result<Vec<Genre>>;

    /// Fetches one page of a genre, best scored first.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher failure or a decode error.
    async fn anime_by_genre(&self, genre_id: u64, page: u32) -> Result<PaginatedResult<Anime>>;
}
