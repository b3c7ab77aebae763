//! Jikan API response types.

use serde::Deserialize;

// --- Envelopes ---

/// Wire envelope for single-record endpoints (`{ "data": ... }`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    /// Payload.
    pub data: T,
}

/// Wire envelope for list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PageEnvelope<T> {
    /// Records on this page.
    pub data: Vec<T>,
    /// Pagination block (absent on non-paginated lists).
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub(crate) struct Pagination {
    /// Whether a further page exists.
    #[serde(default)]
    pub has_next_page: bool,
}

/// Error body returned by the API on non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JikanErrorResponse {
    /// Error category (e.g. `RateLimitException`).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Human readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Additional error detail.
    #[serde(default)]
    pub error: Option<String>,
}

/// A normalized page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResult<T> {
    /// Records in response order.
    pub items: Vec<T>,
    /// Whether the caller can request the next page.
    pub has_next_page: bool,
}

impl<T> From<PageEnvelope<T>> for PaginatedResult<T> {
    fn from(page: PageEnvelope<T>) -> Self {
        Self {
            items: page.data,
            has_next_page: page.pagination.unwrap_or_default().has_next_page,
        }
    }
}

// --- Shared ---

/// Image URLs in one format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct ImageUrls {
    /// Default size.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Small size.
    #[serde(default)]
    pub small_image_url: Option<String>,
    /// Large size.
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// Image set keyed by format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Images {
    /// JPEG variants.
    #[serde(default)]
    pub jpg: ImageUrls,
    /// `WebP` variants.
    #[serde(default)]
    pub webp: ImageUrls,
}

/// A `{ mal_id, type, name, url }` reference (genres, studios, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedResource {
    /// `MyAnimeList` ID.
    pub mal_id: u64,
    /// Resource kind.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Display name.
    pub name: String,
    /// Resource page.
    #[serde(default)]
    pub url: Option<String>,
}

// --- Anime ---

/// A catalog item as returned by list and detail endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Anime {
    /// `MyAnimeList` ID.
    pub mal_id: u64,
    /// Canonical page URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Poster images.
    #[serde(default)]
    pub images: Images,
    /// Default title.
    pub title: String,
    /// English title.
    #[serde(default)]
    pub title_english: Option<String>,
    /// Japanese title.
    #[serde(default)]
    pub title_japanese: Option<String>,
    /// Media type (`TV`, `Movie`, ...).
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    /// Episode count.
    #[serde(default)]
    pub episodes: Option<u32>,
    /// Airing status.
    #[serde(default)]
    pub status: Option<String>,
    /// Whether currently airing.
    #[serde(default)]
    pub airing: bool,
    /// Episode duration text.
    #[serde(default)]
    pub duration: Option<String>,
    /// Audience rating.
    #[serde(default)]
    pub rating: Option<String>,
    /// Average score.
    #[serde(default)]
    pub score: Option<f64>,
    /// Number of users who scored.
    #[serde(default)]
    pub scored_by: Option<u64>,
    /// Score rank.
    #[serde(default)]
    pub rank: Option<u32>,
    /// Popularity rank.
    #[serde(default)]
    pub popularity: Option<u32>,
    /// Synopsis.
    #[serde(default)]
    pub synopsis: Option<String>,
    /// Premiere season.
    #[serde(default)]
    pub season: Option<String>,
    /// Premiere year.
    #[serde(default)]
    pub year: Option<u32>,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<NamedResource>,
    /// Studios.
    #[serde(default)]
    pub studios: Vec<NamedResource>,
}

impl Anime {
    /// English title when present, default title otherwise.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title_english.as_deref().unwrap_or(&self.title)
    }
}

// --- Characters ---

/// A character credited on an item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Character {
    /// `MyAnimeList` ID.
    pub mal_id: u64,
    /// Character page URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Portrait images.
    #[serde(default)]
    pub images: Images,
    /// Character name.
    pub name: String,
}

/// A voice actor for a character.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceActor {
    /// Person reference.
    pub person: Person,
    /// Dub language.
    pub language: String,
}

/// A person reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Person {
    /// `MyAnimeList` ID.
    pub mal_id: u64,
    /// Person name.
    pub name: String,
}

/// Cast entry from `anime/{id}/characters`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharacterEntry {
    /// Character.
    pub character: Character,
    /// `Main` or `Supporting`.
    pub role: String,
    /// Favorites count.
    #[serde(default)]
    pub favorites: Option<u64>,
    /// Voice actors.
    #[serde(default)]
    pub voice_actors: Vec<VoiceActor>,
}

// --- Recommendations ---

/// The item a recommendation points at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecommendedEntry {
    /// `MyAnimeList` ID.
    pub mal_id: u64,
    /// Page URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Poster images.
    #[serde(default)]
    pub images: Images,
    /// Title.
    pub title: String,
}

/// Entry from `anime/{id}/recommendations`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Recommendation {
    /// Recommended item.
    pub entry: RecommendedEntry,
    /// Recommendation page URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Number of users who made the recommendation.
    #[serde(default)]
    pub votes: u32,
}

// --- Genres ---

/// Entry from `genres/anime`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    /// Genre ID (usable as the `genres` filter).
    pub mal_id: u64,
    /// Genre name.
    pub name: String,
    /// Genre page URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Number of titles in the genre.
    #[serde(default)]
    pub count: u64,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn test_parse_anime_details_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/jikan/anime_details_52991.json");

        // Act
        let envelope: Envelope<Anime> = serde_json::from_str(json).unwrap();

        // Assert
        let anime = envelope.data;
        assert_eq!(anime.mal_id, 52_991);
        assert_eq!(anime.title, "Sousou no Frieren");
        assert_eq!(anime.display_title(), "Frieren: Beyond Journey's End");
        assert_eq!(anime.episodes, Some(28));
        assert_eq!(anime.genres.len(), 3);
        assert_eq!(anime.genres[0].name, "Adventure");
        assert!(anime.images.jpg.large_image_url.is_some());
    }

    #[test]
    fn test_parse_search_page_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/jikan/search_frieren.json");

        // Act
        let envelope: PageEnvelope<Anime> = serde_json::from_str(json).unwrap();
        let page = PaginatedResult::from(envelope);

        // Assert
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next_page);
        assert_eq!(page.items[1].mal_id, 56_885);
    }

    #[test]
    fn test_missing_pagination_means_last_page() {
        // Arrange
        let json = r#"{"data":[{"mal_id":1,"title":"Cowboy Bebop"}]}"#;

        // Act
        let envelope: PageEnvelope<Anime> = serde_json::from_str(json).unwrap();
        let page = PaginatedResult::from(envelope);

        // Assert
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_next_page);
        assert_eq!(page.items[0].display_title(), "Cowboy Bebop");
    }

    #[test]
    fn test_parse_characters_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/jikan/anime_characters_52991.json");

        // Act
        let envelope: PageEnvelope<CharacterEntry> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.data[0].character.name, "Frieren");
        assert_eq!(envelope.data[0].role, "Main");
        assert_eq!(envelope.data[0].voice_actors[0].language, "Japanese");
    }

    #[test]
    fn test_parse_recommendations_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/jikan/anime_recommendations_52991.json");

        // Act
        let envelope: PageEnvelope<Recommendation> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.data[0].entry.mal_id, 33_352);
        assert_eq!(envelope.data[0].votes, 21);
    }

    #[test]
    fn test_parse_genres_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/jikan/genres_anime.json");

        // Act
        let envelope: PageEnvelope<Genre> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(envelope.data.len(), 4);
        assert_eq!(envelope.data[0].name, "Action");
        assert_eq!(envelope.data[0].count, 5_112);
    }

    #[test]
    fn test_parse_error_response() {
        // Arrange
        let json = r#"{"status":429,"type":"RateLimitException","message":"You are being rate limited by Jikan or MyAnimeList is rate-limiting our servers (specifically).","error":null}"#;

        // Act
        let error: JikanErrorResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(error.kind.as_deref(), Some("RateLimitException"));
        assert!(error.message.unwrap().contains("rate limited"));
        assert!(error.error.is_none());
    }
}
