//! Jikan API request descriptors and query parameter types.

use std::fmt;

/// Number of entries requested for top lists.
pub const TOP_LIMIT: u32 = 10;

/// Number of entries requested for paginated listings.
pub const PAGE_LIMIT: u32 = 24;

/// Opaque request descriptor queued by the dispatcher.
///
/// Holds a path relative to the API base URL and the query parameters
/// in the order they are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    /// Path relative to the base URL (no leading slash).
    pub path: String,
    /// Query parameters.
    pub query: Vec<(&'static str, String)>,
}

impl CatalogRequest {
    /// Creates a request for `path` with no query parameters.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Looks up the first value for `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for CatalogRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// `filter` parameter for `top/anime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopFilter {
    /// Currently airing.
    #[default]
    Airing,
    /// Announced, not yet aired.
    Upcoming,
    /// Ranked by popularity.
    ByPopularity,
    /// Ranked by favorites.
    Favorite,
}

impl TopFilter {
    /// Wire spelling of the filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Airing => "airing",
            Self::Upcoming => "upcoming",
            Self::ByPopularity => "bypopularity",
            Self::Favorite => "favorite",
        }
    }
}

impl fmt::Display for TopFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `type` parameter for type-filtered listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// TV series.
    Tv,
    /// Theatrical movies.
    Movie,
    /// Original video animation.
    Ova,
    /// Specials.
    Special,
    /// Original net animation.
    Ona,
}

impl MediaType {
    /// Wire spelling of the media type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tv => "tv",
            Self::Movie => "movie",
            Self::Ova => "ova",
            Self::Special => "special",
            Self::Ona => "ona",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
