//! Session backend request/response types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// One of the three personal lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Titles to watch later.
    Watchlist,
    /// Favorite titles.
    Favorites,
    /// Bookmarked titles.
    Bookmarks,
}

impl ListKind {
    /// All list kinds, in display order.
    pub const ALL: [Self; 3] = [Self::Watchlist, Self::Favorites, Self::Bookmarks];

    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Watchlist => "watchlist",
            Self::Favorites => "favorites",
            Self::Bookmarks => "bookmarks",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown list name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown list {0:?} (expected watchlist, favorites or bookmarks)")]
pub struct ParseListKindError(String);

impl FromStr for ListKind {
    type Err = ParseListKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseListKindError(String::from(s)))
    }
}

/// Body of `POST register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Display name.
    pub username: String,
    /// Login email.
    pub email: String,
    /// Plain password, sent over the backend's transport.
    pub password: String,
}

/// Body of `POST login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Plain password.
    pub password: String,
}

/// Token issued by `register` and `login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for protected calls.
    pub token: String,
    /// Display name.
    pub username: String,
    /// Login email.
    pub email: String,
}

/// Profile returned by `GET me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// Display name.
    pub username: String,
    /// Login email.
    pub email: String,
    /// Watchlist ids, in backend order.
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub watchlist: Vec<String>,
    /// Favorite ids.
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub favorites: Vec<String>,
    /// Bookmarked ids.
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub bookmarks: Vec<String>,
}

impl Profile {
    /// Ids stored in `kind`.
    #[must_use]
    pub fn list(&self, kind: ListKind) -> &[String] {
        match kind {
            ListKind::Watchlist => &self.watchlist,
            ListKind::Favorites => &self.favorites,
            ListKind::Bookmarks => &self.bookmarks,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<String> {
        match kind {
            ListKind::Watchlist => &mut self.watchlist,
            ListKind::Favorites => &mut self.favorites,
            ListKind::Bookmarks => &mut self.bookmarks,
        }
    }
}

/// Item ids arrive as strings or integers depending on how they were stored.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(u64),
}

fn deserialize_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Option::<Vec<WireId>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(ids
        .into_iter()
        .map(|id| match id {
            WireId::Text(text) => text,
            WireId::Number(number) => number.to_string(),
        })
        .collect())
}

/// Membership flags of one item, for a detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Membership {
    /// Present in the watchlist.
    pub watchlist: bool,
    /// Present in favorites.
    pub favorite: bool,
    /// Present in bookmarks.
    pub bookmarked: bool,
}

impl Membership {
    /// Flag for `kind`.
    #[must_use]
    pub const fn contains(&self, kind: ListKind) -> bool {
        match kind {
            ListKind::Watchlist => self.watchlist,
            ListKind::Favorites => self.favorite,
            ListKind::Bookmarks => self.bookmarked,
        }
    }
}

/// Logged-in user state held by the caller.
///
/// The client never stores it; callers pass `token` into protected calls
/// and update the lists optimistically after a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    /// Profile and list memberships.
    pub profile: Profile,
}

impl Session {
    /// Creates a session from an issued token and the fetched profile.
    #[must_use]
    pub fn new(token: impl Into<String>, profile: Profile) -> Self {
        Self {
            token: token.into(),
            profile,
        }
    }

    /// Membership flags of `anime_id`.
    #[must_use]
    pub fn membership(&self, anime_id: &str) -> Membership {
        let has = |kind| self.profile.list(kind).iter().any(|id| id == anime_id);
        Membership {
            watchlist: has(ListKind::Watchlist),
            favorite: has(ListKind::Favorites),
            bookmarked: has(ListKind::Bookmarks),
        }
    }

    /// Flips `anime_id` in `kind` locally and returns whether it is now present.
    pub fn apply_toggle(&mut self, kind: ListKind, anime_id: &str) -> bool {
        let list = self.profile.list_mut(kind);
        if let Some(pos) = list.iter().position(|id| id == anime_id) {
            list.remove(pos);
            false
        } else {
            list.push(String::from(anime_id));
            true
        }
    }
}

/// Body of `POST toggle`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ToggleRequest<'a> {
    /// Target list.
    #[serde(rename = "listType")]
    pub list_type: ListKind,
    /// Item id.
    #[serde(rename = "animeId")]
    pub anime_id: &'a str,
}

/// Status body returned by `POST toggle`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToggleResponse {
    /// Backend status message.
    #[serde(default)]
    pub message: Option<String>,
    /// Remaining fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Error body of the session backend.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionErrorResponse {
    /// Human readable message.
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn sample_session() -> Session {
        let json = include_str!("../../../../fixtures/session/me.json");
        Session::new("token", serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_list_kind_from_str() {
        // Arrange & Act & Assert
        assert_eq!("watchlist".parse::<ListKind>(), Ok(ListKind::Watchlist));
        assert_eq!(" Favorites ".parse::<ListKind>(), Ok(ListKind::Favorites));
        assert_eq!("bookmarks".parse::<ListKind>(), Ok(ListKind::Bookmarks));
        assert!("later".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_parse_profile_with_mixed_ids() {
        // Arrange
        let json = include_str!("../../../../fixtures/session/me.json");

        // Act
        let profile: Profile = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(profile.username, "himmel");
        assert_eq!(profile.watchlist, vec!["52991", "33352"]);
        assert_eq!(profile.favorites, vec!["5114"]);
        assert!(profile.bookmarks.is_empty());
    }

    #[test]
    fn test_parse_profile_without_lists() {
        // Arrange
        let json = r#"{"username":"frieren","email":"f@example.com","bookmarks":null}"#;

        // Act
        let profile: Profile = serde_json::from_str(json).unwrap();

        // Assert
        assert!(profile.watchlist.is_empty());
        assert!(profile.bookmarks.is_empty());
    }

    #[test]
    fn test_membership_flags() {
        // Arrange
        let session = sample_session();

        // Act
        let frieren = session.membership("52991");
        let fmab = session.membership("5114");
        let unknown = session.membership("1");

        // Assert
        assert!(frieren.watchlist);
        assert!(!frieren.favorite);
        assert!(fmab.contains(ListKind::Favorites));
        assert_eq!(unknown, Membership::default());
    }

    #[test]
    fn test_apply_toggle_flips_membership() {
        // Arrange
        let mut session = sample_session();

        // Act
        let added = session.apply_toggle(ListKind::Bookmarks, "52991");
        let removed = session.apply_toggle(ListKind::Watchlist, "52991");

        // Assert
        assert!(added);
        assert!(!removed);
        let membership = session.membership("52991");
        assert!(membership.bookmarked);
        assert!(!membership.watchlist);
        assert_eq!(session.profile.watchlist, vec!["33352"]);
    }

    #[test]
    fn test_toggle_request_wire_shape() {
        // Arrange
        let body = ToggleRequest {
            list_type: ListKind::Favorites,
            anime_id: "52991",
        };

        // Act
        let json = serde_json::to_value(&body).unwrap();

        // Assert
        assert_eq!(
            json,
            serde_json::json!({ "listType": "favorites", "animeId": "52991" })
        );
    }
}
