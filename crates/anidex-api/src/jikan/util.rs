//! Catalog utility functions.

use super::types::Genre;

/// Title count a genre needs to exceed to be listed by default.
pub const DEFAULT_MIN_GENRE_COUNT: u64 = 50;

/// Keeps genres with more than `min_count` titles, largest first.
///
/// Ties keep their input order.
#[must_use]
pub fn popular_genres(genres: &[Genre], min_count: u64) -> Vec<Genre> {
    let mut popular: Vec<Genre> = genres
        .iter()
        .filter(|g| g.count > min_count)
        .cloned()
        .collect();
    popular.sort_by(|a, b| b.count.cmp(&a.count));
    popular
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn load_genres() -> Vec<Genre> {
        let json = include_str!("../../../../fixtures/jikan/genres_anime.json");
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        serde_json::from_value(value["data"].clone()).unwrap()
    }

    #[test]
    fn test_popular_genres_filters_and_sorts() {
        // Arrange
        let genres = load_genres();

        // Act
        let popular = popular_genres(&genres, DEFAULT_MIN_GENRE_COUNT);

        // Assert: 51 titles is enough, 50 is not
        let names: Vec<&str> = popular.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Comedy", "Action", "Award Winning", "Girls Love"]);
        assert_eq!(DEFAULT_MIN_GENRE_COUNT, 50);
    }

    #[test]
    fn test_popular_genres_threshold_is_exclusive() {
        // Arrange
        let genres = load_genres();

        // Act
        let popular = popular_genres(&genres, 271);

        // Assert
        assert_eq!(popular.len(), 2);
        assert!(popular.iter().all(|g| g.count > 271));
    }

    #[test]
    fn test_popular_genres_empty_input() {
        // Arrange & Act
        let popular = popular_genres(&[], 0);

        // Assert
        assert!(popular.is_empty());
    }
}
