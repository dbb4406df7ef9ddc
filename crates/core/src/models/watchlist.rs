use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::Movie;

/// Name of the user document field holding the watchlist array.
pub const WATCHLIST_FIELD: &str = "watchlist";

/// A movie on a user's watchlist.
///
/// Membership is decided by `movie.id` alone, but the remote store removes array
/// elements by value, so the whole entry (timestamp included) is what gets sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    #[serde(flatten)]
    pub movie: Movie,
    pub added_at: String,
}

impl WatchlistEntry {
    /// Stamps `movie` with the current time.
    pub fn now(movie: Movie) -> Self {
        Self {
            movie,
            added_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn id(&self) -> i64 {
        self.movie.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchlistStatus {
    #[default]
    Unloaded,
    Loading,
    Ready,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_flattens_movie_fields() {
        let movie = Movie {
            id: 603,
            title: "The Matrix".to_string(),
            poster_path: Some("https://image.tmdb.org/t/p/w342/p.jpg".to_string()),
            backdrop_path: None,
            release_date: "1999-03-30".to_string(),
            vote_average: 8.2,
            overview: "A hacker learns the truth.".to_string(),
        };
        let entry = WatchlistEntry {
            movie,
            added_at: "2024-05-01T10:00:00.000Z".to_string(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 603);
        assert_eq!(json["addedAt"], "2024-05-01T10:00:00.000Z");
        assert_eq!(json["posterPath"], "https://image.tmdb.org/t/p/w342/p.jpg");

        let back: WatchlistEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_now_stamps_iso_timestamp() {
        let entry = WatchlistEntry::now(Movie {
            id: 1,
            title: "Heat".to_string(),
            poster_path: None,
            backdrop_path: None,
            release_date: String::new(),
            vote_average: 0.0,
            overview: String::new(),
        });
        assert!(entry.added_at.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&entry.added_at).is_ok());
    }
}
