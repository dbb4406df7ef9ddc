use std::sync::Arc;

use crate::error::Result;
use crate::models::{Genre, Movie};
use crate::services::gateway::MetadataGateway;

/// Lists shown on the home screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeFeed {
    pub trending: Vec<Movie>,
    pub popular: Vec<Movie>,
    pub now_playing: Vec<Movie>,
}

/// Home and explore lists. A failed list reads as an empty one.
pub struct BrowseService {
    gateway: Arc<dyn MetadataGateway>,
}

fn or_empty<T>(result: Result<Vec<T>>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Error fetching {}", what);
        Vec::new()
    })
}

impl BrowseService {
    pub fn new(gateway: Arc<dyn MetadataGateway>) -> Self {
        Self { gateway }
    }

    pub async fn trending(&self) -> Vec<Movie> {
        or_empty(self.gateway.fetch_trending_movies().await, "trending movies")
    }

    pub async fn popular(&self) -> Vec<Movie> {
        or_empty(self.gateway.fetch_popular_movies().await, "popular movies")
    }

    pub async fn now_playing(&self) -> Vec<Movie> {
        or_empty(
            self.gateway.fetch_now_playing_movies().await,
            "now playing movies",
        )
    }

    pub async fn genres(&self) -> Vec<Genre> {
        or_empty(self.gateway.fetch_movie_genres().await, "movie genres")
    }

    pub async fn by_genre(&self, genre_id: i64) -> Vec<Movie> {
        or_empty(
            self.gateway.fetch_movies_by_genre(genre_id).await,
            &format!("movies for genre {}", genre_id),
        )
    }

    /// Fetches the three home lists concurrently.
    pub async fn home_feed(&self) -> HomeFeed {
        let (trending, popular, now_playing) =
            futures::join!(self.trending(), self.popular(), self.now_playing());

        HomeFeed {
            trending,
            popular,
            now_playing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FakeGateway;

    #[tokio::test]
    async fn test_home_feed_collects_lists() {
        let service = BrowseService::new(Arc::new(FakeGateway::new()));

        let feed = service.home_feed().await;

        assert_eq!(feed.trending.len(), 2);
        assert_eq!(feed.popular.len(), 2);
        assert_eq!(feed.now_playing[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_failures_read_as_empty_lists() {
        let service = BrowseService::new(Arc::new(FakeGateway::new().failing()));

        assert_eq!(service.home_feed().await, HomeFeed::default());
        assert!(service.genres().await.is_empty());
        assert!(service.by_genre(28).await.is_empty());
    }

    #[tokio::test]
    async fn test_genres() {
        let service = BrowseService::new(Arc::new(FakeGateway::new()));

        let names: Vec<String> = service.genres().await.into_iter().map(|g| g.name).collect();

        assert_eq!(names, vec!["Action", "Drama"]);
    }
}
