use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Genre, Movie, MovieDetails, MovieVideo, SearchPage, SearchParams};

/// Read-only movie metadata source.
///
/// Every call is a single attempt; implementations report non-success responses and
/// undecodable bodies as errors and never retry.
#[async_trait]
pub trait MetadataGateway: Send + Sync {
    async fn search_movies(&self, params: &SearchParams) -> Result<SearchPage>;

    async fn fetch_movies_by_genre(&self, genre_id: i64) -> Result<Vec<Movie>>;

    async fn fetch_trending_movies(&self) -> Result<Vec<Movie>>;

    async fn fetch_popular_movies(&self) -> Result<Vec<Movie>>;

    async fn fetch_now_playing_movies(&self) -> Result<Vec<Movie>>;

    /// `Ok(None)` when the gateway does not know the movie.
    async fn fetch_movie_details(&self, movie_id: i64) -> Result<Option<MovieDetails>>;

    async fn fetch_movie_genres(&self) -> Result<Vec<Genre>>;

    async fn fetch_movie_videos(&self, movie_id: i64) -> Result<Vec<MovieVideo>>;
}
