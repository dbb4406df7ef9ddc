//! Test helpers: a scripted metadata gateway and movie fixtures

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::{Genre, Movie, MovieDetails, MovieVideo, SearchPage, SearchParams};
use crate::services::gateway::MetadataGateway;

type SearchFn = Box<dyn Fn(&SearchParams) -> Result<SearchPage> + Send + Sync>;
type DelayFn = Box<dyn Fn(&SearchParams) -> Duration + Send + Sync>;

/// In-memory gateway whose responses are scripted per test.
pub struct FakeGateway {
    search: SearchFn,
    search_delay: DelayFn,
    search_calls: Mutex<Vec<SearchParams>>,
    videos: Option<Vec<MovieVideo>>,
    video_calls: Mutex<Vec<i64>>,
    details: Option<MovieDetails>,
    lists: Option<Vec<Movie>>,
    genres: Vec<Genre>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGateway {
    /// Three pages of two movies each for any query; movie ids are `page * 100 + n`.
    pub fn new() -> Self {
        Self {
            search: Box::new(|params| Ok(fixtures::page(params.page, 2, 3))),
            search_delay: Box::new(|_| Duration::ZERO),
            search_calls: Mutex::new(Vec::new()),
            videos: Some(Vec::new()),
            video_calls: Mutex::new(Vec::new()),
            details: None,
            lists: Some(vec![fixtures::movie(1, "Dune"), fixtures::movie(2, "Arrival")]),
            genres: vec![
                Genre {
                    id: 28,
                    name: "Action".to_string(),
                },
                Genre {
                    id: 18,
                    name: "Drama".to_string(),
                },
            ],
        }
    }

    pub fn with_search<F>(mut self, search: F) -> Self
    where
        F: Fn(&SearchParams) -> Result<SearchPage> + Send + Sync + 'static,
    {
        self.search = Box::new(search);
        self
    }

    pub fn with_search_delay<F>(mut self, delay: F) -> Self
    where
        F: Fn(&SearchParams) -> Duration + Send + Sync + 'static,
    {
        self.search_delay = Box::new(delay);
        self
    }

    pub fn with_videos(mut self, videos: Vec<MovieVideo>) -> Self {
        self.videos = Some(videos);
        self
    }

    pub fn with_details(mut self, details: MovieDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Video, detail and list endpoints all fail.
    pub fn failing(mut self) -> Self {
        self.videos = None;
        self.lists = None;
        self
    }

    pub fn search_calls(&self) -> Vec<SearchParams> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn search_call_count(&self) -> usize {
        self.search_calls.lock().unwrap().len()
    }

    pub fn video_call_count(&self) -> usize {
        self.video_calls.lock().unwrap().len()
    }

    fn list(&self) -> Result<Vec<Movie>> {
        self.lists
            .clone()
            .ok_or_else(|| Error::ExternalApi("TMDB API error: 500".to_string()))
    }
}

#[async_trait]
impl MetadataGateway for FakeGateway {
    async fn search_movies(&self, params: &SearchParams) -> Result<SearchPage> {
        self.search_calls.lock().unwrap().push(params.clone());
        let delay = (self.search_delay)(params);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        (self.search)(params)
    }

    async fn fetch_movies_by_genre(&self, _genre_id: i64) -> Result<Vec<Movie>> {
        self.list()
    }

    async fn fetch_trending_movies(&self) -> Result<Vec<Movie>> {
        self.list()
    }

    async fn fetch_popular_movies(&self) -> Result<Vec<Movie>> {
        self.list()
    }

    async fn fetch_now_playing_movies(&self) -> Result<Vec<Movie>> {
        self.list()
    }

    async fn fetch_movie_details(&self, movie_id: i64) -> Result<Option<MovieDetails>> {
        if self.lists.is_none() {
            return Err(Error::ExternalApi("TMDB API error: 500".to_string()));
        }
        Ok(self.details.clone().filter(|d| d.movie.id == movie_id))
    }

    async fn fetch_movie_genres(&self) -> Result<Vec<Genre>> {
        self.list()?;
        Ok(self.genres.clone())
    }

    async fn fetch_movie_videos(&self, movie_id: i64) -> Result<Vec<MovieVideo>> {
        self.video_calls.lock().unwrap().push(movie_id);
        self.videos
            .clone()
            .ok_or_else(|| Error::ExternalApi("connection reset".to_string()))
    }
}

/// Test fixtures for common test data
pub mod fixtures {
    use crate::models::{Movie, MovieDetails, MovieVideo, SearchPage};

    pub fn movie(id: i64, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            poster_path: Some(format!("https://image.tmdb.org/t/p/w342/{}.jpg", id)),
            backdrop_path: None,
            release_date: "2021-10-22".to_string(),
            vote_average: 7.8,
            overview: format!("Overview of {}", title),
        }
    }

    pub fn details(id: i64, title: &str) -> MovieDetails {
        MovieDetails {
            movie: movie(id, title),
            runtime: Some(155),
            genres: vec!["Science Fiction".to_string(), "Adventure".to_string()],
            tagline: None,
            status: Some("Released".to_string()),
            budget: None,
            revenue: None,
        }
    }

    /// `per_page` movies with ids `page * 100 + n`.
    pub fn page(page: u32, per_page: usize, total_pages: u32) -> SearchPage {
        let movies = (1..=per_page)
            .map(|n| {
                let id = i64::from(page) * 100 + n as i64;
                movie(id, &format!("Movie {}", id))
            })
            .collect();

        SearchPage {
            movies,
            total_pages,
            total_results: total_pages * per_page as u32,
        }
    }

    pub fn video(key: &str, video_type: &str, official: bool, site: &str) -> MovieVideo {
        MovieVideo {
            id: format!("v-{}", key),
            key: key.to_string(),
            name: format!("{} {}", video_type, key),
            site: site.to_string(),
            video_type: video_type.to_string(),
            official,
            published_at: "2021-07-22T15:59:47.000Z".to_string(),
        }
    }
}
