use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use urlencoding;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Genre, Movie, MovieDetails, MovieVideo, SearchPage, SearchParams};
use crate::services::gateway::MetadataGateway;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Poster,
    Backdrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Small,
    Medium,
    Large,
}

impl ImageSize {
    fn segment(self, kind: ImageKind) -> &'static str {
        match (kind, self) {
            (ImageKind::Poster, ImageSize::Small) => "w185",
            (ImageKind::Poster, ImageSize::Medium) => "w342",
            (ImageKind::Poster, ImageSize::Large) => "w500",
            (ImageKind::Backdrop, ImageSize::Small) => "w300",
            (ImageKind::Backdrop, ImageSize::Medium) => "w780",
            (ImageKind::Backdrop, ImageSize::Large) => "w1280",
        }
    }
}

pub struct TmdbService {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    image_base_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbListResult {
    pub results: Vec<TmdbMovie>,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TmdbMovie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TmdbMovieDetails {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub status: Option<String>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub genres: Option<Vec<TmdbGenre>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbGenreList {
    genres: Vec<TmdbGenre>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideoList {
    results: Vec<MovieVideo>,
}

impl TmdbService {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: TMDB_BASE_URL.to_string(),
            image_base_url: TMDB_IMAGE_BASE_URL.to_string(),
            language: "en-US".to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.tmdb_api_key.clone(),
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            image_base_url: config.tmdb_image_base_url.trim_end_matches('/').to_string(),
            language: config.tmdb_language.clone(),
        }
    }

    /// Full URL for an image path at the given size.
    pub fn image_url(&self, path: &str, kind: ImageKind, size: ImageSize) -> String {
        format!("{}/{}{}", self.image_base_url, size.segment(kind), path)
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!(
            "{}{}?api_key={}&language={}",
            self.base_url,
            path,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.language)
        );
        for (key, value) in params {
            url.push_str(&format!("&{}={}", key, urlencoding::encode(value)));
        }
        url
    }

    /// URL of the advanced search request. Only set facets become parameters.
    pub fn search_url(&self, params: &SearchParams) -> String {
        let mut query = vec![
            ("include_adult", "false".to_string()),
            ("page", params.page.max(1).to_string()),
            ("query", params.query.clone()),
            ("sort_by", params.sort.as_param().to_string()),
        ];
        query.extend(params.filters.query_pairs());
        self.url("/search/movie", &query)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(path = %url.split('?').next().unwrap_or_default(), "TMDB request");

        let response = self
            .client
            .get(url)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }

        if !response.status().is_success() {
            return Err(Error::ExternalApi(format!(
                "TMDB API error: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_list(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<Movie>> {
        let result: TmdbListResult = self.get_json(&self.url(path, params)).await?;
        Ok(self.transform_movies(result.results))
    }

    /// Maps list results to [`Movie`], using medium-size image URLs.
    pub fn transform_movies(&self, movies: Vec<TmdbMovie>) -> Vec<Movie> {
        movies
            .into_iter()
            .map(|movie| Movie {
                id: movie.id,
                title: movie.title,
                poster_path: movie
                    .poster_path
                    .map(|p| self.image_url(&p, ImageKind::Poster, ImageSize::Medium)),
                backdrop_path: movie
                    .backdrop_path
                    .map(|p| self.image_url(&p, ImageKind::Backdrop, ImageSize::Medium)),
                release_date: movie.release_date.unwrap_or_default(),
                vote_average: movie.vote_average.unwrap_or_default(),
                overview: movie.overview.unwrap_or_default(),
            })
            .collect()
    }

    /// Maps the detail response, using large-size image URLs.
    pub fn transform_details(&self, details: TmdbMovieDetails) -> MovieDetails {
        MovieDetails {
            movie: Movie {
                id: details.id,
                title: details.title,
                poster_path: details
                    .poster_path
                    .map(|p| self.image_url(&p, ImageKind::Poster, ImageSize::Large)),
                backdrop_path: details
                    .backdrop_path
                    .map(|p| self.image_url(&p, ImageKind::Backdrop, ImageSize::Large)),
                release_date: details.release_date.unwrap_or_default(),
                vote_average: details.vote_average.unwrap_or_default(),
                overview: details.overview.unwrap_or_default(),
            },
            runtime: details.runtime,
            genres: details
                .genres
                .unwrap_or_default()
                .into_iter()
                .map(|g| g.name)
                .collect(),
            tagline: details.tagline.filter(|t| !t.is_empty()),
            status: details.status,
            budget: details.budget,
            revenue: details.revenue,
        }
    }
}

#[async_trait]
impl MetadataGateway for TmdbService {
    async fn search_movies(&self, params: &SearchParams) -> Result<SearchPage> {
        let result: TmdbListResult = self.get_json(&self.search_url(params)).await?;

        Ok(SearchPage {
            movies: self.transform_movies(result.results),
            total_pages: result.total_pages,
            total_results: result.total_results,
        })
    }

    async fn fetch_movies_by_genre(&self, genre_id: i64) -> Result<Vec<Movie>> {
        self.fetch_list(
            "/discover/movie",
            &[
                ("with_genres", genre_id.to_string()),
                ("page", "1".to_string()),
                ("sort_by", "popularity.desc".to_string()),
            ],
        )
        .await
    }

    async fn fetch_trending_movies(&self) -> Result<Vec<Movie>> {
        self.fetch_list("/trending/movie/day", &[]).await
    }

    async fn fetch_popular_movies(&self) -> Result<Vec<Movie>> {
        self.fetch_list("/movie/popular", &[("page", "1".to_string())])
            .await
    }

    async fn fetch_now_playing_movies(&self) -> Result<Vec<Movie>> {
        self.fetch_list("/movie/now_playing", &[("page", "1".to_string())])
            .await
    }

    async fn fetch_movie_details(&self, movie_id: i64) -> Result<Option<MovieDetails>> {
        let url = self.url(&format!("/movie/{}", movie_id), &[]);

        match self.get_json::<TmdbMovieDetails>(&url).await {
            Ok(details) => Ok(Some(self.transform_details(details))),
            Err(Error::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_movie_genres(&self) -> Result<Vec<Genre>> {
        let list: TmdbGenreList = self.get_json(&self.url("/genre/movie/list", &[])).await?;

        Ok(list
            .genres
            .into_iter()
            .map(|g| Genre {
                id: g.id,
                name: g.name,
            })
            .collect())
    }

    async fn fetch_movie_videos(&self, movie_id: i64) -> Result<Vec<MovieVideo>> {
        let url = self.url(&format!("/movie/{}/videos", movie_id), &[]);
        let list: TmdbVideoList = self.get_json(&url).await?;
        Ok(list.results)
    }
}
