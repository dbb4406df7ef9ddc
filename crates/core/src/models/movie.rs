use serde::{Deserialize, Serialize};

/// A movie as shown in lists and stored in watchlists.
///
/// Image paths are full URLs; the serialized shape uses camelCase keys because
/// that is what watchlist documents hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    /// `YYYY-MM-DD`, empty for unreleased titles.
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: String,
}

impl Movie {
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .split('-')
            .next()
            .filter(|year| !year.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    pub runtime: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
}

impl MovieDetails {
    /// Runtime as `"2h 19m"`.
    pub fn formatted_runtime(&self) -> Option<String> {
        self.runtime
            .filter(|minutes| *minutes > 0)
            .map(|minutes| format!("{}h {}m", minutes / 60, minutes % 60))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// One entry of a movie's video listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieVideo {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub published_at: String,
}

/// A playable video: the host's key plus the host it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    pub key: String,
    pub site: String,
}

impl From<&MovieVideo> for VideoRef {
    fn from(video: &MovieVideo) -> Self {
        Self {
            key: video.key.clone(),
            site: video.site.clone(),
        }
    }
}

impl VideoRef {
    /// Autoplaying player URL for the hosts TMDB lists videos from.
    pub fn embed_url(&self) -> Option<String> {
        match self.site.to_ascii_lowercase().as_str() {
            "youtube" => Some(format!(
                "https://www.youtube.com/embed/{}?autoplay=1",
                self.key
            )),
            "vimeo" => Some(format!(
                "https://player.vimeo.com/video/{}?autoplay=1",
                self.key
            )),
            _ => None,
        }
    }
}
