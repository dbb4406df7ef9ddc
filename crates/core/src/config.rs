use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tmdb_api_key: String,

    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Web API key of the Firebase project backing accounts and watchlists.
    #[serde(default)]
    pub firebase_api_key: Option<String>,

    #[serde(default)]
    pub firebase_project_id: Option<String>,

    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// The only video host the trailer player can embed.
    #[serde(default = "default_trailer_host")]
    pub trailer_host: String,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_search_debounce_ms() -> u64 {
    500
}

fn default_trailer_host() -> String {
    "youtube".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        envy::from_env::<Config>().map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Builds a config from explicit key/value pairs, using the same defaults as [`Config::from_env`].
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(pairs).map_err(|e| Error::Configuration(e.to_string()))
    }

    pub fn search_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.search_debounce_ms)
    }

    /// Firebase settings, present only when both the API key and project id are configured.
    pub fn firebase(&self) -> Option<(&str, &str)> {
        match (&self.firebase_api_key, &self.firebase_project_id) {
            (Some(key), Some(project)) if !key.is_empty() && !project.is_empty() => {
                Some((key.as_str(), project.as_str()))
            }
            _ => None,
        }
    }
}
