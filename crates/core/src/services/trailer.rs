use std::sync::Arc;

use crate::error::Result;
use crate::models::{MovieVideo, VideoRef};
use crate::services::gateway::MetadataGateway;

/// The player can only embed videos from this host.
pub const DEFAULT_TRAILER_HOST: &str = "youtube";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailerResolution {
    Playable(VideoRef),
    /// A candidate exists but lives on a host the player cannot embed.
    Unsuitable(MovieVideo),
    NotFound,
}

impl TrailerResolution {
    pub fn playable(&self) -> Option<&VideoRef> {
        match self {
            TrailerResolution::Playable(video) => Some(video),
            _ => None,
        }
    }
}

/// Picks the video to offer as "the trailer": an official trailer, else any
/// trailer, else whatever comes first.
pub fn select_best_trailer(videos: &[MovieVideo]) -> Option<&MovieVideo> {
    videos
        .iter()
        .find(|v| v.video_type == "Trailer" && v.official)
        .or_else(|| videos.iter().find(|v| v.video_type == "Trailer"))
        .or_else(|| videos.first())
}

pub struct TrailerResolver {
    gateway: Arc<dyn MetadataGateway>,
    host: String,
}

impl TrailerResolver {
    pub fn new(gateway: Arc<dyn MetadataGateway>) -> Self {
        Self::with_host(gateway, DEFAULT_TRAILER_HOST)
    }

    pub fn with_host(gateway: Arc<dyn MetadataGateway>, host: impl Into<String>) -> Self {
        Self {
            gateway,
            host: host.into(),
        }
    }

    pub async fn try_resolve(&self, movie_id: i64) -> Result<TrailerResolution> {
        let videos = self.gateway.fetch_movie_videos(movie_id).await?;

        Ok(match select_best_trailer(&videos) {
            Some(video) if video.site.eq_ignore_ascii_case(&self.host) => {
                TrailerResolution::Playable(video.into())
            }
            Some(video) => TrailerResolution::Unsuitable(video.clone()),
            None => TrailerResolution::NotFound,
        })
    }

    /// Like [`try_resolve`](Self::try_resolve), but a failed fetch reads as no trailer.
    pub async fn resolve(&self, movie_id: i64) -> TrailerResolution {
        match self.try_resolve(movie_id).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::error!(movie_id, error = %e, "Error getting movie videos");
                TrailerResolution::NotFound
            }
        }
    }
}

/// Trailer state of a movie detail view.
pub struct TrailerPlayer {
    resolver: Arc<TrailerResolver>,
    movie_id: Option<i64>,
    video_key: String,
    visible: bool,
    loading: bool,
}

impl TrailerPlayer {
    pub fn new(resolver: Arc<TrailerResolver>, movie_id: Option<i64>) -> Self {
        Self {
            resolver,
            movie_id,
            video_key: String::new(),
            visible: false,
            loading: false,
        }
    }

    pub fn video_key(&self) -> &str {
        &self.video_key
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Resolves the trailer and shows the player when a playable one exists.
    pub async fn request_trailer(&mut self) -> TrailerResolution {
        let Some(movie_id) = self.movie_id else {
            return TrailerResolution::NotFound;
        };

        self.loading = true;
        let resolution = self.resolver.resolve(movie_id).await;
        self.loading = false;

        match &resolution {
            TrailerResolution::Playable(video) => {
                self.video_key = video.key.clone();
                self.visible = true;
            }
            _ => tracing::info!(movie_id, "No suitable video found"),
        }
        resolution
    }

    /// Hides the player; the last key is kept.
    pub fn close_trailer(&mut self) {
        self.visible = false;
    }
}
