use std::sync::Arc;

use crate::models::MovieDetails;
use crate::services::gateway::MetadataGateway;
use crate::services::trailer::{TrailerPlayer, TrailerResolver};

/// Loads a movie's detail view together with its trailer player.
pub struct MovieDetailsLoader {
    gateway: Arc<dyn MetadataGateway>,
    resolver: Arc<TrailerResolver>,
}

/// A loaded detail view.
pub struct MovieDetailsView {
    pub movie: MovieDetails,
    pub trailer: TrailerPlayer,
}

impl MovieDetailsLoader {
    pub fn new(gateway: Arc<dyn MetadataGateway>, resolver: Arc<TrailerResolver>) -> Self {
        Self { gateway, resolver }
    }

    /// `None` when the movie is unknown or the fetch failed.
    pub async fn load(&self, movie_id: i64) -> Option<MovieDetailsView> {
        let movie = match self.gateway.fetch_movie_details(movie_id).await {
            Ok(Some(movie)) => movie,
            Ok(None) => {
                tracing::info!(movie_id, "Movie not found");
                return None;
            }
            Err(e) => {
                tracing::error!(movie_id, error = %e, "Failed to load movie details");
                return None;
            }
        };

        let trailer = TrailerPlayer::new(self.resolver.clone(), Some(movie.movie.id));
        Some(MovieDetailsView { movie, trailer })
    }
}
