//! Catalog service abstraction and concrete implementations.

pub mod genre_resolver;
pub mod spotify;

use std::time::Duration;

/// Failure of a single catalog request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The service asked the client to slow down, optionally saying for how long.
    #[error("catalog rate limit reached (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("catalog returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("catalog request failed: {0}")]
    Transport(String),
    #[error("catalog response could not be understood: {0}")]
    InvalidResponse(String),
    #[error("catalog authentication failed: {0}")]
    Auth(String),
}

/// Lookups the genre resolver needs from a music catalog.
pub trait CatalogService {
    /// Id of the first track matching artist and title, if any.
    fn search_track(&mut self, artist: &str, title: &str) -> Result<Option<String>, CatalogError>;
    /// Id of the track's primary (first listed) artist.
    fn track_primary_artist(&mut self, track_id: &str) -> Result<Option<String>, CatalogError>;
    /// Genres the catalog lists for an artist, most relevant first.
    fn artist_genres(&mut self, artist_id: &str) -> Result<Vec<String>, CatalogError>;
}
