//! Artist/title to genre lookup with bounded rate-limit retries.

use std::time::Duration;

use log::{debug, warn};

use crate::catalog::{CatalogError, CatalogService};

const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(1);

/// Outcome of one genre lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenreLookupResult {
    Resolved(String),
    /// The catalog has no genre for this track.
    Unknown,
    /// The lookup was abandoned; carries the reason.
    Failed(String),
}

impl GenreLookupResult {
    /// The genre to write, if any.
    pub fn usable_genre(&self) -> Option<&str> {
        match self {
            Self::Resolved(genre) => Some(genre.as_str()),
            Self::Unknown | Self::Failed(_) => None,
        }
    }
}

/// Anything that can turn an artist and title into a genre.
pub trait GenreSource {
    fn resolve_genre(&mut self, artist: &str, title: &str) -> GenreLookupResult;
}

pub struct GenreResolver<C: CatalogService> {
    catalog: C,
    max_rate_limit_retries: u32,
    pause: Box<dyn FnMut(Duration)>,
}

impl<C: CatalogService> GenreResolver<C> {
    /// Resolver that sleeps the current thread while rate limited.
    pub fn new(catalog: C, max_rate_limit_retries: u32) -> Self {
        Self::with_pause(catalog, max_rate_limit_retries, std::thread::sleep)
    }

    pub fn with_pause(
        catalog: C,
        max_rate_limit_retries: u32,
        pause: impl FnMut(Duration) + 'static,
    ) -> Self {
        Self {
            catalog,
            max_rate_limit_retries,
            pause: Box::new(pause),
        }
    }

    fn lookup_once(&mut self, artist: &str, title: &str) -> Result<Option<String>, CatalogError> {
        let Some(track_id) = self.catalog.search_track(artist, title)? else {
            debug!("No catalog match for '{artist} - {title}'");
            return Ok(None);
        };
        let Some(artist_id) = self.catalog.track_primary_artist(&track_id)? else {
            debug!("Catalog track {track_id} lists no artists");
            return Ok(None);
        };
        let genres = self.catalog.artist_genres(&artist_id)?;
        Ok(genres
            .into_iter()
            .next()
            .map(|genre| genre.trim().to_string())
            .filter(|genre| !genre.is_empty()))
    }
}

impl<C: CatalogService> GenreSource for GenreResolver<C> {
    fn resolve_genre(&mut self, artist: &str, title: &str) -> GenreLookupResult {
        let artist = artist.trim();
        let title = title.trim();
        let mut rate_limited_attempts = 0u32;

        loop {
            match self.lookup_once(artist, title) {
                Ok(Some(genre)) => return GenreLookupResult::Resolved(genre),
                Ok(None) => return GenreLookupResult::Unknown,
                Err(CatalogError::RateLimited { retry_after }) => {
                    rate_limited_attempts += 1;
                    if rate_limited_attempts > self.max_rate_limit_retries {
                        return GenreLookupResult::Failed(format!(
                            "still rate limited after {} retries",
                            self.max_rate_limit_retries
                        ));
                    }
                    let wait = retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT);
                    warn!(
                        "Catalog rate limit hit for '{artist} - {title}', retrying in {}s",
                        wait.as_secs_f64()
                    );
                    (self.pause)(wait);
                }
                Err(err) => return GenreLookupResult::Failed(err.to_string()),
            }
        }
    }
}
