//! Spotify Web API catalog client backed by `ureq`.
//!
//! Uses the client-credentials flow; the access token is held in memory only.

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use log::debug;
use serde_json::Value;

use crate::catalog::{CatalogError, CatalogService};
use crate::config::CatalogConfig;
use crate::credentials::CatalogCredentials;

const ACCOUNTS_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE_URL: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = concat!("genretag/", env!("CARGO_PKG_VERSION"));
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
const REQUEST_SLOT_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

/// Catalog lookups against the Spotify Web API.
pub struct SpotifyCatalog {
    http_client: ureq::Agent,
    credentials: CatalogCredentials,
    market: Option<String>,
    token: Option<AccessToken>,
    request_limiter: Option<DefaultDirectRateLimiter>,
}

impl SpotifyCatalog {
    /// Creates a client; no request is made until the first lookup.
    pub fn new(credentials: CatalogCredentials, settings: &CatalogConfig) -> Self {
        let request_timeout = Duration::from_secs(settings.request_timeout_secs);
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(request_timeout)
            .timeout_write(request_timeout)
            .user_agent(USER_AGENT)
            .build();

        let request_limiter = Quota::with_period(Duration::from_millis(
            settings.min_request_interval_ms,
        ))
        .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));

        let market = Some(settings.market.trim().to_string()).filter(|market| !market.is_empty());

        Self {
            http_client,
            credentials,
            market,
            token: None,
            request_limiter,
        }
    }

    fn wait_for_request_slot(&self) {
        let Some(limiter) = self.request_limiter.as_ref() else {
            return;
        };
        while limiter.check().is_err() {
            std::thread::sleep(REQUEST_SLOT_POLL_INTERVAL);
        }
    }

    fn access_token(&mut self) -> Result<String, CatalogError> {
        if let Some(token) = self.token.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.request_token()?;
        let value = token.value.clone();
        self.token = Some(token);
        Ok(value)
    }

    fn request_token(&self) -> Result<AccessToken, CatalogError> {
        self.wait_for_request_slot();
        debug!("Requesting catalog access token");
        let response = self
            .http_client
            .post(ACCOUNTS_TOKEN_URL)
            .set("Accept", "application/json")
            .send_form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .map_err(|error| match classify_ureq_failure(error) {
                CatalogError::Status { status, message } if status == 400 || status == 401 => {
                    CatalogError::Auth(message)
                }
                other => other,
            })?;
        let payload = read_json(response)?;
        parse_access_token(&payload, Instant::now())
    }

    fn get_json(&mut self, url: &str) -> Result<Value, CatalogError> {
        let mut refreshed_token = false;
        loop {
            let token = self.access_token()?;
            self.wait_for_request_slot();
            debug!("Catalog request: GET {url}");
            let result = self
                .http_client
                .get(url)
                .set("Authorization", &format!("Bearer {token}"))
                .set("Accept", "application/json")
                .call();

            match result {
                Ok(response) => return read_json(response),
                Err(ureq::Error::Status(401, _)) if !refreshed_token => {
                    debug!("Catalog rejected the access token, requesting a new one");
                    self.token = None;
                    refreshed_token = true;
                }
                Err(error) => return Err(classify_ureq_failure(error)),
            }
        }
    }
}

impl CatalogService for SpotifyCatalog {
    fn search_track(&mut self, artist: &str, title: &str) -> Result<Option<String>, CatalogError> {
        let url = search_url(artist, title, self.market.as_deref());
        let payload = self.get_json(&url)?;
        Ok(first_track_id(&payload))
    }

    fn track_primary_artist(&mut self, track_id: &str) -> Result<Option<String>, CatalogError> {
        let url = format!("{API_BASE_URL}/tracks/{}", urlencoding::encode(track_id));
        let payload = self.get_json(&url)?;
        Ok(primary_artist_id(&payload))
    }

    fn artist_genres(&mut self, artist_id: &str) -> Result<Vec<String>, CatalogError> {
        let url = format!("{API_BASE_URL}/artists/{}", urlencoding::encode(artist_id));
        let payload = self.get_json(&url)?;
        Ok(artist_genres(&payload))
    }
}

fn search_url(artist: &str, title: &str, market: Option<&str>) -> String {
    let query = format!("artist:{} track:{}", artist.trim(), title.trim());
    let mut url = format!(
        "{API_BASE_URL}/search?q={}&type=track&limit=1",
        urlencoding::encode(&query)
    );
    if let Some(market) = market {
        url.push_str("&market=");
        url.push_str(urlencoding::encode(market).as_ref());
    }
    url
}

fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value?.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn error_message_from_body(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return body.trim().chars().take(200).collect();
    };
    // API errors nest the message, the accounts service puts it at the top level.
    parsed["error"]["message"]
        .as_str()
        .or_else(|| parsed["error_description"].as_str())
        .or_else(|| parsed["error"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn classify_ureq_failure(error: ureq::Error) -> CatalogError {
    match error {
        ureq::Error::Status(429, response) => CatalogError::RateLimited {
            retry_after: parse_retry_after(response.header("Retry-After")),
        },
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            CatalogError::Status {
                status,
                message: error_message_from_body(&body),
            }
        }
        ureq::Error::Transport(transport) => CatalogError::Transport(transport.to_string()),
    }
}

fn read_json(response: ureq::Response) -> Result<Value, CatalogError> {
    let body = response
        .into_string()
        .map_err(|error| CatalogError::Transport(format!("Failed to read response: {error}")))?;
    serde_json::from_str(&body)
        .map_err(|error| CatalogError::InvalidResponse(format!("Invalid JSON response: {error}")))
}

fn parse_access_token(payload: &Value, now: Instant) -> Result<AccessToken, CatalogError> {
    let value = payload["access_token"]
        .as_str()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            CatalogError::InvalidResponse("token response has no access_token".to_string())
        })?;
    let expires_at = payload["expires_in"]
        .as_u64()
        .and_then(|expires_in| now.checked_add(Duration::from_secs(expires_in)))
        .unwrap_or(now + DEFAULT_TOKEN_LIFETIME);
    Ok(AccessToken {
        value: value.to_string(),
        expires_at,
    })
}

fn first_track_id(payload: &Value) -> Option<String> {
    payload["tracks"]["items"][0]["id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn primary_artist_id(payload: &Value) -> Option<String> {
    payload["artists"][0]["id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn artist_genres(payload: &Value) -> Vec<String> {
    payload["genres"]
        .as_array()
        .map(|genres| {
            genres
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
