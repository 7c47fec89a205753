//! Client for the Plex Media Server HTTP API.
//!
//! [`MediaServer`] is the narrow request interface the rest of the crate is
//! written against; [`PlexClient`] implements it over HTTP. The catalog
//! helpers below turn raw responses into typed entities.

use crate::error::{AppError, Result};
use crate::types::{Episode, MediaItem, Player, Resource, Show};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CLIENT_IDENTIFIER: &str = "plex-remote";

/// Base URL of the plex.tv account API, used for server discovery.
pub const PLEX_TV_URL: &str = "https://plex.tv";

/// Request verbs against a media server. Paths include their query string.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// GET a path and return the parsed JSON body.
    async fn query(&self, path: &str) -> Result<Value>;

    /// POST to a path and return the parsed JSON body.
    async fn post_query(&self, path: &str) -> Result<Value>;

    /// Issue a command (GET) whose body is usually empty.
    async fn perform(&self, path: &str) -> Result<Value>;

    /// Query a path and keep the child entries whose attributes equal every
    /// `(name, value)` pair of `filter`.
    async fn find(&self, path: &str, filter: &[(&str, &str)]) -> Result<Vec<Value>> {
        let body = self.query(path).await?;
        Ok(container_entries(&body)
            .into_iter()
            .filter(|entry| {
                filter
                    .iter()
                    .all(|(name, value)| entry.get(*name).and_then(Value::as_str) == Some(*value))
            })
            .collect())
    }
}

/// HTTP implementation of [`MediaServer`].
#[derive(Clone)]
pub struct PlexClient {
    client: reqwest::Client,
    base_url: String,
}

impl PlexClient {
    /// Create a client for `base_url`, e.g. `http://192.168.1.10:32400`.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-plex-client-identifier",
            HeaderValue::from_static(CLIENT_IDENTIFIER),
        );
        headers.insert("x-plex-product", HeaderValue::from_static(CLIENT_IDENTIFIER));
        if let Some(token) = token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| AppError::Config(format!("invalid Plex token: {}", e)))?;
            headers.insert("x-plex-token", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_body(path: &str, resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Network(format!("{} returned {}", path, status)));
        }

        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| AppError::Parse(format!("Failed to parse response of {}: {}", path, e)))
    }
}

#[async_trait]
impl MediaServer for PlexClient {
    async fn query(&self, path: &str) -> Result<Value> {
        debug!("GET {}", path);
        let resp = self.client.get(self.url(path)).send().await?;
        Self::read_body(path, resp).await
    }

    async fn post_query(&self, path: &str) -> Result<Value> {
        debug!("POST {}", path);
        let resp = self.client.post(self.url(path)).send().await?;
        Self::read_body(path, resp).await
    }

    async fn perform(&self, path: &str) -> Result<Value> {
        debug!("PERFORM {}", path);
        let resp = self.client.get(self.url(path)).send().await?;
        Self::read_body(path, resp).await
    }
}

/// The `MediaContainer` object of a response, or the body itself when the
/// envelope is missing.
pub fn media_container(body: &Value) -> &Value {
    body.get("MediaContainer").unwrap_or(body)
}

/// Every object found in array-valued fields of the container, in order.
///
/// Plex names child arrays by element type (`Metadata`, `Server`, `Device`,
/// ...), so callers that only care about "the children" use this.
pub fn container_entries(body: &Value) -> Vec<Value> {
    let container = media_container(body);
    match container {
        Value::Object(map) => map
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .filter(|v| v.is_object())
            .cloned()
            .collect(),
        Value::Array(items) => items.clone(),
        _ => Vec::new(),
    }
}

/// Deserialize the container's children into `T`, skipping entries that do
/// not fit the shape.
pub fn parse_children<T: DeserializeOwned>(body: &Value) -> Vec<T> {
    container_entries(body)
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Skipping unparseable entry: {}", e);
                None
            }
        })
        .collect()
}

/// All shows of a TV library section.
pub async fn list_tv_shows<S: MediaServer + ?Sized>(server: &S, section: u32) -> Result<Vec<Show>> {
    let body = server
        .query(&format!("/library/sections/{}/all", section))
        .await?;
    let shows: Vec<Show> = parse_children(&body);
    debug!("Found {} shows in section {}", shows.len(), section);
    Ok(shows)
}

/// Every episode of a show across all seasons.
pub async fn all_episodes_of_show<S: MediaServer + ?Sized>(
    server: &S,
    rating_key: &str,
) -> Result<Vec<Episode>> {
    let body = server
        .query(&format!("/library/metadata/{}/allLeaves", rating_key))
        .await?;
    let episodes: Vec<Episode> = parse_children(&body);
    debug!("Found {} episodes for show {}", episodes.len(), rating_key);
    Ok(episodes)
}

/// Shows and movies "On Deck".
pub async fn on_deck<S: MediaServer + ?Sized>(server: &S) -> Result<Vec<MediaItem>> {
    let body = server.query("/library/onDeck").await?;
    Ok(parse_children(&body))
}

/// Clients currently able to accept playback commands.
pub async fn players<S: MediaServer + ?Sized>(server: &S) -> Result<Vec<Player>> {
    let body = server.query("/clients").await?;
    Ok(parse_children::<Player>(&body)
        .into_iter()
        .filter(Player::can_play)
        .collect())
}

/// Online media servers registered to the account. `web` must point at plex.tv.
pub async fn servers<S: MediaServer + ?Sized>(web: &S) -> Result<Vec<Resource>> {
    let body = web.query("/api/resources?includeHttps=1").await?;
    Ok(parse_children::<Resource>(&body)
        .into_iter()
        .filter(Resource::is_online_server)
        .collect())
}
