//! Remote playback: play queue creation and the playMedia command.
//!
//! Starting media on a Plex client takes two dependent requests. The media
//! is first wrapped in a play queue on the server, then the client is told
//! to play that queue. Nothing is cleaned up when the second step fails.

use crate::api::{MediaServer, media_container};
use crate::error::{AppError, Result};
use crate::identity::IdentityCache;
use crate::types::PlaybackRequest;
use log::info;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Per-player `commandID` sequence.
///
/// Plex clients expect an increasing id on each command they receive.
#[derive(Debug, Default)]
pub struct CommandSequence {
    next: Mutex<HashMap<String, u64>>,
}

impl CommandSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next id for `client`, starting at 1.
    pub async fn next_id(&self, client: &str) -> u64 {
        let mut map = self.next.lock().await;
        let id = map.entry(client.to_string()).or_insert(0);
        *id += 1;
        *id
    }
}

/// `library://` URI for a media key, encoded for use inside a query string.
///
/// The key is encoded on its own and then the whole URI is encoded again,
/// because the server nests this URI inside another URI.
pub fn library_uri(machine_identifier: &str, media_key: &str) -> String {
    let key = urlencoding::encode(media_key);
    let uri = format!("library://{}/item/{}", machine_identifier, key);
    urlencoding::encode(&uri).into_owned()
}

/// Path that creates a play queue holding a single video item.
pub fn play_queue_path(library_uri: &str) -> String {
    format!(
        "/playQueues?type=video&includechapters=1&uri={}&shuffle=0&continuous=1&repeat=0",
        library_uri
    )
}

/// Encoded container key pointing a client at a play queue.
pub fn container_key(play_queue_id: &str) -> String {
    urlencoding::encode(&format!("/playQueues/{}?own=1&window=200", play_queue_id)).into_owned()
}

/// Path of the playMedia command sent through the server to a client.
pub fn play_media_path(
    client_address: &str,
    media_key: &str,
    offset: u64,
    machine_identifier: &str,
    container_key: &str,
    command_id: u64,
) -> String {
    format!(
        "/system/players/{}/playback/playMedia?key={}&offset={}&machineIdentifier={}&protocol=http&containerKey={}&commandID={}",
        client_address,
        urlencoding::encode(media_key),
        offset,
        machine_identifier,
        container_key,
        command_id
    )
}

/// Read `playQueueID` out of a play queue creation response.
fn play_queue_id(body: &Value) -> Result<String> {
    match media_container(body).get("playQueueID") {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(AppError::Parse(
            "play queue response did not include a playQueueID".to_string(),
        )),
    }
}

/// Start `request` on its player. Every step depends on the previous one and
/// the first failure aborts the sequence.
pub async fn play_media<S: MediaServer + ?Sized>(
    server: &S,
    identity: &IdentityCache,
    commands: &CommandSequence,
    request: &PlaybackRequest,
) -> Result<Value> {
    let machine_identifier = identity.machine_identifier(server).await?;
    let client_address = identity
        .client_address(server, &request.player_name)
        .await?;

    let uri = library_uri(&machine_identifier, &request.media_key);
    let queue = server.post_query(&play_queue_path(&uri)).await?;
    let queue_id = play_queue_id(&queue)?;

    let command_id = commands.next_id(&client_address).await;
    let path = play_media_path(
        &client_address,
        &request.media_key,
        request.offset,
        &machine_identifier,
        &container_key(&queue_id),
        command_id,
    );
    info!("{}", path);

    server.perform(&path).await
}
