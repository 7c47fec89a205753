//! Type definitions for plex-remote.
//!
//! Catalog entities (shows, episodes, listing items, devices) are read-only
//! projections of Plex API JSON, deserialized with the API's own camelCase
//! field names. Request and prompt types describe what the orchestrator hands
//! back to the conversation layer.

use serde::{Deserialize, Deserializer, Serialize};

/// A TV show from a library section listing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Show {
    /// Opaque metadata id used to fetch the show's episodes.
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    /// Display name of the show.
    pub title: String,
}

/// A single episode as returned by `/library/metadata/<id>/allLeaves`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Episode {
    /// Media key, e.g. `/library/metadata/4321`.
    pub key: String,

    /// Episode title.
    #[serde(default)]
    pub title: String,

    /// Name of the show this episode belongs to.
    #[serde(default, rename = "grandparentTitle")]
    pub grandparent_title: String,

    /// Season number.
    #[serde(default, rename = "parentIndex")]
    pub parent_index: i64,

    /// Episode number within the season.
    #[serde(default)]
    pub index: i64,

    /// Resume position in milliseconds, 0 when not started.
    #[serde(default, rename = "viewOffset")]
    pub view_offset: u64,

    /// Present once the episode has been watched at least once.
    #[serde(default, rename = "viewCount")]
    pub view_count: Option<u64>,

    /// Optional user or critic rating.
    #[serde(default)]
    pub rating: Option<f64>,

    /// Present when the underlying media is gone from disk.
    #[serde(default, rename = "deletedAt")]
    pub deleted_at: Option<i64>,
}

impl Episode {
    /// Whether the server has recorded at least one complete view.
    pub fn is_watched(&self) -> bool {
        self.view_count.is_some()
    }

    /// Whether the media is still available for playback.
    pub fn is_available(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Format the episode for logs and listings.
    ///
    /// # Examples
    ///
    /// ```
    /// use plex_remote::types::Episode;
    ///
    /// let ep = Episode {
    ///     key: "/library/metadata/10".to_string(),
    ///     title: "Pilot".to_string(),
    ///     parent_index: 1,
    ///     index: 2,
    ///     ..Default::default()
    /// };
    /// assert_eq!(ep.to_display(), "S01E02 - Pilot");
    /// ```
    pub fn to_display(&self) -> String {
        format!(
            "S{:02}E{:02} - {}",
            self.parent_index, self.index, self.title
        )
    }
}

/// An entry of a mixed media list such as On Deck.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct MediaItem {
    /// Plex media type: "episode", "movie", "track", ...
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, rename = "grandparentTitle")]
    pub grandparent_title: Option<String>,
}

/// A playback client known to the media server (`/clients`).
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Player {
    pub name: String,

    /// Network address the server uses to reach the client.
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default, rename = "machineIdentifier")]
    pub machine_identifier: String,

    #[serde(default)]
    pub product: String,

    /// Comma separated list, e.g. "timeline,playback,navigation".
    #[serde(default, rename = "protocolCapabilities")]
    pub protocol_capabilities: String,
}

impl Player {
    pub fn can_play(&self) -> bool {
        self.protocol_capabilities
            .to_lowercase()
            .contains("playback")
    }
}

/// A device registered with the Plex account (`/api/resources` on plex.tv).
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Resource {
    pub name: String,

    /// Comma separated roles, e.g. "server" or "client,player".
    #[serde(default)]
    pub provides: String,

    #[serde(default, rename = "clientIdentifier")]
    pub client_identifier: String,

    /// plex.tv reports presence as `true` in JSON and `"1"` in XML-derived payloads.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub presence: bool,
}

impl Resource {
    pub fn is_online_server(&self) -> bool {
        self.presence && self.provides.to_lowercase().contains("server")
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        serde_json::Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// Result of fuzzy-matching a query against a candidate list.
///
/// `confidence` is a 0..=100 score and only carries meaning when
/// `best_match` is present.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult<T> {
    pub best_match: Option<T>,
    pub confidence: u8,
}

impl<T> MatchResult<T> {
    pub fn none() -> Self {
        Self {
            best_match: None,
            confidence: 0,
        }
    }
}

/// A fully resolved remote playback command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackRequest {
    pub player_name: String,
    pub media_key: String,
    /// Start position in milliseconds.
    pub offset: u64,
}

/// What to do when the user answers a yes/no prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptAction {
    StartEpisode,
    EndSession,
}

/// A pending yes/no question stored in the session between turns.
///
/// The "yes" branch plays `media_key` at `offset`. The "no" branch plays the
/// alternate media when one is set and the action is
/// [`PromptAction::StartEpisode`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPrompt {
    pub yes_action: PromptAction,
    pub yes_response: String,
    pub no_action: PromptAction,
    pub no_response: String,
    pub media_key: String,
    pub offset: u64,
    pub player_name: String,
    #[serde(default)]
    pub alternate_media_key: Option<String>,
    #[serde(default)]
    pub alternate_offset: Option<u64>,
}

impl ConfirmationPrompt {
    /// The playback the "yes" answer leads to.
    pub fn yes_request(&self) -> PlaybackRequest {
        PlaybackRequest {
            player_name: self.player_name.clone(),
            media_key: self.media_key.clone(),
            offset: self.offset,
        }
    }

    /// The playback the "no" answer leads to, if any.
    pub fn no_request(&self) -> Option<PlaybackRequest> {
        self.alternate_media_key
            .as_ref()
            .map(|key| PlaybackRequest {
                player_name: self.player_name.clone(),
                media_key: key.clone(),
                offset: self.alternate_offset.unwrap_or(0),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_deserialize_plex_fields() {
        let json = r#"{
            "key": "/library/metadata/55",
            "title": "Cat's in the Bag...",
            "grandparentTitle": "Breaking Bad",
            "parentIndex": 1,
            "index": 2,
            "viewOffset": 120,
            "rating": 8.3
        }"#;

        let ep: Episode = serde_json::from_str(json).unwrap();
        assert_eq!(ep.grandparent_title, "Breaking Bad");
        assert_eq!(ep.parent_index, 1);
        assert_eq!(ep.index, 2);
        assert_eq!(ep.view_offset, 120);
        assert_eq!(ep.rating, Some(8.3));
        assert!(!ep.is_watched());
        assert!(ep.is_available());
    }

    #[test]
    fn test_episode_missing_offset_defaults_to_zero() {
        let ep: Episode =
            serde_json::from_str(r#"{"key": "/k", "viewCount": 3, "deletedAt": 1700000000}"#)
                .unwrap();
        assert_eq!(ep.view_offset, 0);
        assert!(ep.is_watched());
        assert!(!ep.is_available());
    }

    #[test]
    fn test_episode_to_display_pads_numbers() {
        let ep = Episode {
            title: "Ozymandias".to_string(),
            parent_index: 5,
            index: 14,
            ..Default::default()
        };
        assert_eq!(ep.to_display(), "S05E14 - Ozymandias");
    }

    #[test]
    fn test_show_deserialize() {
        let show: Show =
            serde_json::from_str(r#"{"ratingKey": "1234", "title": "Firefly", "type": "show"}"#)
                .unwrap();
        assert_eq!(show.rating_key, "1234");
        assert_eq!(show.title, "Firefly");
    }

    #[test]
    fn test_resource_presence_variants() {
        let json_bool: Resource =
            serde_json::from_str(r#"{"name": "a", "provides": "server", "presence": true}"#)
                .unwrap();
        let xml_style: Resource =
            serde_json::from_str(r#"{"name": "b", "provides": "Server", "presence": "1"}"#)
                .unwrap();
        let offline: Resource =
            serde_json::from_str(r#"{"name": "c", "provides": "server", "presence": "0"}"#)
                .unwrap();
        let client: Resource =
            serde_json::from_str(r#"{"name": "d", "provides": "player", "presence": true}"#)
                .unwrap();

        assert!(json_bool.is_online_server());
        assert!(xml_style.is_online_server());
        assert!(!offline.is_online_server());
        assert!(!client.is_online_server());
    }

    #[test]
    fn test_player_can_play() {
        let player = Player {
            name: "Living Room".to_string(),
            protocol_capabilities: "timeline,Playback,navigation".to_string(),
            ..Default::default()
        };
        assert!(player.can_play());

        let remote = Player {
            name: "Remote".to_string(),
            protocol_capabilities: "timeline".to_string(),
            ..Default::default()
        };
        assert!(!remote.can_play());
    }

    #[test]
    fn test_prompt_requests() {
        let prompt = ConfirmationPrompt {
            yes_action: PromptAction::StartEpisode,
            yes_response: "Resuming".to_string(),
            no_action: PromptAction::StartEpisode,
            no_response: "Random".to_string(),
            media_key: "/library/metadata/1".to_string(),
            offset: 120,
            player_name: "TV".to_string(),
            alternate_media_key: Some("/library/metadata/2".to_string()),
            alternate_offset: Some(0),
        };

        assert_eq!(prompt.yes_request().offset, 120);
        let no = prompt.no_request().unwrap();
        assert_eq!(no.media_key, "/library/metadata/2");
        assert_eq!(no.offset, 0);
        assert_eq!(no.player_name, "TV");
    }
}
