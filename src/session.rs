//! Conversation plumbing: the spoken response of a turn and the prompt that
//! carries over to the next one.

use crate::types::ConfirmationPrompt;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// A visual card shown alongside the spoken reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub content: String,
    pub subtitle: String,
}

/// The reply to a single conversational turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    speech: Vec<String>,
    card: Option<Card>,
    end_session: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// An empty reply that ends the session.
    pub fn new() -> Self {
        Self {
            speech: Vec::new(),
            card: None,
            end_session: true,
        }
    }

    /// Append an utterance.
    pub fn say(&mut self, text: impl Into<String>) -> &mut Self {
        self.speech.push(text.into());
        self
    }

    /// Attach a card, replacing any previous one.
    pub fn card(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        subtitle: impl Into<String>,
    ) -> &mut Self {
        self.card = Some(Card {
            title: title.into(),
            content: content.into(),
            subtitle: subtitle.into(),
        });
        self
    }

    pub fn should_end_session(&mut self, end: bool) -> &mut Self {
        self.end_session = end;
        self
    }

    pub fn utterances(&self) -> &[String] {
        &self.speech
    }

    /// All utterances joined with a space.
    pub fn speech(&self) -> String {
        self.speech.join(" ")
    }

    pub fn get_card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    pub fn ends_session(&self) -> bool {
        self.end_session
    }
}

/// Session-scoped storage for the pending yes/no prompt.
///
/// There is a single slot: storing a new prompt replaces the old one.
pub trait SessionStore: Send + Sync {
    fn set_prompt(&self, prompt: ConfirmationPrompt);

    /// Remove and return the pending prompt.
    fn take_prompt(&self) -> Option<ConfirmationPrompt>;

    fn peek_prompt(&self) -> Option<ConfirmationPrompt>;
}

/// Process-local [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySession {
    prompt: Mutex<Option<ConfirmationPrompt>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySession {
    fn set_prompt(&self, prompt: ConfirmationPrompt) {
        if let Ok(mut slot) = self.prompt.lock() {
            *slot = Some(prompt);
        }
    }

    fn take_prompt(&self) -> Option<ConfirmationPrompt> {
        self.prompt.lock().ok().and_then(|mut slot| slot.take())
    }

    fn peek_prompt(&self) -> Option<ConfirmationPrompt> {
        self.prompt.lock().ok().and_then(|slot| slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromptAction;

    fn prompt(key: &str) -> ConfirmationPrompt {
        ConfirmationPrompt {
            yes_action: PromptAction::StartEpisode,
            yes_response: "yes".to_string(),
            no_action: PromptAction::EndSession,
            no_response: "no".to_string(),
            media_key: key.to_string(),
            offset: 0,
            player_name: "TV".to_string(),
            alternate_media_key: None,
            alternate_offset: None,
        }
    }

    #[test]
    fn test_response_defaults_to_ending() {
        let response = Response::new();
        assert!(response.ends_session());
        assert!(response.utterances().is_empty());
        assert!(response.get_card().is_none());
    }

    #[test]
    fn test_response_accumulates_speech() {
        let mut response = Response::new();
        response.say("Hello").say("there").should_end_session(false);
        response.card("Plex", "Playing X: Y", "Playing Episode");

        assert_eq!(response.speech(), "Hello there");
        assert!(!response.ends_session());
        assert_eq!(response.get_card().unwrap().content, "Playing X: Y");
    }

    #[test]
    fn test_session_single_slot() {
        let session = MemorySession::new();
        session.set_prompt(prompt("a"));
        session.set_prompt(prompt("b"));

        assert_eq!(session.peek_prompt().unwrap().media_key, "b");
        assert_eq!(session.take_prompt().unwrap().media_key, "b");
        assert!(session.take_prompt().is_none());
    }
}
