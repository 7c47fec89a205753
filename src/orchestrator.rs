//! Turning "play <show>" into either a playback command or a question.
//!
//! [`select_episode`] is the pure decision: given a show and its episodes it
//! picks what to play, or decides that the user has to be asked first.
//! [`Orchestrator`] wraps it with the catalog lookups, the confidence gate,
//! and the remote playback chain.

use crate::api::{MediaServer, PlexClient, all_episodes_of_show, list_tv_shows};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::identity::IdentityCache;
use crate::matching::{CONFIRM_THRESHOLD, resolve_show};
use crate::playback::{CommandSequence, play_media};
use crate::selectors::{
    ExplicitPick, explicit_episode, first_unwatched, random_episode, resume_candidate,
};
use crate::session::{Response, SessionStore};
use crate::types::{ConfirmationPrompt, Episode, PlaybackRequest, PromptAction, Show};
use log::{debug, error, info, warn};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

pub const SHOW_NOT_FOUND: &str = "Sorry, I couldn't find that show in your library";
pub const UPSTREAM_APOLOGY: &str =
    "I'm sorry, Plex and I don't seem to be getting along right now";
pub const DECLINED: &str = "Oh. Sorry about that.";
pub const NO_PENDING_PROMPT: &str = "I'm not sure what you're answering.";

/// Options of a "start show" request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StartShowOptions {
    pub spoken_show_name: Option<String>,
    pub player_name: Option<String>,
    /// Skip "continue watching" and pick at random.
    pub force_random: bool,
    /// Restrict random and resume picks to this top-rated fraction.
    pub only_top_rated: Option<f64>,
    pub episode_number: Option<i64>,
    pub season_number: Option<i64>,
}

impl StartShowOptions {
    pub fn new(spoken_show_name: &str, player_name: &str) -> Self {
        Self {
            spoken_show_name: Some(spoken_show_name.to_string()),
            player_name: Some(player_name.to_string()),
            ..Default::default()
        }
    }
}

/// A yes/no answer to a pending prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

/// What to do with a show once its episodes are known.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    NoSuchSeason {
        season: i64,
    },
    NoSuchEpisode {
        season: i64,
        number: i64,
    },
    /// Play `episode` from `offset`, announcing it with `speech`.
    Play {
        episode: Episode,
        offset: u64,
        speech: String,
    },
    /// A partially watched episode exists: ask whether to resume it, with
    /// `fallback` played from the start on "no".
    OfferResume {
        partial: Episode,
        fallback: Episode,
    },
}

/// Choose an episode of `show` according to `options`.
///
/// Explicit season/episode requests win. Otherwise the first unwatched
/// episode continues the show (unless `force_random`), then a partially
/// watched episode is offered, and finally a random one is picked.
pub fn select_episode<R: Rng + ?Sized>(
    show: &Show,
    episodes: &[Episode],
    options: &StartShowOptions,
    rng: &mut R,
) -> Result<Selection> {
    if options.episode_number.is_some() || options.season_number.is_some() {
        return Ok(
            match explicit_episode(episodes, options.season_number, options.episode_number) {
                ExplicitPick::Found {
                    episode,
                    season,
                    number,
                } => {
                    let speech = format!(
                        "Alright, here is <say-as interpret-as='digits'>s{}e{}</say-as> of {}: {}",
                        season, number, show.title, episode.title
                    );
                    Selection::Play {
                        episode,
                        offset: 0,
                        speech,
                    }
                }
                ExplicitPick::NoSuchSeason { season } => Selection::NoSuchSeason { season },
                ExplicitPick::NoSuchEpisode { season, number } => {
                    Selection::NoSuchEpisode { season, number }
                }
            },
        );
    }

    if !options.force_random {
        if let Some(episode) = first_unwatched(episodes) {
            let offset = episode.view_offset;
            let speech = if offset > 0 {
                format!(
                    "Continuing the next episode of {} from where you left off: {}",
                    show.title, episode.title
                )
            } else {
                format!("Enjoy the next episode of {}: {}", show.title, episode.title)
            };
            return Ok(Selection::Play {
                episode,
                offset,
                speech,
            });
        }
    }

    if let Some(partial) = resume_candidate(episodes, options.only_top_rated) {
        let fallback = random_episode(episodes, options.only_top_rated, rng)?;
        return Ok(Selection::OfferResume { partial, fallback });
    }

    let episode = random_episode(episodes, options.only_top_rated, rng)?;
    let speech = format!(
        "Enjoy this episode from Season {}: {}",
        episode.parent_index, episode.title
    );
    Ok(Selection::Play {
        episode,
        offset: 0,
        speech,
    })
}

/// Runs start-show and prompt-answer turns against one media server.
pub struct Orchestrator {
    server: Arc<dyn MediaServer>,
    identity: Arc<IdentityCache>,
    commands: Arc<CommandSequence>,
    tv_section: u32,
    confirm_threshold: u8,
}

impl Orchestrator {
    pub fn new(server: Arc<dyn MediaServer>, identity: Arc<IdentityCache>) -> Self {
        Self {
            server,
            identity,
            commands: Arc::new(CommandSequence::new()),
            tv_section: 1,
            confirm_threshold: CONFIRM_THRESHOLD,
        }
    }

    /// Build an orchestrator talking HTTP to the configured server.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = PlexClient::new(&config.server_url, config.token.as_deref())?;
        let identity = IdentityCache::with_overrides(
            config.machine_identifier.clone(),
            config.player_address.clone(),
        );

        Ok(Self::new(Arc::new(client), Arc::new(identity))
            .with_tv_section(config.tv_section)
            .with_confirm_threshold(config.confirm_threshold))
    }

    pub fn with_tv_section(mut self, section: u32) -> Self {
        self.tv_section = section;
        self
    }

    pub fn with_confirm_threshold(mut self, threshold: u8) -> Self {
        self.confirm_threshold = threshold;
        self
    }

    pub fn server(&self) -> &dyn MediaServer {
        self.server.as_ref()
    }

    /// Handle a "play <show>" request.
    ///
    /// Missing show or player names fail before any request is made. Upstream
    /// failures are apologised for in `response` and returned.
    pub async fn start_show(
        &self,
        options: &StartShowOptions,
        response: &mut Response,
        session: &dyn SessionStore,
    ) -> Result<()> {
        let mut rng = StdRng::from_entropy();
        self.start_show_with_rng(options, response, session, &mut rng)
            .await
    }

    /// [`Orchestrator::start_show`] with a caller supplied random source.
    pub async fn start_show_with_rng<R: Rng + Send + ?Sized>(
        &self,
        options: &StartShowOptions,
        response: &mut Response,
        session: &dyn SessionStore,
        rng: &mut R,
    ) -> Result<()> {
        let spoken_show_name = required(&options.spoken_show_name, "spokenShowName")?;
        let player_name = required(&options.player_name, "playerName")?;

        let result = self
            .run_start_show(spoken_show_name, player_name, options, response, session, rng)
            .await;
        self.apologise_on_error(result, response)
    }

    /// Handle the user's answer to the pending prompt, consuming it.
    pub async fn answer_prompt(
        &self,
        answer: Answer,
        response: &mut Response,
        session: &dyn SessionStore,
    ) -> Result<()> {
        let Some(prompt) = session.take_prompt() else {
            response.say(NO_PENDING_PROMPT);
            return Ok(());
        };

        let (action, speech, request) = match answer {
            Answer::Yes => (prompt.yes_action, &prompt.yes_response, Some(prompt.yes_request())),
            Answer::No => (prompt.no_action, &prompt.no_response, prompt.no_request()),
        };

        match action {
            PromptAction::EndSession => {
                response.say(speech.as_str()).should_end_session(true);
                Ok(())
            }
            PromptAction::StartEpisode => {
                let result = match request {
                    Some(request) => {
                        response.say(speech.as_str());
                        self.play(&request).await
                    }
                    None => Err(AppError::InvalidState(
                        "prompt has no media for this answer".to_string(),
                    )),
                };
                self.apologise_on_error(result, response)
            }
        }
    }

    async fn run_start_show<R: Rng + Send + ?Sized>(
        &self,
        spoken_show_name: &str,
        player_name: &str,
        options: &StartShowOptions,
        response: &mut Response,
        session: &dyn SessionStore,
        rng: &mut R,
    ) -> Result<()> {
        let shows = list_tv_shows(self.server(), self.tv_section).await?;
        let matched = resolve_show(spoken_show_name, &shows);
        let confidence = matched.confidence;
        let Some(show) = matched.best_match else {
            warn!("Show requested not found: {}", spoken_show_name);
            response.say(SHOW_NOT_FOUND);
            return Ok(());
        };
        debug!(
            "Matched '{}' to '{}' with confidence {}",
            spoken_show_name, show.title, confidence
        );

        let episodes = all_episodes_of_show(self.server(), &show.rating_key).await?;

        let (episode, offset, speech) = match select_episode(&show, &episodes, options, rng)? {
            Selection::NoSuchSeason { season } => {
                response.say(format!(
                    "I'm sorry, there does not appear to be a season {} of {}",
                    season, show.title
                ));
                return Ok(());
            }
            Selection::NoSuchEpisode { season, number } => {
                response.say(format!(
                    "I'm sorry, there does not appear to be an episode {}, season {} of {}",
                    number, season, show.title
                ));
                return Ok(());
            }
            Selection::OfferResume { partial, fallback } => {
                session.set_prompt(ConfirmationPrompt {
                    yes_action: PromptAction::StartEpisode,
                    yes_response: format!(
                        "Resuming this episode from Season {}: {}",
                        partial.parent_index, partial.title
                    ),
                    no_action: PromptAction::StartEpisode,
                    no_response: format!(
                        "Alright, then enjoy this episode from Season {}: {}",
                        fallback.parent_index, fallback.title
                    ),
                    media_key: partial.key.clone(),
                    offset: partial.view_offset,
                    player_name: player_name.to_string(),
                    alternate_media_key: Some(fallback.key.clone()),
                    alternate_offset: Some(0),
                });
                response.should_end_session(false).say(format!(
                    "It looks like you're part-way through the episode {}. Would you like to resume that one?",
                    partial.title
                ));
                return Ok(());
            }
            Selection::Play {
                episode,
                offset,
                speech,
            } => (episode, offset, speech),
        };
        debug!(
            "Selected {} of {} at offset {}",
            episode.to_display(),
            show.title,
            offset
        );

        response.card(
            "Plex",
            format!("Playing {}: {}", show.title, episode.title),
            "Playing Episode",
        );

        if confidence >= self.confirm_threshold {
            response.say(speech);
            let request = PlaybackRequest {
                player_name: player_name.to_string(),
                media_key: episode.key.clone(),
                offset,
            };
            self.play(&request).await?;
            return Ok(());
        }

        debug!(
            "Confidence {} below {}, asking for confirmation",
            confidence, self.confirm_threshold
        );
        let show_name = if episode.grandparent_title.is_empty() {
            show.title.as_str()
        } else {
            episode.grandparent_title.as_str()
        };
        let question = format!(
            "You would like to watch an episode of {}. Is that correct?",
            show_name
        );
        session.set_prompt(ConfirmationPrompt {
            yes_action: PromptAction::StartEpisode,
            yes_response: speech,
            no_action: PromptAction::EndSession,
            no_response: DECLINED.to_string(),
            media_key: episode.key.clone(),
            offset,
            player_name: player_name.to_string(),
            alternate_media_key: None,
            alternate_offset: None,
        });
        response.should_end_session(false).say(question);
        Ok(())
    }

    async fn play(&self, request: &PlaybackRequest) -> Result<()> {
        info!(
            "Playing {} at {} on '{}'",
            request.media_key, request.offset, request.player_name
        );
        play_media(self.server(), &self.identity, &self.commands, request).await?;
        Ok(())
    }

    fn apologise_on_error(&self, result: Result<()>, response: &mut Response) -> Result<()> {
        if let Err(e) = &result {
            error!("Error while talking to Plex: {}", e);
            response.say(UPSTREAM_APOLOGY);
        }
        result
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            AppError::InvalidArgument(format!("startShow must be provided with a {} option", name))
        })
}
