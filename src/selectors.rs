//! Episode selection policies.
//!
//! Every selector is a pure function over an episode list. Randomness is
//! injected so callers (and tests) control the generator.

use crate::error::{AppError, Result};
use crate::filters::{filter_available, filter_top_rated};
use crate::types::Episode;
use rand::Rng;
use rand::seq::SliceRandom;

/// Episodes numbered above this are read as compact `SEE` notation when no
/// season is given, so `203` means season 2, episode 3.
const COMPACT_NOTATION_MIN: i64 = 100;

/// Outcome of an explicit season/episode request.
#[derive(Clone, Debug, PartialEq)]
pub enum ExplicitPick {
    Found {
        episode: Episode,
        season: i64,
        number: i64,
    },
    NoSuchSeason {
        season: i64,
    },
    NoSuchEpisode {
        season: i64,
        number: i64,
    },
}

/// The earliest unwatched episode by (season, episode).
///
/// Watched episodes are skipped entirely, even when they come first.
pub fn first_unwatched(episodes: &[Episode]) -> Option<Episode> {
    episodes
        .iter()
        .filter(|ep| !ep.is_watched())
        .min_by_key(|ep| (ep.parent_index, ep.index))
        .cloned()
}

/// The first partially watched episode in the original list order.
///
/// Filtering only decides which episodes qualify; it does not reorder them.
pub fn resume_candidate(episodes: &[Episode], top_percent: Option<f64>) -> Option<Episode> {
    let qualifying = playable(episodes, top_percent);
    episodes
        .iter()
        .filter(|ep| ep.view_offset > 0)
        .find(|ep| qualifying.iter().any(|q| q.key == ep.key))
        .cloned()
}

/// A uniformly random episode from the filtered list.
///
/// Fails with [`AppError::InvalidState`] when filtering leaves nothing to
/// pick from.
pub fn random_episode<R: Rng + ?Sized>(
    episodes: &[Episode],
    top_percent: Option<f64>,
    rng: &mut R,
) -> Result<Episode> {
    playable(episodes, top_percent)
        .choose(rng)
        .cloned()
        .ok_or_else(|| {
            AppError::InvalidState("no available episodes to choose from".to_string())
        })
}

/// Resolve an explicit season/episode request.
///
/// Without a season, an episode number above 100 is split into season and
/// episode (`203` is S02E03), otherwise season 1 is assumed. A season
/// without an episode number asks for episode 0, which Plex uses for
/// specials.
pub fn explicit_episode(
    episodes: &[Episode],
    season: Option<i64>,
    episode: Option<i64>,
) -> ExplicitPick {
    let mut number = episode.unwrap_or(0);
    let season = match season {
        Some(s) => s,
        None if number > COMPACT_NOTATION_MIN => {
            let s = number / 100;
            number %= 100;
            s
        }
        None => 1,
    };

    let in_season: Vec<&Episode> = episodes
        .iter()
        .filter(|ep| ep.parent_index == season)
        .collect();
    if in_season.is_empty() {
        return ExplicitPick::NoSuchSeason { season };
    }

    match in_season.into_iter().find(|ep| ep.index == number) {
        Some(ep) => ExplicitPick::Found {
            episode: ep.clone(),
            season,
            number,
        },
        None => ExplicitPick::NoSuchEpisode { season, number },
    }
}

fn playable(episodes: &[Episode], top_percent: Option<f64>) -> Vec<Episode> {
    filter_top_rated(&filter_available(episodes), top_percent)
}
