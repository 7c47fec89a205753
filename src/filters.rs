//! Episode list filters used by the selection policies.

use crate::types::Episode;
use std::cmp::Ordering;

/// Drop episodes whose media has been deleted. Order is preserved.
pub fn filter_available(episodes: &[Episode]) -> Vec<Episode> {
    episodes
        .iter()
        .filter(|ep| ep.is_available())
        .cloned()
        .collect()
}

/// Keep the best rated fraction of `episodes`.
///
/// Episodes are sorted by rating, highest first, with unrated episodes after
/// all rated ones. An episode at sorted position `i` survives when
/// `i / len <= top_percent`, so `0.5` keeps roughly the top half. `None` or
/// `0.0` leaves the list untouched.
pub fn filter_top_rated(episodes: &[Episode], top_percent: Option<f64>) -> Vec<Episode> {
    let top_percent = match top_percent {
        Some(p) if p > 0.0 => p,
        _ => return episodes.to_vec(),
    };

    let mut sorted = episodes.to_vec();
    sorted.sort_by(|a, b| compare_rating_desc(a, b));

    let len = sorted.len() as f64;
    sorted
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i as f64 / len <= top_percent)
        .map(|(_, ep)| ep)
        .collect()
}

fn compare_rating_desc(a: &Episode, b: &Episode) -> Ordering {
    match (a.rating, b.rating) {
        (Some(ra), Some(rb)) => rb.partial_cmp(&ra).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
