//! Display names for mixed media lists.

use crate::types::MediaItem;

/// Only this many list entries are considered, short enough to be read aloud.
pub const MAX_LISTED: usize = 6;

/// Show or movie names for the first [`MAX_LISTED`] items of a list.
///
/// Episodes are named after their show and movies after themselves. Other
/// item types are skipped but still count toward the limit.
pub fn names_from_list(items: &[MediaItem]) -> Vec<String> {
    items
        .iter()
        .take(MAX_LISTED)
        .filter_map(|item| match item.kind.as_str() {
            "episode" => item.grandparent_title.clone(),
            "movie" => Some(item.title.clone()),
            _ => None,
        })
        .collect()
}
