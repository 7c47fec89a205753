//! Fuzzy matching of spoken show names against the library catalog.
//!
//! Scores run from 0 (nothing in common) to 100 (identical after
//! normalization). The orchestrator compares the winning score against a
//! confirmation threshold to decide whether to ask "is that correct?".

use crate::types::{MatchResult, Show};
use std::collections::HashMap;

/// Confidence at or above which playback starts without a confirmation turn.
pub const CONFIRM_THRESHOLD: u8 = 40;

/// Scores how well a candidate string matches a query.
pub trait SimilarityScorer {
    /// Return a score in 0..=100.
    fn score(&self, query: &str, candidate: &str) -> u8;
}

/// Sørensen–Dice coefficient over character bigrams.
///
/// Case and whitespace are ignored, which suits speech-to-text output where
/// "the office" has to find "The Office (US)".
#[derive(Debug, Default, Clone, Copy)]
pub struct DiceScorer;

impl SimilarityScorer for DiceScorer {
    fn score(&self, query: &str, candidate: &str) -> u8 {
        let a = normalize(query);
        let b = normalize(candidate);

        if a == b {
            return if a.is_empty() { 0 } else { 100 };
        }
        if a.chars().count() < 2 || b.chars().count() < 2 {
            return 0;
        }

        let mut first = bigrams(&a);
        let total = a.chars().count() - 1 + b.chars().count() - 1;

        let mut shared = 0usize;
        for pair in pairs(&b) {
            if let Some(count) = first.get_mut(&pair) {
                if *count > 0 {
                    *count -= 1;
                    shared += 1;
                }
            }
        }

        ((2 * shared * 100) as f64 / total as f64).round() as u8
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn pairs(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

fn bigrams(s: &str) -> HashMap<(char, char), usize> {
    let mut map = HashMap::new();
    for pair in pairs(s) {
        *map.entry(pair).or_insert(0) += 1;
    }
    map
}

/// Pick the candidate whose key scores highest against `query`.
///
/// Ties keep the earliest candidate. An empty list, or a best score of zero,
/// yields no match.
pub fn find_best_match<T, F, S>(query: &str, candidates: &[T], key: F, scorer: &S) -> MatchResult<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
    S: SimilarityScorer + ?Sized,
{
    let mut best: Option<(&T, u8)> = None;

    for candidate in candidates {
        let score = scorer.score(query, key(candidate));
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((candidate, score)) if score > 0 => MatchResult {
            best_match: Some(candidate.clone()),
            confidence: score,
        },
        _ => MatchResult::none(),
    }
}

/// Resolve a spoken show name against the catalog by title.
pub fn resolve_show(spoken_name: &str, catalog: &[Show]) -> MatchResult<Show> {
    find_best_match(spoken_name, catalog, |show| show.title.as_str(), &DiceScorer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(key: &str, title: &str) -> Show {
        Show {
            rating_key: key.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_dice_identical_ignoring_case_and_spaces() {
        assert_eq!(DiceScorer.score("breaking bad", "Breaking Bad"), 100);
        assert_eq!(DiceScorer.score("BreakingBad", "breaking bad"), 100);
    }

    #[test]
    fn test_dice_unrelated_is_low() {
        assert_eq!(DiceScorer.score("abc", "xyz"), 0);
        assert!(DiceScorer.score("the wire", "breaking bad") < CONFIRM_THRESHOLD);
    }

    #[test]
    fn test_dice_partial_overlap() {
        let score = DiceScorer.score("the office", "The Office (US)");
        assert!(score >= CONFIRM_THRESHOLD && score < 100, "score {}", score);
    }

    #[test]
    fn test_dice_short_strings() {
        assert_eq!(DiceScorer.score("a", "b"), 0);
        assert_eq!(DiceScorer.score("", ""), 0);
        assert_eq!(DiceScorer.score("x", "X"), 100);
    }

    #[test]
    fn test_resolve_show_picks_best() {
        let catalog = vec![
            show("1", "Better Call Saul"),
            show("2", "Breaking Bad"),
            show("3", "Bad Batch"),
        ];

        let result = resolve_show("breaking bad", &catalog);
        assert_eq!(result.best_match.unwrap().rating_key, "2");
        assert_eq!(result.confidence, 100);
    }

    #[test]
    fn test_resolve_show_empty_catalog() {
        let result = resolve_show("anything", &[]);
        assert!(result.best_match.is_none());
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn test_resolve_show_nothing_in_common() {
        let catalog = vec![show("1", "Xyz")];
        assert!(resolve_show("abc", &catalog).best_match.is_none());
    }

    #[test]
    fn test_find_best_match_tie_keeps_first() {
        struct Constant;
        impl SimilarityScorer for Constant {
            fn score(&self, _query: &str, _candidate: &str) -> u8 {
                50
            }
        }

        let items = vec!["first".to_string(), "second".to_string()];
        let result = find_best_match("q", &items, |s| s.as_str(), &Constant);
        assert_eq!(result.best_match.as_deref(), Some("first"));
        assert_eq!(result.confidence, 50);
    }
}
