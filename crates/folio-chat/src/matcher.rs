//! Keyword intent matcher.
//!
//! Maps one free-text input to the first catalogue entry whose keywords
//! occur in it. Matching is plain substring containment on the lowercased
//! input, so short keywords also fire inside longer words ("hi" inside
//! "history"). Catalogue order is the only tie-break.

use std::sync::Arc;

use rand::Rng;

use crate::types::TopicEntry;

// =============================================================================
// Response selection strategy
// =============================================================================

/// Chooses one candidate out of `len`.
pub trait ResponseSelector: Send + Sync {
    /// Return an index in `0..len`. Callers never pass `len == 0`.
    fn select(&self, len: usize) -> usize;
}

/// Uniform random choice backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl ResponseSelector for RandomSelector {
    fn select(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Always picks the same index, clamped to the last candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedSelector(pub usize);

impl ResponseSelector for FixedSelector {
    fn select(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

// =============================================================================
// Matching
// =============================================================================

/// Lowercase an input for keyword containment checks.
pub fn normalize(input: &str) -> String {
    input.to_lowercase()
}

/// True if any keyword is a substring of the already-normalized input.
pub fn contains_any(normalized: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| normalized.contains(k.as_str()))
}

/// Outcome of matching one input against the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult<'a> {
    Matched {
        entry: &'a TopicEntry,
        response: &'a str,
    },
    Unmatched,
}

impl<'a> MatchResult<'a> {
    /// Topic id of the matched entry, if any.
    pub fn topic(&self) -> Option<&'a str> {
        match self {
            MatchResult::Matched { entry, .. } => Some(entry.topic.as_str()),
            MatchResult::Unmatched => None,
        }
    }
}

/// First-match keyword matcher with an injected response selector.
#[derive(Clone)]
pub struct IntentMatcher {
    selector: Arc<dyn ResponseSelector>,
}

impl Default for IntentMatcher {
    fn default() -> Self {
        Self::new(Arc::new(RandomSelector))
    }
}

impl IntentMatcher {
    pub fn new(selector: Arc<dyn ResponseSelector>) -> Self {
        Self { selector }
    }

    /// Match `input` against `topics` in order.
    ///
    /// Returns the first entry with any keyword contained in the lowercased
    /// input, plus one of its responses, or [`MatchResult::Unmatched`].
    pub fn match_input<'a>(&self, input: &str, topics: &'a [TopicEntry]) -> MatchResult<'a> {
        let normalized = normalize(input);
        let Some(entry) = topics
            .iter()
            .find(|entry| contains_any(&normalized, &entry.keywords))
        else {
            tracing::debug!("No catalogue topic matched");
            return MatchResult::Unmatched;
        };

        match self.choose(&entry.responses) {
            Some(response) => {
                tracing::debug!(topic = %entry.topic, "Catalogue topic matched");
                MatchResult::Matched {
                    entry,
                    response: response.as_str(),
                }
            }
            // Validated catalogues never have empty response lists.
            None => MatchResult::Unmatched,
        }
    }

    /// Pick one item with the configured selector.
    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.selector.select(items.len()).min(items.len() - 1);
        items.get(idx)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(topic: &str, keywords: &[&str], responses: &[&str]) -> TopicEntry {
        TopicEntry {
            topic: topic.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
            follow_up: None,
        }
    }

    fn fixed(idx: usize) -> IntentMatcher {
        IntentMatcher::new(Arc::new(FixedSelector(idx)))
    }

    // ---- Selectors ----

    #[test]
    fn test_fixed_selector_clamps() {
        assert_eq!(FixedSelector(0).select(3), 0);
        assert_eq!(FixedSelector(2).select(3), 2);
        assert_eq!(FixedSelector(10).select(3), 2);
    }

    #[test]
    fn test_random_selector_in_range() {
        let selector = RandomSelector;
        for _ in 0..200 {
            assert!(selector.select(4) < 4);
        }
        assert_eq!(selector.select(1), 0);
    }

    #[test]
    fn test_choose_empty_is_none() {
        let items: Vec<String> = vec![];
        assert!(fixed(0).choose(&items).is_none());
    }

    // ---- Matching ----

    #[test]
    fn test_greeting_scenario() {
        let topics = vec![entry("greeting", &["hi", "hello"], &["Hello!"])];
        let result = fixed(0).match_input("hey hello there", &topics);
        assert_eq!(result.topic(), Some("greeting"));
        assert!(matches!(result, MatchResult::Matched { response: "Hello!", .. }));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let topics = vec![entry("contact", &["email"], &["Mail me."])];
        let result = fixed(0).match_input("What is his EMAIL?", &topics);
        assert_eq!(result.topic(), Some("contact"));
    }

    #[test]
    fn test_unmatched_input() {
        let topics = vec![entry("greeting", &["hello"], &["Hello!"])];
        let result = fixed(0).match_input("quantum chromodynamics", &topics);
        assert_eq!(result, MatchResult::Unmatched);
        assert!(result.topic().is_none());
    }

    #[test]
    fn test_empty_catalogue_is_unmatched() {
        assert_eq!(fixed(0).match_input("hello", &[]), MatchResult::Unmatched);
    }

    #[test]
    fn test_substring_matches_inside_words() {
        let topics = vec![entry("greeting", &["hi"], &["Hello!"])];
        let result = fixed(0).match_input("tell me your history", &topics);
        assert_eq!(result.topic(), Some("greeting"));
    }

    #[test]
    fn test_catalogue_order_is_precedence() {
        let topics = vec![
            entry("skill_validation", &["using react"], &["Yes."]),
            entry("frontend", &["react"], &["React builds empires."]),
        ];
        let result = fixed(0).match_input("have you been using react and vue?", &topics);
        assert_eq!(result.topic(), Some("skill_validation"));

        let reversed: Vec<TopicEntry> = topics.into_iter().rev().collect();
        let result = fixed(0).match_input("have you been using react and vue?", &reversed);
        assert_eq!(result.topic(), Some("frontend"));
    }

    #[test]
    fn test_earlier_entry_wins_when_both_keyword_sets_present() {
        let topics = vec![
            entry("a", &["alpha"], &["A"]),
            entry("b", &["beta"], &["B"]),
        ];
        let result = fixed(0).match_input("beta then alpha", &topics);
        assert_eq!(result.topic(), Some("a"));
    }

    #[test]
    fn test_selector_picks_response() {
        let topics = vec![entry("joke", &["joke"], &["one", "two", "three"])];
        let result = fixed(1).match_input("tell me a joke", &topics);
        assert!(matches!(result, MatchResult::Matched { response: "two", .. }));
    }

    #[test]
    fn test_matching_is_idempotent_with_pinned_selector() {
        let topics = vec![
            entry("joke", &["joke"], &["one", "two", "three"]),
            entry("music", &["music"], &["lofi"]),
        ];
        let matcher = fixed(2);
        let first = matcher.match_input("a joke about music", &topics);
        let second = matcher.match_input("a joke about music", &topics);
        assert_eq!(first, second);
        assert_eq!(first.topic(), Some("joke"));
    }

    #[test]
    fn test_every_keyword_alone_matches_its_topic() {
        let topics = vec![
            entry("greeting", &["hello", "hey"], &["Hello!", "Hey!"]),
            entry("contact", &["email", "phone"], &["Reach out."]),
            entry("music", &["music", "song"], &["Lo-fi."]),
        ];
        let matcher = IntentMatcher::default();
        for (i, e) in topics.iter().enumerate() {
            for k in &e.keywords {
                let shadowed = topics[..i]
                    .iter()
                    .any(|earlier| contains_any(k, &earlier.keywords));
                if shadowed {
                    continue;
                }
                match matcher.match_input(k, &topics) {
                    MatchResult::Matched { entry, response } => {
                        assert_eq!(entry.topic, e.topic);
                        assert!(e.responses.iter().any(|r| r == response));
                    }
                    MatchResult::Unmatched => panic!("keyword {k} did not match"),
                }
            }
        }
    }

    #[test]
    fn test_contains_any() {
        let keywords = vec!["https".to_string(), "tls".to_string()];
        assert!(contains_any("i think https", &keywords));
        assert!(!contains_any("http only", &keywords));
        assert!(!contains_any("anything", &[]));
    }
}
