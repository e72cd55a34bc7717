//! Keyword scoring of tenant messages
//!
//! Labels depend only on the message being scored. Earlier replies on the
//! same ticket are not consulted.

use crate::models::{Importance, Scores, Sentiment, Urgency};

/// Default words that mark a message as urgent
pub const DEFAULT_URGENCY_KEYWORDS: [&str; 2] = ["water", "leak"];
/// Default words that mark a message as negative
pub const DEFAULT_NEGATIVE_KEYWORDS: [&str; 2] = ["angry", "upset"];
/// Messages longer than this many characters are important
pub const DEFAULT_IMPORTANCE_THRESHOLD: usize = 200;

/// Keyword lists and thresholds used to label a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringRules {
    urgency_keywords: Vec<String>,
    negative_keywords: Vec<String>,
    importance_threshold: usize,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self::new(
            DEFAULT_URGENCY_KEYWORDS,
            DEFAULT_NEGATIVE_KEYWORDS,
            DEFAULT_IMPORTANCE_THRESHOLD,
        )
    }
}

impl ScoringRules {
    /// Create rules from keyword lists.
    ///
    /// Keywords are trimmed and lowercased; blank entries are dropped so an
    /// empty string can never match every message.
    pub fn new<U, N>(urgency_keywords: U, negative_keywords: N, importance_threshold: usize) -> Self
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            urgency_keywords: normalize_keywords(urgency_keywords),
            negative_keywords: normalize_keywords(negative_keywords),
            importance_threshold,
        }
    }

    /// Words that mark a message as urgent
    #[must_use]
    pub fn urgency_keywords(&self) -> &[String] {
        &self.urgency_keywords
    }

    /// Words that mark a message as negative
    #[must_use]
    pub fn negative_keywords(&self) -> &[String] {
        &self.negative_keywords
    }

    /// Length above which a message counts as important
    #[must_use]
    pub const fn importance_threshold(&self) -> usize {
        self.importance_threshold
    }

    /// Label a message. Matching is a case-insensitive substring search.
    #[must_use]
    pub fn score(&self, message: &str) -> Scores {
        let lower = message.to_lowercase();

        let urgency = if contains_any(&lower, &self.urgency_keywords) {
            Urgency::Urgent
        } else {
            Urgency::Routine
        };

        let importance = if message.chars().count() > self.importance_threshold {
            Importance::High
        } else {
            Importance::Normal
        };

        let sentiment = if contains_any(&lower, &self.negative_keywords) {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };

        Scores {
            urgency,
            importance,
            sentiment,
        }
    }
}

fn normalize_keywords<I>(keywords: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_message() {
        let scores = ScoringRules::default().score("There is a water leak in unit 4B, tenant is angry");
        assert_eq!(scores.urgency, Urgency::Urgent);
        assert_eq!(scores.importance, Importance::Normal);
        assert_eq!(scores.sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_plain_message_is_default() {
        let scores = ScoringRules::default().score("Could someone look at the doorbell?");
        assert_eq!(scores, Scores::default());
    }

    #[test]
    fn test_matching_ignores_case() {
        let scores = ScoringRules::default().score("WATER everywhere and I am UPSET");
        assert_eq!(scores.urgency, Urgency::Urgent);
        assert_eq!(scores.sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_substring_match() {
        // "leaking" contains "leak"
        let scores = ScoringRules::default().score("The tap is leaking");
        assert_eq!(scores.urgency, Urgency::Urgent);
    }

    #[test]
    fn test_importance_boundary() {
        let rules = ScoringRules::default();
        assert_eq!(rules.score(&"a".repeat(200)).importance, Importance::Normal);
        assert_eq!(rules.score(&"a".repeat(201)).importance, Importance::High);
    }

    #[test]
    fn test_importance_counts_characters_not_bytes() {
        // 150 two-byte characters is 300 bytes but only 150 characters
        let message = "é".repeat(150);
        assert_eq!(ScoringRules::default().score(&message).importance, Importance::Normal);
    }

    #[test]
    fn test_custom_keywords_are_normalized() {
        let rules = ScoringRules::new(["  FLOOD "], ["", "Furious"], 10);
        assert_eq!(rules.urgency_keywords(), ["flood".to_string()]);
        assert_eq!(rules.negative_keywords(), ["furious".to_string()]);

        let scores = rules.score("flood, and I'm furious");
        assert_eq!(scores.urgency, Urgency::Urgent);
        assert_eq!(scores.importance, Importance::High);
        assert_eq!(scores.sentiment, Sentiment::Negative);

        // default keywords no longer apply
        assert_eq!(rules.score("water").urgency, Urgency::Routine);
    }

    #[test]
    fn test_empty_keyword_lists_never_match() {
        let rules = ScoringRules::new(Vec::<String>::new(), Vec::<String>::new(), 200);
        assert_eq!(rules.score("water leak angry").urgency, Urgency::Routine);
        assert_eq!(rules.score("water leak angry").sentiment, Sentiment::Neutral);
    }
}
