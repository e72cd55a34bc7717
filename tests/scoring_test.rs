//! Property tests for keyword scoring

use proptest::prelude::*;
use ticket_triage::models::{Importance, Sentiment, Urgency};
use ticket_triage::scoring::ScoringRules;

const URGENT: [&str; 2] = ["water", "leak"];
const NEGATIVE: [&str; 2] = ["angry", "upset"];

/// Text built from letters that cannot spell any default keyword.
fn filler() -> impl Strategy<Value = String> {
    "[bcdfghjmoqsvxz ,.!?0-9]{0,80}"
}

fn keyword(words: &'static [&'static str]) -> impl Strategy<Value = String> {
    (prop::sample::select(words), any::<bool>()).prop_map(|(w, upper)| {
        if upper {
            w.to_uppercase()
        } else {
            w.to_string()
        }
    })
}

proptest! {
    #[test]
    fn urgent_keyword_anywhere_is_urgent(
        prefix in filler(),
        word in keyword(&URGENT),
        suffix in filler(),
    ) {
        let message = format!("{prefix}{word}{suffix}");
        prop_assert_eq!(ScoringRules::default().score(&message).urgency, Urgency::Urgent);
    }

    #[test]
    fn no_urgent_keyword_is_routine(message in filler()) {
        prop_assert_eq!(ScoringRules::default().score(&message).urgency, Urgency::Routine);
    }

    #[test]
    fn negative_keyword_anywhere_is_negative(
        prefix in filler(),
        word in keyword(&NEGATIVE),
        suffix in filler(),
    ) {
        let message = format!("{prefix}{word}{suffix}");
        prop_assert_eq!(ScoringRules::default().score(&message).sentiment, Sentiment::Negative);
    }

    #[test]
    fn no_negative_keyword_is_neutral(message in filler()) {
        prop_assert_eq!(ScoringRules::default().score(&message).sentiment, Sentiment::Neutral);
    }

    #[test]
    fn importance_follows_length(message in "\\PC{0,400}") {
        let expected = if message.chars().count() > 200 {
            Importance::High
        } else {
            Importance::Normal
        };
        prop_assert_eq!(ScoringRules::default().score(&message).importance, expected);
    }

    #[test]
    fn scoring_is_deterministic(message in "\\PC{0,300}") {
        let rules = ScoringRules::default();
        prop_assert_eq!(rules.score(&message), rules.score(&message));
    }
}
