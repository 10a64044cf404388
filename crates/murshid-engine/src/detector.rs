//! Phrase detection — recognized devotional and engagement expressions.

use murshid_core::config::{ActionRule, DetectedAction};

/// Scans messages for recognized phrases and emits point-bearing events.
///
/// Matching is case-insensitive substring search over the configured
/// phrase table. A rule fires at most once per message no matter how many
/// times its phrases repeat; independent rules may all fire on the same
/// message. Pure — no side effects, no clock.
pub struct ActionDetector {
    rules: Vec<CompiledRule>,
}

struct CompiledRule {
    action: DetectedAction,
    phrases: Vec<String>,
}

impl ActionDetector {
    /// Compile the configured rules (phrases lowercased once up front).
    pub fn new(rules: &[ActionRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| CompiledRule {
                action: DetectedAction {
                    kind: rule.kind,
                    points: rule.points,
                },
                phrases: rule.phrases.iter().map(|p| p.to_lowercase()).collect(),
            })
            .collect();
        Self { rules }
    }

    /// Detect actions in a message. Returns the events in table order and
    /// their summed base points — multiplier-free; temporal multipliers
    /// are the ledger's concern.
    pub fn detect(&self, message: &str) -> (Vec<DetectedAction>, u32) {
        let haystack = message.to_lowercase();

        let mut events = Vec::new();
        let mut total = 0u32;
        for rule in &self.rules {
            if rule.phrases.iter().any(|p| haystack.contains(p.as_str())) {
                events.push(rule.action);
                total += rule.action.points;
            }
        }

        (events, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murshid_core::config::{ActionKind, Config};

    fn detector() -> ActionDetector {
        ActionDetector::new(&Config::default().gamification.actions)
    }

    #[test]
    fn test_unmatched_message_yields_nothing() {
        let (events, points) = detector().detect("what should I focus on today?");
        assert!(events.is_empty());
        assert_eq!(points, 0);
    }

    #[test]
    fn test_two_distinct_phrases_yield_two_events() {
        let (events, points) = detector().detect("Bismillah, alhamdulillah !");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ActionKind::Bismillah);
        assert_eq!(events[0].points, 15);
        assert_eq!(events[1].kind, ActionKind::Alhamdulillah);
        assert_eq!(events[1].points, 20);
        assert_eq!(points, 35);
    }

    #[test]
    fn test_repeated_phrase_fires_once() {
        let (events, points) = detector().detect("alhamdulillah, alhamdulillah, alhamdulillah");
        assert_eq!(events.len(), 1);
        assert_eq!(points, 20);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let (events, _) = detector().detect("SUBHANALLAH!");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ActionKind::Subhanallah);
    }

    #[test]
    fn test_arabic_script_matches() {
        let (events, points) = detector().detect("اليوم قلت الحمد لله كثيرا");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ActionKind::Alhamdulillah);
        assert_eq!(points, 20);
    }

    #[test]
    fn test_gratitude_is_engagement_not_dhikr() {
        let (events, _) = detector().detect("thank you for yesterday");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ActionKind::Gratitude);
        assert!(!events[0].kind.is_dhikr());
    }
}
