//! Heuristic red-flag detection for catphishing conversations.
//!
//! The rule set is a data-driven table (pattern, optional length gate, flag
//! label) evaluated in fixed order over the lower-cased input. Each rule
//! fires at most once; a message may trigger any subset of rules. Pure and
//! stateless: no history or session dependency.

use regex::Regex;
use std::sync::LazyLock;

use crate::patterns::{
    AFFECTION_RE, MONEY_REQUEST_RE, PHOTO_REQUEST_RE, PLATFORM_MIGRATION_RE,
    SENSITIVE_REQUEST_RE, VIDEO_AVOIDANCE_RE,
};

/// One detection rule: a phrase pattern, an optional maximum message length
/// (in chars), and the human-readable flag it produces.
struct FlagRule {
    pattern: &'static LazyLock<Regex>,
    /// Rule only fires when the message is shorter than this many chars.
    /// Used to avoid flagging long messages that merely mention a phrase in
    /// passing (quoted or reported speech).
    max_chars: Option<usize>,
    label: &'static str,
}

/// Rule table in evaluation order. Output flags preserve this order.
static RULES: [FlagRule; 6] = [
    FlagRule {
        pattern: &PHOTO_REQUEST_RE,
        max_chars: None,
        label: "Asks for personal photo/selfie",
    },
    FlagRule {
        pattern: &MONEY_REQUEST_RE,
        max_chars: None,
        label: "Asks for money/transfer",
    },
    FlagRule {
        pattern: &VIDEO_AVOIDANCE_RE,
        max_chars: None,
        label: "Avoids live verification/video call",
    },
    FlagRule {
        pattern: &PLATFORM_MIGRATION_RE,
        max_chars: None,
        label: "Wants to move chat to private app",
    },
    FlagRule {
        pattern: &AFFECTION_RE,
        max_chars: Some(120),
        label: "Fast affection / emotional push",
    },
    FlagRule {
        pattern: &SENSITIVE_REQUEST_RE,
        max_chars: None,
        label: "Sensitive data request (password/OTP/bank) - CRITICAL",
    },
];

/// Classify a message against the fixed rule table.
///
/// Returns the flags in rule order, each at most once. Empty input returns
/// an empty vec.
pub fn detect_red_flags(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    let char_count = lowered.chars().count();

    RULES
        .iter()
        .filter(|rule| {
            if let Some(max) = rule.max_chars {
                if char_count >= max {
                    return false;
                }
            }
            rule.pattern.is_match(&lowered)
        })
        .map(|rule| rule.label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_no_flags() {
        assert!(detect_red_flags("").is_empty());
    }

    #[test]
    fn benign_message_no_flags() {
        assert!(detect_red_flags("Nice weather today, how was your weekend?").is_empty());
    }

    #[test]
    fn password_request_is_critical_only() {
        let flags = detect_red_flags("send me your password");
        assert_eq!(
            flags,
            vec!["Sensitive data request (password/OTP/bank) - CRITICAL"]
        );
    }

    #[test]
    fn photo_request_flagged() {
        assert_eq!(
            detect_red_flags("Can you send a selfie?"),
            vec!["Asks for personal photo/selfie"]
        );
    }

    #[test]
    fn money_request_flagged() {
        let flags = detect_red_flags("please send 500 rupees for the taxi");
        assert!(flags.contains(&"Asks for money/transfer"));
    }

    #[test]
    fn video_avoidance_flagged() {
        assert_eq!(
            detect_red_flags("sorry my camera broken today"),
            vec!["Avoids live verification/video call"]
        );
    }

    #[test]
    fn platform_migration_flagged() {
        assert_eq!(
            detect_red_flags("add me on WhatsApp instead"),
            vec!["Wants to move chat to private app"]
        );
    }

    #[test]
    fn short_affection_flagged() {
        assert_eq!(
            detect_red_flags("i love you"),
            vec!["Fast affection / emotional push"]
        );
    }

    #[test]
    fn long_message_mentioning_affection_not_flagged() {
        let padding = "we talked about the book club and the weather for a while. ".repeat(3);
        let long = format!("{padding}then he said i love you which felt odd");
        assert!(long.chars().count() > 120);
        assert!(detect_red_flags(&long).is_empty());
    }

    #[test]
    fn case_insensitive_matching() {
        assert!(!detect_red_flags("SEND ME YOUR OTP").is_empty());
    }

    #[test]
    fn multiple_flags_in_rule_order() {
        // 50 chars: under the affection length gate.
        let msg = "Can I get your OTP? Also send a selfie, I love you";
        let flags = detect_red_flags(msg);
        assert_eq!(
            flags,
            vec![
                "Asks for personal photo/selfie",
                "Fast affection / emotional push",
                "Sensitive data request (password/OTP/bank) - CRITICAL",
            ]
        );
    }

    #[test]
    fn each_rule_fires_at_most_once() {
        let flags = detect_red_flags("selfie photo picture selfie");
        assert_eq!(flags.len(), 1);
    }
}
