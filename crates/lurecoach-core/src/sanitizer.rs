//! PII sanitization for conversation text and dataset examples.
//!
//! `sanitize` decodes HTML entities, then redacts emails, phone numbers, and
//! URLs with fixed tokens. Entities are decoded first so entity-encoded PII
//! (e.g. `jane&#64;example.com`) is still caught. The replacement tokens do
//! not themselves match any redaction pattern, so sanitization is idempotent.

use regex::Regex;
use std::sync::LazyLock;

use crate::patterns::{EMAIL_RE, PHONE_RE, SENSITIVE_TERMS_RE, URL_RE};

/// Decimal numeric character references: `&#64;`.
static DEC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#([0-9]{1,7});").expect("decimal entity regex"));

/// Hexadecimal numeric character references: `&#x40;`.
static HEX_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#[xX]([0-9a-fA-F]{1,6});").expect("hex entity regex"));

/// Named entities that matter for reassembling PII. `&amp;` is decoded last
/// so it cannot manufacture new entity sequences out of already-decoded text.
const NAMED_ENTITIES: [(&str, &str); 7] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&amp;", "&"),
];

/// Redact emails, phone numbers, and URLs from `text`, in that order.
///
/// Empty input yields an empty string. Pure function, idempotent.
pub fn sanitize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let decoded = decode_entities(text);
    let s = EMAIL_RE.replace_all(&decoded, "[REDACTED_EMAIL]");
    let s = PHONE_RE.replace_all(&s, "[REDACTED_PHONE]");
    URL_RE.replace_all(&s, "[REDACTED_URL]").into_owned()
}

/// Replace sensitive credential terms (password, OTP, PIN, bank, account,
/// card, CVV) with `[REDACTED_SENSITIVE]`, case-insensitively.
///
/// Applied to live user input before it is stored or sent anywhere. Dataset
/// examples go through [`sanitize`] instead.
pub fn strip_sensitive_terms(text: &str) -> String {
    SENSITIVE_TERMS_RE
        .replace_all(text, "[REDACTED_SENSITIVE]")
        .into_owned()
}

/// Decode HTML character references (numeric decimal/hex plus a small named
/// table) so encoded PII cannot slip past the redaction patterns.
fn decode_entities(text: &str) -> String {
    let mut out = HEX_ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned();
    out = DEC_ENTITY_RE
        .replace_all(&out, |caps: &regex::Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned();
    for (entity, replacement) in NAMED_ENTITIES {
        out = out.replace(entity, replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn email_redacted() {
        let out = sanitize("write to jane.doe@example.com today");
        assert!(out.contains("[REDACTED_EMAIL]"));
        assert!(!out.contains("jane.doe@example.com"));
    }

    #[test]
    fn phone_redacted() {
        let out = sanitize("call +91 98765 43210 now");
        assert!(out.contains("[REDACTED_PHONE]"));
        assert!(!out.contains("98765"));
    }

    #[test]
    fn url_redacted() {
        assert!(sanitize("go to https://scam.example/login").contains("[REDACTED_URL]"));
        assert!(sanitize("go to www.scam.example").contains("[REDACTED_URL]"));
    }

    #[test]
    fn entity_encoded_email_still_caught() {
        let out = sanitize("jane&#64;example.com");
        assert!(out.contains("[REDACTED_EMAIL]"));
        assert!(!out.contains("example.com"));
    }

    #[test]
    fn hex_entity_decoded() {
        let out = sanitize("jane&#x40;example.com");
        assert!(out.contains("[REDACTED_EMAIL]"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "plain text",
            "jane@example.com and +1 222 333 4444 and www.x.io",
            "&#64; &amp; <b>",
            "",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn strip_sensitive_terms_replaces_all_occurrences() {
        let out = strip_sensitive_terms("my PASSWORD and my otp and my card");
        assert!(!out.to_lowercase().contains("password"));
        assert!(!out.contains("otp"));
        assert_eq!(out.matches("[REDACTED_SENSITIVE]").count(), 3);
    }

    #[test]
    fn strip_sensitive_terms_leaves_clean_text_alone() {
        assert_eq!(strip_sensitive_terms("hello there"), "hello there");
    }
}
