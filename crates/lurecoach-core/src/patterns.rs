//! Fixed pattern registry for PII redaction and red-flag detection.
//!
//! All patterns are process-wide, read-only statics. Consumers reference
//! them by name; nothing here is configurable at runtime.

use regex::Regex;
use std::sync::LazyLock;

/// Matches email addresses (local part, `@`, dotted domain).
pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9.\-_+]+@[a-zA-Z0-9\-_]+\.[a-zA-Z0-9\-.]+").expect("email regex")
});

/// Matches phone numbers: optional `+`, then 8+ characters of digits,
/// spaces, hyphens, and parentheses, bounded by digits at both ends.
pub static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d\s\-()]{6,}\d").expect("phone regex"));

/// Matches URLs (http/https) and bare `www.` prefixes.
pub static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("url regex"));

/// Sensitive credential terms stripped from live user input before it is
/// stored or sent anywhere.
pub static SENSITIVE_TERMS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)password|otp|pin|bank|account|card|cvv").expect("sensitive terms regex")
});

// ---------------------------------------------------------------------------
// Red-flag phrase patterns (whole-word, evaluated on lower-cased text)
// ---------------------------------------------------------------------------

/// Requests for personal photos.
pub static PHOTO_REQUEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(selfie|photo|picture)\b").expect("photo regex"));

/// Requests for money or transfers.
pub static MONEY_REQUEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(money|transfer|send .* rupees|wallet|pay)\b").expect("money regex")
});

/// Excuses for refusing live video verification.
pub static VIDEO_AVOIDANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(can't video|camera broken|no video|can't call|avoid video|no camera)\b")
        .expect("video avoidance regex")
});

/// Attempts to move the conversation to a private platform.
pub static PLATFORM_MIGRATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(whatsapp|telegram|private chat|dm me|message me privately)\b")
        .expect("platform migration regex")
});

/// Premature affection phrases.
pub static AFFECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(love you|i love you|miss you|so sweet|so beautiful)\b")
        .expect("affection regex")
});

/// Direct requests for credentials or financial data.
pub static SENSITIVE_REQUEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(password|otp|one-time|pin|bank|account)\b").expect("sensitive request regex")
});
