//! Dataset record normalization and the few-shot example pool.
//!
//! Dataset records are loosely-structured JSON with no fixed schema. Decoding
//! is a tagged-variant attempt in priority order (dialogue, then text, then
//! message, then opaque) and normalization is a total function: malformed or
//! missing fields degrade to a best-effort string, never an error.

use rand::seq::SliceRandom;
use serde_json::Value;

use crate::sanitizer::sanitize;

/// Maximum turns rendered from a dialogue record.
const MAX_DIALOGUE_TURNS: usize = 6;

/// Maximum length (chars) for examples derived from single-field records.
const MAX_SINGLE_FIELD_LEN: usize = 400;

/// Minimum length for a normalized example to be kept in the pool.
const MIN_EXAMPLE_LEN: usize = 10;

/// Built-in examples used when the derived pool is empty, so the prompt
/// assembler always has sampleable material.
const FALLBACK_EXAMPLES: [&str; 3] = [
    "Scammer: [SIMULATION] Hey, I saw your pics — you seem so sweet! Can we chat privately?\nTarget: Okay.\nScammer: I'm abroad for work, phone camera broken, can you send a selfie?",
    "Scammer: [SIMULATION] Hi! I'm new here, we seem similar. Can I add you on WhatsApp?\nTarget: Maybe. What's your number?\nScammer: I'll DM you, I prefer private chat.",
    "Scammer: [SIMULATION] I lost my wallet yesterday, can you help me send ₹500 for taxi? (SIMULATION - do not send money)\nTarget: Sorry, I can't.",
];

// ---------------------------------------------------------------------------
// Record decoding
// ---------------------------------------------------------------------------

/// The recognized shapes of a dataset record, checked in priority order.
enum RecordShape<'a> {
    Dialogue(&'a [Value]),
    Text(&'a str),
    Message(&'a str),
    Opaque(&'a Value),
}

impl<'a> RecordShape<'a> {
    fn decode(record: &'a Value) -> Self {
        if let Some(turns) = record.get("dialogue").and_then(Value::as_array) {
            return RecordShape::Dialogue(turns);
        }
        if let Some(text) = record.get("text").and_then(Value::as_str) {
            return RecordShape::Text(text);
        }
        if let Some(message) = record.get("message").and_then(Value::as_str) {
            return RecordShape::Message(message);
        }
        RecordShape::Opaque(record)
    }
}

/// Convert a dataset record into a canonical few-shot transcript snippet.
///
/// Dialogue records render up to 6 turns as `"Speaker: sanitized-text"`
/// lines; single-field and opaque records are sanitized and truncated to
/// 400 chars. Total function: never fails, whatever the input shape.
pub fn normalize_record(record: &Value) -> String {
    match RecordShape::decode(record) {
        RecordShape::Dialogue(turns) => turns
            .iter()
            .take(MAX_DIALOGUE_TURNS)
            .map(render_turn)
            .collect::<Vec<_>>()
            .join("\n"),
        RecordShape::Text(text) | RecordShape::Message(text) => {
            truncate_chars(&sanitize(text), MAX_SINGLE_FIELD_LEN)
        }
        RecordShape::Opaque(value) => {
            let serialized = serde_json::to_string(value).unwrap_or_default();
            truncate_chars(&sanitize(&serialized), MAX_SINGLE_FIELD_LEN)
        }
    }
}

/// Render one dialogue turn as `"Speaker: sanitized-text"`.
///
/// A turn may be a map with `speaker`/`text` (or `message`) fields, a
/// 2-element array of (speaker, text), or any other value coerced to text
/// with the speaker defaulted to "scammer".
fn render_turn(turn: &Value) -> String {
    let (speaker, text) = match turn {
        Value::Object(map) => {
            let speaker = map
                .get("speaker")
                .and_then(Value::as_str)
                .unwrap_or("scammer")
                .to_string();
            let text = map
                .get("text")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .or_else(|| map.get("message").and_then(Value::as_str))
                .unwrap_or("")
                .to_string();
            (speaker, text)
        }
        Value::Array(items) if items.len() >= 2 => {
            (coerce_to_text(&items[0]), coerce_to_text(&items[1]))
        }
        other => ("scammer".to_string(), coerce_to_text(other)),
    };
    format!("{}: {}", title_case(&speaker), sanitize(&text))
}

/// Coerce any JSON value to plain text (strings lose their quotes).
fn coerce_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Title-case a speaker name: first char uppercase, rest lowercase.
fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Truncate to `max` chars on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

// ---------------------------------------------------------------------------
// JSONL loader
// ---------------------------------------------------------------------------

/// Load newline-delimited JSON records from `path`, skipping blank and
/// unparseable lines. A missing file is not an error: the pool degrades to
/// the built-in fallback examples.
pub fn load_records(path: &std::path::Path) -> Vec<Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            tracing::warn!(path = %path.display(), "dataset not found, using built-in examples");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(v) => records.push(v),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "skipped unparseable dataset lines");
    }
    records
}

// ---------------------------------------------------------------------------
// Few-shot pool
// ---------------------------------------------------------------------------

/// Read-only pool of sanitized few-shot examples, built once at startup.
/// Safe to share across concurrent sessions without locking.
#[derive(Debug, Clone)]
pub struct ExamplePool {
    examples: Vec<String>,
}

impl ExamplePool {
    /// Build the pool from raw dataset records. Normalized results shorter
    /// than 10 chars are discarded as non-informative; an empty result set
    /// falls back to the three built-in examples.
    pub fn from_records(records: &[Value]) -> Self {
        let examples: Vec<String> = records
            .iter()
            .map(normalize_record)
            .filter(|ex| ex.chars().count() > MIN_EXAMPLE_LEN)
            .collect();

        if examples.is_empty() {
            tracing::info!("few-shot pool empty, using built-in fallback examples");
            Self::fallback()
        } else {
            tracing::info!(count = examples.len(), "few-shot pool built from dataset");
            Self { examples }
        }
    }

    /// The built-in fallback pool.
    pub fn fallback() -> Self {
        Self {
            examples: FALLBACK_EXAMPLES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Sample `min(n, pool_size)` distinct examples uniformly at random
    /// without replacement and join them with a blank-line separator.
    pub fn build_few_shots(&self, n: usize) -> String {
        let mut rng = rand::thread_rng();
        let sampled: Vec<&String> = self
            .examples
            .choose_multiple(&mut rng, n.min(self.examples.len()))
            .collect();
        sampled
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
