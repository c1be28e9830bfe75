//! Core text pipeline for the lurecoach catphishing-awareness demo:
//! PII sanitization, red-flag detection, few-shot example normalization,
//! and prompt assembly for the hosted roleplay model.

pub mod chat;
pub mod dataset;
pub mod llm_client;
pub mod patterns;
pub mod prompts;
pub mod red_flags;
pub mod sanitizer;

pub use chat::{ChatEngine, ChatSession, ConversationTurn, Role, SendOutcome};
pub use dataset::{load_records, normalize_record, ExamplePool};
pub use prompts::{enforce_marker, Persona, PersonaTemplates, PromptBuilder};
pub use red_flags::detect_red_flags;
pub use sanitizer::{sanitize, strip_sensitive_terms};
