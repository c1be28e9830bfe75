//! In-memory chat sessions and the message pipeline.
//!
//! A session owns its conversation history exclusively; nothing is shared
//! across sessions and nothing is persisted. The engine itself carries no
//! per-call mutable state: the pattern registry and the few-shot pool are
//! read-only, so one engine safely serves concurrent sessions.

use anyhow::Result;
use std::sync::Arc;

use crate::llm_client::{LlmClient, LlmRequest};
use crate::prompts::{enforce_marker, Persona, PromptBuilder};
use crate::red_flags::detect_red_flags;
use crate::sanitizer::{sanitize, strip_sensitive_terms};

/// Default number of few-shot examples sampled into each prompt.
const DEFAULT_FEW_SHOT_COUNT: usize = 4;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
            Role::System => "system",
        }
    }
}

/// A single turn in a chat session.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    /// ISO-8601 timestamp.
    pub timestamp: String,
}

impl ConversationTurn {
    fn now(role: Role, text: String) -> Self {
        Self {
            role,
            text,
            timestamp: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        }
    }
}

/// A chat session: persona plus append-only conversation history.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: String,
    pub persona: Persona,
    pub turns: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new(persona: Persona) -> Self {
        Self {
            id: format!("chat-{}", uuid::Uuid::new_v4()),
            persona,
            turns: Vec::new(),
        }
    }

    /// Clear the conversation history. The only way turns are ever removed.
    pub fn reset(&mut self) {
        self.turns.clear();
    }
}

/// Result of sending one user message through the pipeline.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// The marker-prefixed model reply, as stored in the session.
    pub reply: String,
    /// Red flags detected in the reply (Attacker sessions only).
    pub flags: Vec<&'static str>,
    /// True when sensitive terms were stripped from the user's input.
    pub input_was_redacted: bool,
}

/// Drives the message pipeline: sanitize input, assemble the prompt, call
/// the model, enforce the marker invariant, and surface red flags.
pub struct ChatEngine {
    builder: PromptBuilder,
    client: Arc<dyn LlmClient>,
    model: String,
    few_shot_count: usize,
}

impl ChatEngine {
    pub fn new(builder: PromptBuilder, client: Arc<dyn LlmClient>, model: String) -> Self {
        Self {
            builder,
            client,
            model,
            few_shot_count: DEFAULT_FEW_SHOT_COUNT,
        }
    }

    pub fn with_few_shot_count(mut self, count: usize) -> Self {
        self.few_shot_count = count;
        self
    }

    /// Send a user message in a session and store the resulting turns.
    ///
    /// A model failure never surfaces as an error: it becomes an in-band,
    /// marker-prefixed error notice stored and returned like any reply.
    pub async fn send_message(
        &self,
        session: &mut ChatSession,
        raw_input: &str,
    ) -> Result<SendOutcome> {
        let stripped = strip_sensitive_terms(raw_input);
        let input_was_redacted = stripped != raw_input;
        if input_was_redacted {
            tracing::warn!(session = %session.id, "sensitive terms removed from user input");
        }
        let sanitized = sanitize(&stripped);

        session
            .turns
            .push(ConversationTurn::now(Role::User, sanitized.clone()));

        let prompt = self
            .builder
            .build_prompt(session.persona, &sanitized, self.few_shot_count);

        let request = LlmRequest {
            model: self.model.clone(),
            prompt,
            max_tokens: 1024,
            temperature: 0.7,
        };

        let reply = match self.client.complete(&request).await {
            Ok(resp) => enforce_marker(&resp.content, session.persona),
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "model call failed");
                format!("{} (Error contacting model: {e})", session.persona.marker())
            }
        };

        session
            .turns
            .push(ConversationTurn::now(Role::Bot, reply.clone()));

        let flags = match session.persona {
            Persona::Attacker => detect_red_flags(&reply),
            Persona::Defender => Vec::new(),
        };
        if !flags.is_empty() {
            let summary = format!("Red flags detected: {}", flags.join("; "));
            session
                .turns
                .push(ConversationTurn::now(Role::System, summary));
        }

        Ok(SendOutcome {
            reply,
            flags,
            input_was_redacted,
        })
    }
}
