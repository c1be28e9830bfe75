//! Prompt construction for the roleplay model.
//!
//! Every prompt carries an invariant safety preamble, a persona block
//! (simulated scammer or defender analyst), a sampled few-shot block, the
//! already-sanitized user message, and a fixed response cue. Replies that
//! come back without a marker prefix are re-prefixed before storage; the
//! marker is a safety invariant, not a formatting nicety.

use crate::dataset::ExamplePool;

/// Marker prefix for Attacker-persona (simulated scammer) replies.
pub const SIMULATION_MARKER: &str = "[SIMULATION]";

/// Marker prefix for Defender-persona replies.
pub const DEFENDER_MARKER: &str = "[DEFENDER MODE]";

/// The role the model is instructed to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    /// Simulated scammer exhibiting catphishing tactics, forbidden from
    /// actually soliciting money or credentials.
    Attacker,
    /// Safety analyst: enumerates red flags and proposes safe replies.
    Defender,
}

impl Persona {
    /// The marker every stored reply for this persona must start with.
    pub fn marker(&self) -> &'static str {
        match self {
            Persona::Attacker => SIMULATION_MARKER,
            Persona::Defender => DEFENDER_MARKER,
        }
    }
}

/// Persona wording is configurable: hosts may swap in their own templates
/// without touching the assembler. The defaults take the strict reading of
/// the Attacker role (never actually solicit, only append a disclaimer).
#[derive(Debug, Clone)]
pub struct PersonaTemplates {
    pub preamble: String,
    pub attacker: String,
    pub defender: String,
    pub response_cue: String,
}

impl Default for PersonaTemplates {
    fn default() -> Self {
        Self {
            preamble: format!(
                "Safety rules (always apply):\n\
                 - NEVER request or accept passwords, OTPs, bank details, or any PII.\n\
                 - If the user attempts to share personal info, warn them and refuse.\n\
                 - ALWAYS prefix scammer-roleplay responses with {SIMULATION_MARKER} and \
                 defender responses with {DEFENDER_MARKER}.\n\
                 - Keep replies short (1-3 sentences) and natural.\n"
            ),
            attacker: format!(
                "Role: You are roleplaying a fake persona (catphisher) named 'Lizzy' for \
                 awareness training only. Simulate typical catphishing behaviour (fast \
                 affection, requests to move chat to private apps, avoidance of video \
                 calls), but NEVER actually solicit money, OTPs, or passwords. If you \
                 would be tempted to ask for money or sensitive data, instead append \
                 '({SIMULATION_MARKER} - do NOT send money or passwords)'.\n"
            ),
            defender: format!(
                "Role: You are a Defender Assistant. Analyze the user's incoming message \
                 or chat snippet, list up to 3 red flags with short reasons, propose 2 \
                 safe replies the user can send, and give reporting steps (block, report, \
                 inform IT/parent). Begin with {DEFENDER_MARKER}.\n"
            ),
            response_cue: "Response:".to_string(),
        }
    }
}

/// Assembles prompts from a fixed preamble, persona templates, and the
/// shared few-shot pool.
pub struct PromptBuilder {
    pool: ExamplePool,
    templates: PersonaTemplates,
}

impl PromptBuilder {
    pub fn new(pool: ExamplePool, templates: PersonaTemplates) -> Self {
        Self { pool, templates }
    }

    /// Build the full prompt text for one model call.
    ///
    /// `user_message` must already have gone through the sensitive-term
    /// stripper and the sanitizer; it is inserted verbatim.
    pub fn build_prompt(&self, persona: Persona, user_message: &str, few_shot_count: usize) -> String {
        let persona_block = match persona {
            Persona::Attacker => &self.templates.attacker,
            Persona::Defender => &self.templates.defender,
        };
        let few_shots = self.pool.build_few_shots(few_shot_count);

        format!(
            "{}\n{}\nFEW-SHOT EXAMPLES:\n{}\n\nUser message:\n{}\n\n{}",
            self.templates.preamble, persona_block, few_shots, user_message, self.templates.response_cue
        )
    }
}

/// Ensure a model reply starts with one of the persona markers, re-prefixing
/// with the active persona's marker when missing. Applied by the caller to
/// every reply before it is stored or displayed.
pub fn enforce_marker(reply: &str, persona: Persona) -> String {
    if reply.starts_with(SIMULATION_MARKER) || reply.starts_with(DEFENDER_MARKER) {
        reply.to_string()
    } else {
        format!("{} {}", persona.marker(), reply)
    }
}

/// Fixed prompt asking the model to generate synthetic training dialogues
/// for dataset augmentation. Output is JSONL in the dataset record format.
pub fn build_augmentation_prompt() -> String {
    "You are a safe generator. Produce 5 short synthetic SIMULATION dialogues \
     (3-6 turns each) between 'scammer' and 'target'. Label each with intents \
     like FAST_AFFECTION, ASK_PHOTO, MOVE_PRIVATE, AVOID_VIDEO. Output JSONL \
     lines with fields: dialogue (list of {speaker,text}), labels. Do NOT \
     include real names, PII or instructions how to scam. Prefix each message \
     with [SIMULATION]."
        .to_string()
}
