//! End-to-end tests for the full chat pipeline: dataset records are
//! normalized into the few-shot pool, prompts are assembled per persona,
//! the (mock) model is called, markers are enforced, and red flags are
//! surfaced on the reply.

use std::sync::Arc;

use lurecoach_core::chat::{ChatEngine, ChatSession, Role};
use lurecoach_core::dataset::ExamplePool;
use lurecoach_core::llm_client::{LlmResponse, MockLlmClient};
use lurecoach_core::prompts::{Persona, PersonaTemplates, PromptBuilder, SIMULATION_MARKER};

use serde_json::json;

// -------------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------------

const MODEL: &str = "gemini-2.5-flash";

fn mock_with(content: &str) -> Arc<MockLlmClient> {
    let mock = Arc::new(MockLlmClient::new());
    mock.add_response(
        MODEL,
        LlmResponse {
            content: content.to_string(),
            model: MODEL.to_string(),
            latency_ms: 25,
        },
    );
    mock
}

fn dataset_pool() -> ExamplePool {
    let records = vec![
        json!({"dialogue": [
            {"speaker": "scammer", "text": "hey cutie, contact me at lizzy@mail.example"},
            {"speaker": "target", "text": "who is this?"},
        ]}),
        json!({"text": "I saw your profile and felt an instant connection, add me on telegram"}),
        json!({"message": "my camera broken, can't video today, but send a photo?"}),
    ];
    ExamplePool::from_records(&records)
}

fn engine(pool: ExamplePool, client: Arc<MockLlmClient>) -> ChatEngine {
    let builder = PromptBuilder::new(pool, PersonaTemplates::default());
    ChatEngine::new(builder, client, MODEL.to_string())
}

// =========================================================================
// E2E scenarios
// =========================================================================

#[tokio::test]
async fn attacker_session_full_round_trip() {
    let mock = mock_with("[SIMULATION] you're so sweet! add me on whatsapp?");
    let eng = engine(dataset_pool(), mock.clone());
    let mut session = ChatSession::new(Persona::Attacker);

    let outcome = eng.send_message(&mut session, "hi, nice to meet you").await.unwrap();

    // Reply is marker-prefixed and flagged.
    assert!(outcome.reply.starts_with(SIMULATION_MARKER));
    assert!(outcome
        .flags
        .contains(&"Wants to move chat to private app"));
    assert!(outcome
        .flags
        .contains(&"Fast affection / emotional push"));

    // The prompt that reached the model carries the pipeline's guarantees.
    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    let prompt = &calls[0].prompt;
    assert!(prompt.contains("FEW-SHOT EXAMPLES:"));
    assert!(prompt.contains("Lizzy"));
    // PII in dataset examples was sanitized at normalization time.
    assert!(!prompt.contains("lizzy@mail.example"));

    // History: user turn, bot turn, flag summary.
    assert_eq!(session.turns.len(), 3);
    assert_eq!(session.turns[2].role, Role::System);
}

#[tokio::test]
async fn defender_session_uses_defender_block() {
    let mock = mock_with(
        "[DEFENDER MODE] Red flags: asks to move platforms. Safe reply: decline politely.",
    );
    let eng = engine(dataset_pool(), mock.clone());
    let mut session = ChatSession::new(Persona::Defender);

    let outcome = eng
        .send_message(&mut session, "He wants my number for WhatsApp, is that ok?")
        .await
        .unwrap();

    assert!(outcome.reply.starts_with("[DEFENDER MODE]"));
    assert!(outcome.flags.is_empty());

    let prompt = &mock.calls()[0].prompt;
    assert!(prompt.contains("Defender Assistant"));
    assert!(!prompt.contains("Lizzy"));
}

#[tokio::test]
async fn sensitive_user_input_never_reaches_the_model() {
    let mock = mock_with("[SIMULATION] ok");
    let eng = engine(dataset_pool(), mock.clone());
    let mut session = ChatSession::new(Persona::Attacker);

    let outcome = eng
        .send_message(
            &mut session,
            "my otp is 443322 and my email is victim@mail.example",
        )
        .await
        .unwrap();

    assert!(outcome.input_was_redacted);
    let prompt = &mock.calls()[0].prompt;
    assert!(!prompt.contains("otp is"));
    assert!(!prompt.contains("victim@mail.example"));
    assert!(prompt.contains("[REDACTED_SENSITIVE]"));
    assert!(prompt.contains("[REDACTED_EMAIL]"));
}

#[tokio::test]
async fn outage_produces_in_band_error_reply() {
    let mock = mock_with("[SIMULATION] unused");
    let eng = engine(dataset_pool(), mock.clone());
    let mut session = ChatSession::new(Persona::Attacker);

    mock.fail_next();
    let outcome = eng.send_message(&mut session, "hello").await.unwrap();

    assert!(outcome.reply.starts_with(SIMULATION_MARKER));
    assert!(outcome.reply.contains("Error contacting model"));

    // The session stays usable afterwards.
    let outcome = eng.send_message(&mut session, "still there?").await.unwrap();
    assert_eq!(outcome.reply, "[SIMULATION] unused");
    assert_eq!(session.turns.len(), 4);
}

#[tokio::test]
async fn empty_dataset_falls_back_to_builtin_examples() {
    let mock = mock_with("[SIMULATION] ok");
    let eng = engine(ExamplePool::from_records(&[]), mock.clone());
    let mut session = ChatSession::new(Persona::Attacker);

    eng.send_message(&mut session, "hi").await.unwrap();

    let prompt = &mock.calls()[0].prompt;
    // Built-in fallback examples are sampled into the prompt.
    assert!(prompt.contains("Scammer: [SIMULATION]"));
}

#[tokio::test]
async fn scripted_training_scenario_flags_escalation() {
    // A scripted scammer escalation: affection, then video avoidance,
    // then a money ask. Each reply should pick up the matching flag.
    let scripted = [
        (
            "[SIMULATION] you are so beautiful, I think about you all day",
            "Fast affection / emotional push",
        ),
        (
            "[SIMULATION] my camera broken, so no video today sorry",
            "Avoids live verification/video call",
        ),
        (
            "[SIMULATION] could you transfer a little for my ticket? ([SIMULATION] - do NOT send money or passwords)",
            "Asks for money/transfer",
        ),
    ];

    for (reply, expected_flag) in scripted {
        let mock = mock_with(reply);
        let eng = engine(dataset_pool(), mock);
        let mut session = ChatSession::new(Persona::Attacker);
        let outcome = eng.send_message(&mut session, "hi").await.unwrap();
        assert!(
            outcome.flags.contains(&expected_flag),
            "reply {reply:?} missing flag {expected_flag:?}, got {:?}",
            outcome.flags
        );
    }
}
