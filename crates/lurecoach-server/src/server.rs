//! Lightweight axum web server hosting the awareness-training chat.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use lurecoach_core::chat::{ChatEngine, ChatSession};
use lurecoach_core::llm_client::{LlmClient, LlmRequest};
use lurecoach_core::prompts::{build_augmentation_prompt, Persona};

/// The chat web server.
pub struct ChatServer {
    engine: Arc<ChatEngine>,
    client: Arc<dyn LlmClient>,
    model: String,
    port: u16,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<ChatEngine>,
    client: Arc<dyn LlmClient>,
    model: String,
    sessions: Arc<Mutex<HashMap<String, ChatSession>>>,
}

#[derive(Deserialize)]
struct CreateSessionRequest {
    /// "attacker" (default) or "defender".
    persona: Option<String>,
}

#[derive(Serialize)]
struct CreateSessionResponse {
    session_id: String,
    persona: String,
}

#[derive(Deserialize)]
struct SendMessageRequest {
    message: String,
}

#[derive(Serialize)]
struct SendMessageResponse {
    reply: String,
    flags: Vec<String>,
    input_was_redacted: bool,
}

#[derive(Serialize)]
struct SessionInfo {
    session_id: String,
    persona: String,
    turns: Vec<TurnInfo>,
}

#[derive(Serialize)]
struct TurnInfo {
    role: String,
    text: String,
    timestamp: String,
}

#[derive(Serialize)]
struct AugmentResponse {
    content: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

fn persona_name(persona: Persona) -> &'static str {
    match persona {
        Persona::Attacker => "attacker",
        Persona::Defender => "defender",
    }
}

fn parse_persona(name: &str) -> Option<Persona> {
    match name.to_lowercase().as_str() {
        "attacker" => Some(Persona::Attacker),
        "defender" => Some(Persona::Defender),
        _ => None,
    }
}

impl ChatServer {
    pub fn new(
        engine: Arc<ChatEngine>,
        client: Arc<dyn LlmClient>,
        model: String,
        port: u16,
    ) -> Self {
        Self {
            engine,
            client,
            model,
            port,
        }
    }

    /// Start the web server. This blocks until the server is shut down.
    pub async fn start(&self) -> Result<()> {
        let app = Self::router(self.engine.clone(), self.client.clone(), self.model.clone());

        let addr = std::net::SocketAddr::from(([127, 0, 0, 1], self.port));
        tracing::info!("Chat server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Build the router (useful for testing without binding to a port).
    pub fn router(engine: Arc<ChatEngine>, client: Arc<dyn LlmClient>, model: String) -> Router {
        let state = AppState {
            engine,
            client,
            model,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        };
        Router::new()
            .route("/", get(chat_page_handler))
            .route("/health", get(health_handler))
            .route("/sessions", post(create_session_handler))
            .route("/sessions/{id}", get(session_info_handler))
            .route("/sessions/{id}/message", post(send_message_handler))
            .route("/sessions/{id}/reset", post(reset_session_handler))
            .route("/augment", post(augment_handler))
            .with_state(state)
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn create_session_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let persona = match body.persona.as_deref() {
        None => Persona::Attacker,
        Some(name) => match parse_persona(name) {
            Some(p) => p,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Unknown persona: {name}"),
                    }),
                )
                    .into_response();
            }
        },
    };

    let session = ChatSession::new(persona);
    let response = CreateSessionResponse {
        session_id: session.id.clone(),
        persona: persona_name(persona).to_string(),
    };
    state
        .sessions
        .lock()
        .await
        .insert(session.id.clone(), session);
    tracing::info!(session = %response.session_id, persona = %response.persona, "session created");

    (StatusCode::CREATED, Json(response)).into_response()
}

async fn session_info_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.lock().await;
    match sessions.get(&id) {
        Some(session) => {
            let info = SessionInfo {
                session_id: session.id.clone(),
                persona: persona_name(session.persona).to_string(),
                turns: session
                    .turns
                    .iter()
                    .map(|t| TurnInfo {
                        role: t.role.as_str().to_string(),
                        text: t.text.clone(),
                        timestamp: t.timestamp.clone(),
                    })
                    .collect(),
            };
            Json(info).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No such session".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn send_message_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> impl IntoResponse {
    // Take the session out of the store so the lock is never held across
    // the model call; a slow upstream must not stall other sessions.
    let mut session = {
        let mut sessions = state.sessions.lock().await;
        match sessions.remove(&id) {
            Some(s) => s,
            None => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse {
                        error: "No such session".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    };

    let result = state.engine.send_message(&mut session, &body.message).await;
    state.sessions.lock().await.insert(id, session);

    match result {
        Ok(outcome) => Json(SendMessageResponse {
            reply: outcome.reply,
            flags: outcome.flags.iter().map(|f| f.to_string()).collect(),
            input_was_redacted: outcome.input_was_redacted,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("{e}"),
            }),
        )
            .into_response(),
    }
}

async fn reset_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.lock().await;
    match sessions.get_mut(&id) {
        Some(session) => {
            session.reset();
            tracing::info!(session = %id, "session reset");
            Json(serde_json::json!({"status": "reset"})).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No such session".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn augment_handler(State(state): State<AppState>) -> impl IntoResponse {
    let request = LlmRequest {
        model: state.model.clone(),
        prompt: build_augmentation_prompt(),
        max_tokens: 2048,
        temperature: 0.9,
    };

    match state.client.complete(&request).await {
        Ok(resp) => Json(AugmentResponse {
            content: resp.content,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("{e}"),
            }),
        )
            .into_response(),
    }
}

async fn chat_page_handler() -> impl IntoResponse {
    Html(CHAT_PAGE)
}

const CHAT_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>LureCoach - Catphishing Awareness Trainer</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, monospace;
            background: #0d1117;
            color: #c9d1d9;
            height: 100vh;
            display: flex;
            flex-direction: column;
        }
        .header {
            background: #161b22;
            border-bottom: 1px solid #30363d;
            padding: 16px 24px;
        }
        .header h1 {
            font-size: 16px;
            color: #58a6ff;
            margin-bottom: 8px;
        }
        .header .notice {
            font-size: 12px;
            color: #8b949e;
        }
        .persona-picker {
            margin-top: 8px;
            display: flex;
            gap: 8px;
            align-items: center;
        }
        .persona-picker label {
            font-size: 13px;
            color: #8b949e;
        }
        .persona-picker select {
            background: #0d1117;
            border: 1px solid #30363d;
            border-radius: 6px;
            color: #c9d1d9;
            padding: 4px 8px;
        }
        .messages {
            flex: 1;
            overflow-y: auto;
            padding: 16px 24px;
        }
        .message {
            margin-bottom: 16px;
            max-width: 80%;
        }
        .message.user {
            margin-left: auto;
        }
        .message .bubble {
            padding: 10px 14px;
            border-radius: 12px;
            font-size: 14px;
            line-height: 1.5;
            white-space: pre-wrap;
        }
        .message.user .bubble {
            background: #1f6feb;
            color: #fff;
            border-bottom-right-radius: 4px;
        }
        .message.bot .bubble {
            background: #21262d;
            border: 1px solid #30363d;
            border-bottom-left-radius: 4px;
        }
        .flags {
            background: #d2992220;
            border: 1px solid #d29922;
            color: #d29922;
            border-radius: 8px;
            padding: 8px 12px;
            margin-bottom: 16px;
            font-size: 13px;
        }
        .input-area {
            background: #161b22;
            border-top: 1px solid #30363d;
            padding: 16px 24px;
            display: flex;
            gap: 12px;
        }
        .input-area input {
            flex: 1;
            background: #0d1117;
            border: 1px solid #30363d;
            border-radius: 8px;
            padding: 10px 14px;
            color: #c9d1d9;
            font-size: 14px;
            outline: none;
        }
        .input-area input:focus {
            border-color: #58a6ff;
        }
        .input-area button {
            background: #238636;
            color: #fff;
            border: none;
            border-radius: 8px;
            padding: 10px 20px;
            font-size: 14px;
            cursor: pointer;
            font-weight: 500;
        }
        .input-area button:hover {
            background: #2ea043;
        }
        .input-area button:disabled {
            background: #21262d;
            color: #484f58;
            cursor: not-allowed;
        }
        .error-msg {
            background: #f8514920;
            border: 1px solid #f85149;
            color: #f85149;
            border-radius: 8px;
            padding: 10px 14px;
            margin: 8px 24px;
            font-size: 13px;
        }
    </style>
</head>
<body>
    <div class="header">
        <h1>LureCoach</h1>
        <div class="notice">Training simulation. Every roleplay reply is marked [SIMULATION]. Never share real personal data here.</div>
        <div class="persona-picker">
            <label for="persona">Mode:</label>
            <select id="persona" onchange="startSession()">
                <option value="attacker">Simulated scammer (practice spotting tactics)</option>
                <option value="defender">Defender assistant (analyze a suspicious chat)</option>
            </select>
            <button onclick="resetSession()">Reset</button>
        </div>
    </div>
    <div class="messages" id="messages"></div>
    <div class="input-area">
        <input type="text" id="user-input" placeholder="Type a message..." autofocus>
        <button id="send-btn" onclick="sendMessage()">Send</button>
    </div>

    <script>
        let sessionId = null;
        const messagesDiv = document.getElementById('messages');
        const userInput = document.getElementById('user-input');
        const sendBtn = document.getElementById('send-btn');

        async function startSession() {
            messagesDiv.innerHTML = '';
            const persona = document.getElementById('persona').value;
            try {
                const resp = await fetch('/sessions', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ persona: persona })
                });
                const data = await resp.json();
                sessionId = data.session_id;
            } catch(e) {
                showError('Could not start a session: ' + e.message);
            }
        }

        async function resetSession() {
            if (!sessionId) return;
            await fetch('/sessions/' + sessionId + '/reset', { method: 'POST' });
            messagesDiv.innerHTML = '';
        }

        userInput.addEventListener('keydown', function(e) {
            if (e.key === 'Enter' && !e.shiftKey) {
                e.preventDefault();
                sendMessage();
            }
        });

        async function sendMessage() {
            const message = userInput.value.trim();
            if (!message) return;
            if (!sessionId) await startSession();

            userInput.value = '';
            userInput.disabled = true;
            sendBtn.disabled = true;

            appendMessage('user', message);

            try {
                const resp = await fetch('/sessions/' + sessionId + '/message', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ message: message })
                });

                if (resp.ok) {
                    const data = await resp.json();
                    appendMessage('bot', data.reply);
                    if (data.flags.length > 0) {
                        appendFlags(data.flags);
                    }
                } else {
                    const err = await resp.json();
                    showError(err.error || 'Request failed');
                }
            } catch(e) {
                showError('Network error: ' + e.message);
            }

            userInput.disabled = false;
            sendBtn.disabled = false;
            userInput.focus();
        }

        function appendMessage(role, content) {
            const div = document.createElement('div');
            div.className = 'message ' + role;

            const bubble = document.createElement('div');
            bubble.className = 'bubble';
            bubble.textContent = content;
            div.appendChild(bubble);

            messagesDiv.appendChild(div);
            messagesDiv.scrollTop = messagesDiv.scrollHeight;
        }

        function appendFlags(flags) {
            const div = document.createElement('div');
            div.className = 'flags';
            div.textContent = 'Red flags spotted: ' + flags.join('; ');
            messagesDiv.appendChild(div);
            messagesDiv.scrollTop = messagesDiv.scrollHeight;
        }

        function showError(msg) {
            const div = document.createElement('div');
            div.className = 'error-msg';
            div.textContent = msg;
            messagesDiv.appendChild(div);
            messagesDiv.scrollTop = messagesDiv.scrollHeight;
        }

        startSession();
    </script>
</body>
</html>"##;
