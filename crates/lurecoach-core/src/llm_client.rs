//! LLM client for the hosted Gemini API, with a mock for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Request to the hosted model.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from the hosted model.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub latency_ms: u64,
}

/// Trait for LLM clients.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

// ---------------------------------------------------------------------------
// Gemini HTTP client
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");

        Self { http, api_key }
    }

    async fn call_gemini(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            request.model, self.api_key
        );

        let body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": request.prompt }] }
            ],
            "generationConfig": {
                "maxOutputTokens": request.max_tokens,
                "temperature": request.temperature
            }
        });

        let resp = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 429 || status.is_server_error() {
            anyhow::bail!("Gemini API returned {status}");
        }

        let resp_body: Value = resp.error_for_status()?.json().await?;

        if let Some(error) = resp_body.get("error") {
            let msg = error["message"].as_str().unwrap_or("unknown error");
            anyhow::bail!("Gemini API error: {msg}");
        }

        let content = resp_body["candidates"][0]["content"]["parts"]
            .as_array()
            .and_then(|parts| parts.iter().find_map(|part| part["text"].as_str()))
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Execute a request with one retry on transient errors (429, 5xx).
    async fn call_with_retry(&self, request: &LlmRequest) -> Result<LlmResponse> {
        match self.call_gemini(request).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                let err_str = format!("{e}");
                let is_retryable = err_str.contains("429")
                    || err_str.contains("500")
                    || err_str.contains("502")
                    || err_str.contains("503");

                if is_retryable {
                    tracing::warn!("Gemini request failed with retryable error, retrying in 2s");
                    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                    self.call_gemini(request).await
                } else {
                    Err(e)
                }
            }
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.call_with_retry(request).await
    }
}

// ---------------------------------------------------------------------------
// Mock LLM Client (for testing)
// ---------------------------------------------------------------------------

pub struct MockLlmClient {
    responses: Arc<Mutex<HashMap<String, LlmResponse>>>,
    call_log: Arc<Mutex<Vec<LlmRequest>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_log: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(false)),
        }
    }

    /// Register a canned response for a given model.
    pub fn add_response(&self, model: &str, response: LlmResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(model.to_string(), response);
    }

    /// Make the next `complete` call fail, simulating an API outage.
    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    /// Return all requests that were made to this mock.
    pub fn calls(&self) -> Vec<LlmRequest> {
        self.call_log.lock().unwrap().clone()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.call_log.lock().unwrap().push(request.clone());

        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            anyhow::bail!("simulated API failure");
        }

        let responses = self.responses.lock().unwrap();
        match responses.get(&request.model) {
            Some(resp) => Ok(resp.clone()),
            None => Ok(LlmResponse {
                content: String::new(),
                model: request.model.clone(),
                latency_ms: 0,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "gemini-2.5-flash";

    fn request() -> LlmRequest {
        LlmRequest {
            model: MODEL.to_string(),
            prompt: "test prompt".to_string(),
            max_tokens: 512,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn mock_returns_registered_response() {
        let mock = MockLlmClient::new();
        mock.add_response(
            MODEL,
            LlmResponse {
                content: "[SIMULATION] hi there!".to_string(),
                model: MODEL.to_string(),
                latency_ms: 42,
            },
        );

        let resp = mock.complete(&request()).await.unwrap();
        assert_eq!(resp.content, "[SIMULATION] hi there!");
    }

    #[tokio::test]
    async fn mock_records_calls() {
        let mock = MockLlmClient::new();
        mock.complete(&request()).await.unwrap();
        mock.complete(&request()).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].prompt, "test prompt");
    }

    #[tokio::test]
    async fn mock_fail_next_fails_once() {
        let mock = MockLlmClient::new();
        mock.fail_next();
        assert!(mock.complete(&request()).await.is_err());
        assert!(mock.complete(&request()).await.is_ok());
    }

    #[test]
    fn api_key_never_in_debug_output() {
        let resp = LlmResponse {
            content: "x".to_string(),
            model: MODEL.to_string(),
            latency_ms: 1,
        };
        let debug = format!("{:?}", resp);
        assert!(!debug.contains("key="));
    }
}
