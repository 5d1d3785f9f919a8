//! Model Router: sends a system + user prompt to an OpenAI-compatible
//! chat-completions endpoint and returns the generated text.
//!
//! Callers never see transport details; every failure comes back as a
//! [`GenerationError`] so the generator and chat responder can fall back.

use anicare_core::CoreConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_API_KEY_ALT: &str = "VITE_OPENAI_API_KEY";

/// Whether generation calls reach the external service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmMode {
    #[default]
    Live,
    /// Every call fails with [`GenerationError::Offline`], so the fallbacks answer.
    Offline,
}

impl LlmMode {
    /// Anything other than `offline` means live.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("offline") {
            LlmMode::Offline
        } else {
            LlmMode::Live
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmMode::Live => "live",
            LlmMode::Offline => "offline",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,
    #[error("generation disabled (offline mode)")]
    Offline,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("empty reply")]
    EmptyReply,
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    #[error("reply has the wrong shape: {0}")]
    InvalidShape(String),
}

/// One completion call: a system role and a single user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the service for a strict JSON object reply.
    pub json_response: bool,
}

/// Anything that can turn a prompt into text. [`ModelRouter`] is the live implementation.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Routes prompts to the configured chat-completions endpoint.
pub struct ModelRouter {
    mode: LlmMode,
    client: reqwest::Client,
    api_base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ModelRouter {
    pub fn new(
        mode: LlmMode,
        api_base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            mode,
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Builds the router from config; the credential comes from the environment.
    pub fn from_config(config: &CoreConfig) -> Result<Self, GenerationError> {
        Self::new(
            LlmMode::parse(&config.llm_mode),
            config.api_base_url.clone(),
            config.model.clone(),
            Self::api_key_from_env(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// `OPENAI_API_KEY`, then `VITE_OPENAI_API_KEY`.
    pub fn api_key_from_env() -> Option<String> {
        [ENV_API_KEY, ENV_API_KEY_ALT]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.trim().is_empty())
    }

    pub fn mode(&self) -> LlmMode {
        self.mode
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base_url)
    }
}

#[async_trait::async_trait]
impl TextGenerator for ModelRouter {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        if self.mode == LlmMode::Offline {
            return Err(GenerationError::Offline);
        }
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;

        let body = ChatCompletionBody {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_response.then_some(ResponseFormat { kind: "json_object" }),
        };

        tracing::debug!(
            target: "anicare::llm",
            model = %self.model,
            json = request.json_response,
            prompt_len = request.user.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let reply: ChatCompletionReply =
            serde_json::from_str(&text).map_err(|e| GenerationError::MalformedReply(e.to_string()))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(GenerationError::EmptyReply)?;

        tracing::debug!(target: "anicare::llm", reply_len = content.len(), "Completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Echoes what it received so the test can inspect the outgoing request.
    async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let summary = json!({
            "auth": auth,
            "model": body["model"],
            "system": body["messages"][0]["content"],
            "user": body["messages"][1]["content"],
            "temperature": body["temperature"],
            "max_tokens": body["max_tokens"],
            "response_format": body["response_format"],
        });
        Json(json!({ "choices": [{ "message": { "role": "assistant", "content": summary.to_string() } }] }))
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn router(base: &str, key: Option<&str>) -> ModelRouter {
        ModelRouter::new(
            LlmMode::Live,
            base,
            "gpt-4o",
            key.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request(json_response: bool) -> CompletionRequest {
        CompletionRequest {
            system: "be helpful".into(),
            user: "hello".into(),
            temperature: 0.7,
            max_tokens: if json_response { None } else { Some(300) },
            json_response,
        }
    }

    #[test]
    fn mode_parses_offline_and_defaults_to_live() {
        assert_eq!(LlmMode::parse("OFFLINE"), LlmMode::Offline);
        assert_eq!(LlmMode::parse("live"), LlmMode::Live);
        assert_eq!(LlmMode::parse("anything"), LlmMode::Live);
    }

    #[tokio::test]
    async fn sends_bearer_model_and_json_format() {
        let base = spawn(Router::new().route("/v1/chat/completions", post(echo))).await;
        let reply = router(&base, Some("sk-test")).complete(request(true)).await.unwrap();
        let seen: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(seen["auth"], "Bearer sk-test");
        assert_eq!(seen["model"], "gpt-4o");
        assert_eq!(seen["system"], "be helpful");
        assert_eq!(seen["user"], "hello");
        assert_eq!(seen["response_format"]["type"], "json_object");
        assert!(seen["max_tokens"].is_null());
    }

    #[tokio::test]
    async fn chat_style_request_carries_max_tokens_without_format() {
        let base = spawn(Router::new().route("/v1/chat/completions", post(echo))).await;
        let reply = router(&base, Some("sk-test")).complete(request(false)).await.unwrap();
        let seen: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(seen["max_tokens"], 300);
        assert!(seen["response_format"].is_null());
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        );
        let base = spawn(app).await;
        match router(&base, Some("sk-test")).complete(request(true)).await {
            Err(GenerationError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_content_is_an_empty_reply() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [{ "message": { "content": "  " } }] })) }),
        );
        let base = spawn(app).await;
        let err = router(&base, Some("sk-test")).complete(request(false)).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyReply));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let app = Router::new().route("/v1/chat/completions", post(|| async { "<html>gateway</html>" }));
        let base = spawn(app).await;
        let err = router(&base, Some("sk-test")).complete(request(false)).await.unwrap_err();
        assert!(matches!(err, GenerationError::MalformedReply(_)));
    }

    #[tokio::test]
    async fn missing_key_and_offline_mode_fail_without_network() {
        // Nothing listens here; both calls must return before connecting.
        let base = "http://127.0.0.1:9/v1";
        let err = router(base, None).complete(request(true)).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey));
        assert!(!router(base, Some("  ")).has_api_key());

        let offline = ModelRouter::new(LlmMode::Offline, base, "gpt-4o", Some("sk".into()), Duration::from_secs(1)).unwrap();
        let err = offline.complete(request(true)).await.unwrap_err();
        assert!(matches!(err, GenerationError::Offline));
    }

    #[tokio::test]
    async fn unreachable_service_is_an_http_error() {
        let err = router("http://127.0.0.1:9/v1", Some("sk-test"))
            .complete(request(true))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Http(_)));
    }
}
