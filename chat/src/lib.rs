//! Minimal OpenAI-compatible chat completion client.
//!
//! This crate provides a focused client for the `/chat/completions` endpoint
//! spoken by OpenAI and the many providers that mirror its API:
//! - Non-streaming completions only
//! - Configurable base URL so one client covers every compatible provider
//! - Typed errors whose messages keep the provider's own wording

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Endpoint used when no provider-specific base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Errors that can occur when using the chat client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Build a network error from a reqwest failure.
    ///
    /// reqwest's own display text rarely says what went wrong at the socket
    /// level, so connect and timeout failures are labelled explicitly.
    fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Network(format!("request timeout: {e}"))
        } else if e.is_connect() {
            Error::Network(format!("connection failed: {e}"))
        } else {
            Error::Network(e.to_string())
        }
    }
}

/// Chat completion client.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatClient {
    /// Create a new client with the given API key against the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a completion request and return the full response.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        let headers = self.build_headers()?;
        let api_request = self.build_api_request(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::from_transport(&e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parse_response(api_response))
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::NoApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }

    fn build_api_request(&self, request: &Request) -> ApiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system {
            messages.push(ApiMessage {
                role: Role::System.as_str(),
                content: system.clone(),
            });
        }

        messages.extend(request.messages.iter().map(|m| ApiMessage {
            role: m.role.as_str(),
            content: m.content.clone(),
        }));

        ApiRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        }
    }
}

fn parse_response(api_response: ApiResponse) -> Response {
    let choice = api_response.choices.into_iter().next();

    let finish_reason = match choice.as_ref().and_then(|c| c.finish_reason.as_deref()) {
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        Some("tool_calls") => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    };

    Response {
        id: api_response.id,
        model: api_response.model,
        content: choice.and_then(|c| c.message.content),
        finish_reason,
        usage: api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A completion request.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub max_tokens: usize,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
}

impl Request {
    /// Create a new request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: None,
            max_tokens: 1024,
            system: None,
            messages,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the system instruction, sent ahead of all other messages.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: String,
    pub model: String,
    /// Content of the first choice, if the provider returned any.
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Option<Usage>,
}

impl Response {
    /// Get the reply text, trimmed. `None` when the reply is missing or blank.
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
}

/// Token usage information.
#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ChatClient::new("test-key");
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_client_with_base_url_and_model() {
        let client = ChatClient::new("test-key")
            .with_base_url("https://api.moonshot.cn/v1/")
            .with_model("moonshot-v1-8k");
        assert_eq!(client.base_url(), "https://api.moonshot.cn/v1");
        assert_eq!(client.model(), "moonshot-v1-8k");
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new(vec![Message::user("Hello")])
            .with_system("You are a helpful assistant")
            .with_max_tokens(150)
            .with_temperature(0.8);

        assert_eq!(request.max_tokens, 150);
        assert!(request.system.is_some());
        assert_eq!(request.temperature, Some(0.8));
    }

    #[test]
    fn test_system_prompt_is_sent_first() {
        let client = ChatClient::new("test-key").with_model("deepseek-chat");
        let request = Request::new(vec![Message::user("Hi"), Message::assistant("Hello!")])
            .with_system("Stay in character");

        let body = serde_json::to_value(client.build_api_request(&request)).unwrap();
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Stay in character");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][2]["role"], "assistant");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_request_model_overrides_client_model() {
        let client = ChatClient::new("test-key");
        let request = Request::new(vec![Message::user("Hi")]).with_model("gpt-4");
        let body = serde_json::to_value(client.build_api_request(&request)).unwrap();
        assert_eq!(body["model"], "gpt-4");
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "model": "moonshot-v1-8k",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "  Greetings, traveler.  "},
                    "finish_reason": "stop"
                }
            ],
            "usage": {"prompt_tokens": 42, "completion_tokens": 5, "total_tokens": 47}
        }"#;
        let response = parse_response(serde_json::from_str(raw).unwrap());

        assert_eq!(response.id, "chatcmpl-1");
        assert_eq!(response.text(), Some("Greetings, traveler."));
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.unwrap().completion_tokens, 5);
    }

    #[test]
    fn test_parse_response_without_content() {
        let raw = r#"{"choices": [{
            "message": {"role": "assistant", "content": null},
            "finish_reason": "length"
        }]}"#;
        let response = parse_response(serde_json::from_str(raw).unwrap());
        assert_eq!(response.text(), None);
        assert_eq!(response.finish_reason, FinishReason::Length);

        let response = parse_response(serde_json::from_str(r#"{"choices": []}"#).unwrap());
        assert!(response.content.is_none());
    }

    #[test]
    fn test_blank_content_has_no_text() {
        let response = Response {
            id: String::new(),
            model: String::new(),
            content: Some("   \n".to_string()),
            finish_reason: FinishReason::Stop,
            usage: None,
        };
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_api_error_display_keeps_status() {
        let err = Error::Api {
            status: 401,
            message: "Invalid Authentication".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (status 401): Invalid Authentication"
        );
    }

    #[tokio::test]
    async fn test_empty_api_key_fails_before_sending() {
        let client = ChatClient::new("").with_base_url("http://127.0.0.1:9");
        let result = client.complete(Request::new(vec![Message::user("Hi")])).await;
        assert!(matches!(result, Err(Error::NoApiKey)));
    }
}
