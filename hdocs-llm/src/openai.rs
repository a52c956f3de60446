//! OpenAI chat completions integration
//!
//! Sends one system and one user message per request to
//! `{endpoint}/chat/completions` and returns the first choice's content.

use crate::client::{CompletionRequest, CompletionService};
use crate::{LlmError, LlmResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Settings for the completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; `/chat/completions` is appended
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Whole-request timeout; none by default
    pub timeout_secs: Option<u64>,
    /// Environment variable holding the bearer token
    pub api_key_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: None,
            timeout_secs: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> LlmResult<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LlmError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.model.trim().is_empty() {
            return Err(LlmError::Config("model name is empty".to_string()));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(LlmError::Config(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(LlmError::Config("max_tokens must be positive".to_string()));
        }
        Ok(())
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

/// Read the credential through `lookup`, rejecting unset and blank values
pub fn resolve_api_key<F>(env_name: &str, lookup: F) -> LlmResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(env_name) {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        Some(_) => Err(LlmError::Config(format!("environment variable {} is empty", env_name))),
        None => Err(LlmError::Config(format!("environment variable {} is not set", env_name))),
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// OpenAI-compatible chat completions client
pub struct OpenAiClient {
    api_key: String,
    config: ApiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a client with an explicit API key
    pub fn new(api_key: String, config: ApiConfig) -> LlmResult<Self> {
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            api_key,
            config,
            client: builder.build()?,
        })
    }

    /// Create a client whose key comes from `config.api_key_env`
    pub fn from_env(config: ApiConfig) -> LlmResult<Self> {
        let api_key = resolve_api_key(&config.api_key_env, |name| std::env::var(name).ok())?;
        Self::new(api_key, config)
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&text);
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited(message));
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| LlmError::InvalidResponse("response has no message content".to_string()))
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Message from an OpenAI error body, or the raw body when it has another shape
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().chars().take(500).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ApiConfig {
        ApiConfig {
            endpoint: format!("{}/v1", server.uri()),
            ..ApiConfig::default()
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "You document C code.".to_string(),
            prompt: "int add(int a, int b);".to_string(),
        }
    }

    #[test]
    fn test_resolve_api_key() {
        let unset = resolve_api_key("OPENAI_API_KEY", |_| None).unwrap_err();
        assert_eq!(unset.kind(), ErrorKind::Configuration);
        assert!(unset.to_string().contains("OPENAI_API_KEY"));

        let blank = resolve_api_key("OPENAI_API_KEY", |_| Some("  ".to_string())).unwrap_err();
        assert!(matches!(blank, LlmError::Config(_)));

        let key = resolve_api_key("MY_KEY", |name| {
            (name == "MY_KEY").then(|| " sk-test \n".to_string())
        })
        .unwrap();
        assert_eq!(key, "sk-test");
    }

    #[test]
    fn test_config_validation() {
        assert!(ApiConfig::default().validate().is_ok());

        let hot = ApiConfig { temperature: 3.5, ..ApiConfig::default() };
        assert!(matches!(hot.validate(), Err(LlmError::Config(_))));

        let bad_endpoint = ApiConfig { endpoint: "api.openai.com".into(), ..ApiConfig::default() };
        assert!(bad_endpoint.validate().is_err());

        assert!(OpenAiClient::new(String::new(), ApiConfig::default()).is_err());
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let config = ApiConfig { endpoint: "http://localhost:8080/v1/".into(), ..ApiConfig::default() };
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({ "model": "gpt-4o" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "  Adds two integers.\n" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test".into(), config_for(&server)).unwrap();
        let text = client.complete(&request()).await.unwrap();
        assert_eq!(text, "Adds two integers.");
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit reached", "type": "requests" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test".into(), config_for(&server)).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        match &err {
            LlmError::RateLimited(message) => assert_eq!(message, "Rate limit reached"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.kind(), ErrorKind::RemoteService);
    }

    #[tokio::test]
    async fn test_server_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test".into(), config_for(&server)).unwrap();
        match client.complete(&request()).await.unwrap_err() {
            LlmError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_content_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test".into(), config_for(&server)).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test".into(), config_for(&server)).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
        assert_eq!(err.kind(), ErrorKind::RemoteService);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let config = ApiConfig {
            endpoint: "http://127.0.0.1:9/v1".into(),
            timeout_secs: Some(5),
            ..ApiConfig::default()
        };
        let client = OpenAiClient::new("sk-test".into(), config).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
        assert_eq!(err.kind(), ErrorKind::RemoteService);
    }
}
