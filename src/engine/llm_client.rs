use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::settings::{BackendKind, Settings};
use crate::error::{ConfigError, GenerationError};
use crate::model::message::PromptMessage;

const REMOTE_TEMPERATURE: f32 = 0.2;

/// Anything that can turn an ordered message sequence into text.
/// Calls are stateless, so one client may serve several threads.
pub trait GenerationClient: Send + Sync {
    fn generate(&self, messages: &[PromptMessage]) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> From<&'a PromptMessage> for ChatMessage<'a> {
    fn from(message: &'a PromptMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: &message.content,
        }
    }
}

#[derive(Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Serialize)]
pub struct OllamaChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct OllamaChatResponse {
    pub message: Option<ChatMessageResponse>,
}

/// OpenAI-style hosted chat completions.
#[derive(Debug, Clone)]
pub struct RemoteHostedModel {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl RemoteHostedModel {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn check_connection(&self) -> Result<String, GenerationError> {
        let url = format!("{}/models", self.endpoint.trim_end_matches("/chat/completions"));
        let resp: serde_json::Value = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(transport_error)?
            .json()
            .map_err(decode_error)?;

        Ok(format!(
            "Connected ({} models available)",
            resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }
}

impl GenerationClient for RemoteHostedModel {
    fn generate(&self, messages: &[PromptMessage]) -> Result<String, GenerationError> {
        let req = ChatCompletionRequest {
            model: &self.model,
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: REMOTE_TEMPERATURE,
        };

        debug!(model = %self.model, messages = messages.len(), "calling hosted model");

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .map_err(transport_error)?;
        let resp = ensure_success(resp)?;
        let body: ChatCompletionResponse = resp.json().map_err(decode_error)?;

        non_empty(
            body.choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content),
        )
    }
}

/// Ollama-style locally served model.
#[derive(Debug, Clone)]
pub struct LocallyServedModel {
    client: Client,
    endpoint: String,
    model: String,
}

impl LocallyServedModel {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    pub fn check_connection(&self) -> Result<String, GenerationError> {
        let resp: serde_json::Value = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .map_err(transport_error)?
            .json()
            .map_err(decode_error)?;

        Ok(format!(
            "Connected ({} models available)",
            resp["models"].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }
}

impl GenerationClient for LocallyServedModel {
    fn generate(&self, messages: &[PromptMessage]) -> Result<String, GenerationError> {
        let req = OllamaChatRequest {
            model: &self.model,
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: false,
        };

        debug!(model = %self.model, messages = messages.len(), "calling local model");

        let resp = self
            .client
            .post(self.url("/api/chat"))
            .json(&req)
            .send()
            .map_err(transport_error)?;
        let resp = ensure_success(resp)?;
        let body: OllamaChatResponse = resp.json().map_err(decode_error)?;

        non_empty(body.message.and_then(|m| m.content))
    }
}

/// The closed set of backends, chosen once at startup.
#[derive(Debug, Clone)]
pub enum LlmClient {
    Remote(RemoteHostedModel),
    Local(LocallyServedModel),
}

impl LlmClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));

        match settings.llm {
            BackendKind::Openai => {
                let api_key = settings.resolved_api_key().ok_or_else(|| {
                    ConfigError::Missing("api_key for the openai backend".into())
                })?;
                Ok(Self::Remote(RemoteHostedModel::new(
                    settings.resolved_endpoint(),
                    settings.resolved_model(),
                    api_key,
                    timeout,
                )?))
            }
            BackendKind::Ollama => Ok(Self::Local(LocallyServedModel::new(
                settings.resolved_endpoint(),
                settings.resolved_model(),
                timeout,
            )?)),
        }
    }

    pub fn check_connection(&self) -> Result<String, GenerationError> {
        match self {
            LlmClient::Remote(client) => client.check_connection(),
            LlmClient::Local(client) => client.check_connection(),
        }
    }
}

impl GenerationClient for LlmClient {
    fn generate(&self, messages: &[PromptMessage]) -> Result<String, GenerationError> {
        match self {
            LlmClient::Remote(client) => client.generate(messages),
            LlmClient::Local(client) => client.generate(messages),
        }
    }
}

fn build_http_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))
}

fn transport_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Unavailable(format!("request timed out: {e}"))
    } else {
        GenerationError::Unavailable(e.to_string())
    }
}

fn decode_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Unavailable(format!("response timed out: {e}"))
    } else {
        GenerationError::Rejected(format!("invalid response payload: {e}"))
    }
}

fn ensure_success(
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, GenerationError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().unwrap_or_default();
    Err(GenerationError::Rejected(format!(
        "status {}: {}",
        status,
        truncate(&body, 320)
    )))
}

fn non_empty(content: Option<String>) -> Result<String, GenerationError> {
    match content.map(|c| c.trim().to_string()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(GenerationError::Rejected("empty completion".into())),
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Settings;

    #[test]
    fn request_serializes_roles_in_order() {
        let messages = vec![PromptMessage::system("ctx"), PromptMessage::user("line")];
        let req = ChatCompletionRequest {
            model: "m",
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: 0.5,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "line");
    }

    #[test]
    fn decodes_openai_and_ollama_payloads() {
        let openai: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":" done "}}]}"#,
        )
        .unwrap();
        let content = openai.choices.into_iter().next().and_then(|c| c.message.content);
        assert_eq!(non_empty(content).unwrap(), "done");

        let ollama: OllamaChatResponse =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"ok"},"done":true}"#)
                .unwrap();
        assert_eq!(non_empty(ollama.message.and_then(|m| m.content)).unwrap(), "ok");
    }

    #[test]
    fn empty_completion_is_rejected() {
        assert!(matches!(non_empty(None), Err(GenerationError::Rejected(_))));
        assert!(matches!(
            non_empty(Some("   ".into())),
            Err(GenerationError::Rejected(_))
        ));
    }

    #[test]
    fn unreachable_backend_is_unavailable() {
        let client =
            LocallyServedModel::new("http://127.0.0.1:9", "mistral", Duration::from_secs(2))
                .unwrap();
        let err = client.generate(&[PromptMessage::user("hi")]).unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }

    #[test]
    fn silent_backend_times_out_as_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let holder = std::thread::spawn(move || {
            // Accept and hold the connection open without ever answering.
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_secs(3));
            drop(stream);
        });

        let client =
            LocallyServedModel::new(format!("http://{addr}"), "mistral", Duration::from_secs(1))
                .unwrap();
        let err = client.generate(&[PromptMessage::user("hi")]).unwrap_err();

        match err {
            GenerationError::Unavailable(reason) => assert!(reason.contains("timed out"), "{reason}"),
            other => panic!("expected unavailable, got {other:?}"),
        }
        holder.join().unwrap();
    }

    #[test]
    fn check_connection_reports_unreachable_backend() {
        let client =
            LocallyServedModel::new("http://127.0.0.1:9", "mistral", Duration::from_secs(2))
                .unwrap();
        assert!(matches!(
            LlmClient::Local(client).check_connection(),
            Err(GenerationError::Unavailable(_))
        ));
    }

    #[test]
    fn factory_picks_backend_from_settings() {
        let settings = Settings {
            llm: BackendKind::Ollama,
            use_case_context: "ctx".into(),
            system_prompt: "sys".into(),
            ..Settings::default()
        };
        assert!(matches!(
            LlmClient::from_settings(&settings).unwrap(),
            LlmClient::Local(_)
        ));

        let settings = Settings {
            llm: BackendKind::Openai,
            api_key: Some("sk-test".into()),
            ..settings
        };
        assert!(matches!(
            LlmClient::from_settings(&settings).unwrap(),
            LlmClient::Remote(_)
        ));
    }

    #[test]
    fn truncates_long_error_bodies() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
