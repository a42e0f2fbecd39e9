//! Chat completion backend: the port and its HTTP implementation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upstream model family the endpoint should route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Deepseek,
    Openai,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Deepseek, Provider::Openai, Provider::Gemini];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Deepseek => "deepseek",
            Provider::Openai => "openai",
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| UnknownProvider(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown provider {0:?} (expected deepseek, openai or gemini)")]
pub struct UnknownProvider(pub String);

/// Request body, `{"message": ..., "provider": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub provider: Provider,
}

/// Response body, `{"choices": [{"text": ...}, ...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice {
    pub text: String,
}

impl ChatResponse {
    /// Text of the first completion choice.
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.text.as_str())
    }
}

/// Something that turns a user message into a completion.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BackendError>;
}

/// Posts JSON to a single chat endpoint.
#[derive(Clone)]
pub struct HttpChatBackend {
    client: Client,
    endpoint: String,
}

impl HttpChatBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::Request)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BackendError> {
        debug!(endpoint = %self.endpoint, provider = %request.provider, "Sending chat request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(BackendError::Request)?;

        let status = response.status();
        let body = response.text().await.map_err(BackendError::Request)?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(BackendError::Decode)?;
        if parsed.choices.is_empty() {
            return Err(BackendError::EmptyChoices);
        }
        Ok(parsed)
    }
}

/// Chat backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Backend error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Response contained no choices")]
    EmptyChoices,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_text() {
        for p in Provider::ALL {
            assert_eq!(p.to_string().parse::<Provider>().ok(), Some(p));
        }
        assert_eq!(" OpenAI ".parse::<Provider>().ok(), Some(Provider::Openai));
        assert!("claude".parse::<Provider>().is_err());
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let request = ChatRequest {
            message: "hi".to_owned(),
            provider: Provider::Gemini,
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value, serde_json::json!({"message": "hi", "provider": "gemini"}));
    }

    #[test]
    fn response_ignores_extra_fields_and_takes_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id": "x", "choices": [{"text": "one", "index": 0}, {"text": "two"}]}"#,
        )
        .expect("parse");
        assert_eq!(response.first_text(), Some("one"));
    }

    #[test]
    fn response_without_choices_key_is_rejected() {
        assert!(serde_json::from_str::<ChatResponse>(r#"{"reply": "hello"}"#).is_err());
    }
}
