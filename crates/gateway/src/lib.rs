//! # Agapay Gateway
//!
//! Boundary between Agapay and the hosted language model.
//!
//! - [`LlmGateway`] is the adapter seam: one structured request in, the model's text out.
//! - [`OpenAiGateway`] talks to a chat-completions endpoint with bearer-token auth.
//! - [`StubGateway`] replays scripted replies in-process and records what it was sent.
//! - [`AgapayAssistant`] owns the three calls the screens make (assessment, companion chat,
//!   logistics report) and converts every [`GatewayError`] into a fixed fallback value.
//!
//! No gateway error is meant to reach a screen: callers use [`AgapayAssistant`], not the raw
//! adapters.

mod assistant;
mod config;
mod openai;
mod prompts;
mod stub;

pub use assistant::{AgapayAssistant, CHAT_FALLBACK, LOGISTICS_FALLBACK};
pub use config::{
    temperature_from_env_value, timeout_from_env_value, GatewayConfig, DEFAULT_API_URL,
    DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
pub use openai::OpenAiGateway;
pub use prompts::assessment_schema;
pub use stub::{StubGateway, StubReply};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One prior turn of a conversation, relayed to the model as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// A structured prompt for the model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GatewayRequest {
    pub system_instruction: String,
    pub user_content: String,
    /// Prior turns, oldest first. Sent between the system instruction and the user content.
    pub history: Vec<ChatTurn>,
    /// Ask the provider for a JSON object instead of free text.
    pub force_json: bool,
    /// Optional JSON schema the reply must conform to. Implies `force_json`.
    pub response_schema: Option<serde_json::Value>,
}

impl GatewayRequest {
    pub fn new(system_instruction: impl Into<String>, user_content: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            user_content: user_content.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn json(mut self) -> Self {
        self.force_json = true;
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.force_json = true;
        self.response_schema = Some(schema);
        self
    }
}

/// Errors raised by gateway adapters.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("API key is missing; set API_KEY")]
    MissingCredential,
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("request to model provider failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("model provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode model provider response: {0}")]
    MalformedBody(#[source] reqwest::Error),
    #[error("model provider returned no message content")]
    EmptyChoice,
    #[error("failed to encode prompt data: {0}")]
    PromptEncoding(#[source] serde_json::Error),
    #[error("model reply is not a valid clinical assessment: {0}")]
    ResponseShape(#[source] serde_json::Error),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Adapter seam for language-model providers.
///
/// One call to `generate` is at most one outbound request. Implementations do not retry.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn generate(&self, request: GatewayRequest) -> GatewayResult<String>;
}
