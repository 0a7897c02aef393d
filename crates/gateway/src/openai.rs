//! Chat-completions adapter.
//!
//! Request shape:
//!
//! ```text
//! POST <api_url>
//! Authorization: Bearer <API_KEY>
//! { "model": ..., "temperature": ...,
//!   "messages": [system, ...history, user],
//!   "response_format": {"type": "json_object"} | {"type": "json_schema", ...} }
//! ```
//!
//! History turns with role `model` are sent as `assistant`.

use crate::{GatewayConfig, GatewayError, GatewayRequest, GatewayResult, LlmGateway, TurnRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat<'a> {
    JsonObject,
    JsonSchema { json_schema: JsonSchemaSpec<'a> },
}

#[derive(Debug, Serialize)]
struct JsonSchemaSpec<'a> {
    name: &'static str,
    schema: &'a serde_json::Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Gateway adapter for OpenAI-compatible chat-completion endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiGateway {
    http_client: reqwest::Client,
    cfg: GatewayConfig,
}

impl OpenAiGateway {
    /// # Errors
    ///
    /// Returns [`GatewayError::ClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(cfg: GatewayConfig) -> GatewayResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = cfg.timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(GatewayError::ClientBuild)?;
        Ok(Self { http_client, cfg })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.cfg
    }
}

fn build_messages(request: &GatewayRequest) -> Vec<ChatMessage<'_>> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    if !request.system_instruction.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: &request.system_instruction,
        });
    }
    messages.extend(request.history.iter().map(|turn| ChatMessage {
        role: match turn.role {
            TurnRole::User => "user",
            TurnRole::Model => "assistant",
        },
        content: &turn.text,
    }));
    messages.push(ChatMessage {
        role: "user",
        content: &request.user_content,
    });
    messages
}

fn response_format(request: &GatewayRequest) -> Option<ResponseFormat<'_>> {
    match (&request.response_schema, request.force_json) {
        (Some(schema), _) => Some(ResponseFormat::JsonSchema {
            json_schema: JsonSchemaSpec {
                name: "clinical_assessment",
                schema,
                strict: true,
            },
        }),
        (None, true) => Some(ResponseFormat::JsonObject),
        (None, false) => None,
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn generate(&self, request: GatewayRequest) -> GatewayResult<String> {
        let Some(api_key) = self.cfg.api_key() else {
            error!("API key is missing. Set API_KEY to enable the model gateway");
            return Err(GatewayError::MissingCredential);
        };

        let body = ChatCompletionRequest {
            model: self.cfg.model(),
            messages: build_messages(&request),
            temperature: self.cfg.temperature(),
            response_format: response_format(&request),
        };

        info!(
            "[>] LLM call [{}] ({} history turns, json: {})",
            self.cfg.model(),
            request.history.len(),
            request.force_json
        );

        let response = self
            .http_client
            .post(self.cfg.api_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(GatewayError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("[-] Model provider error {}: {}", status, body);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(GatewayError::MalformedBody)?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GatewayError::EmptyChoice)?;

        debug!("[<] LLM response ({} chars)", content.len());
        Ok(content)
    }
}
