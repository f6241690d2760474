// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic model provider for Parley.
//!
//! Implements [`ModelProvider`] over the Anthropic Messages API with batch
//! completion and SSE token streaming.

pub mod client;
pub mod sse;
pub mod types;

use std::future::ready;

use async_trait::async_trait;
use futures::stream::StreamExt;
use parley_config::model::ModelConfig;
use parley_core::error::ParleyError;
use parley_core::traits::{ModelProvider, PluginAdapter, TokenStream};
use parley_core::types::{AdapterType, Completion, CompletionRequest, HealthStatus};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::sse::StreamEvent;
use crate::types::{ApiMessage, MessageRequest, SseDelta};

/// Anthropic provider. The API key comes from config, then
/// `ANTHROPIC_API_KEY`.
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    pub fn new(config: &ModelConfig) -> Result<Self, ParleyError> {
        let api_key = resolve_api_key(config.api_key.as_deref(), |name| std::env::var(name).ok())?;
        let client = AnthropicClient::new(&api_key, &config.api_version, &config.base_url)?;
        info!(
            model = config.model,
            endpoint = client.endpoint(),
            "Anthropic provider initialized"
        );
        Ok(Self { client })
    }

    fn to_message_request(request: &CompletionRequest) -> MessageRequest {
        MessageRequest {
            model: request.model.clone(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: request.user_prompt.clone(),
            }],
            system: (!request.system_prompt.is_empty()).then(|| request.system_prompt.clone()),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: request.stream,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        // No test request: it would spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        debug!("Anthropic provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ParleyError> {
        let response = self
            .client
            .complete_message(&Self::to_message_request(&request))
            .await?;
        Ok(Completion {
            text: response.text(),
            model: response.model,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<TokenStream, ParleyError> {
        let events = self
            .client
            .stream_message(&Self::to_message_request(&request))
            .await?;

        // message_stop ends the token stream even if the connection lingers.
        let tokens = events
            .take_while(|event| ready(!matches!(event, Ok(StreamEvent::MessageStop))))
            .filter_map(|event| ready(event_to_token(event)));
        Ok(Box::pin(tokens))
    }
}

fn event_to_token(event: Result<StreamEvent, ParleyError>) -> Option<Result<String, ParleyError>> {
    match event {
        Ok(StreamEvent::ContentBlockDelta(delta)) => match delta.delta {
            SseDelta::TextDelta { text } => Some(Ok(text)),
            SseDelta::Other => None,
        },
        Ok(StreamEvent::MessageStart(start)) => {
            debug!(
                id = start.message.id,
                model = start.message.model,
                input_tokens = start.message.usage.input_tokens,
                "stream started"
            );
            None
        }
        Ok(StreamEvent::Error(err)) => Some(Err(ParleyError::Provider {
            message: format!("{}: {}", err.error.type_, err.error.message),
            transient: err.error.is_transient(),
            source: None,
        })),
        Ok(StreamEvent::Ping | StreamEvent::MessageStop) => None,
        Err(e) => Some(Err(e)),
    }
}

/// Config key first, then the environment. Blank values count as missing.
fn resolve_api_key(
    config_key: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<String, ParleyError> {
    config_key
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| env("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()))
        .ok_or_else(|| {
            ParleyError::Config(
                "Anthropic API key not found. Set model.api_key in config or the ANTHROPIC_API_KEY environment variable.".into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> ModelConfig {
        ModelConfig {
            api_key: Some("test-key".into()),
            base_url: base_url.to_string(),
            ..ModelConfig::default()
        }
    }

    fn request(stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: "claude-3-5-haiku-20241022".into(),
            system_prompt: "You draft replies.".into(),
            user_prompt: "Message: \"hi\"".into(),
            temperature: 0.7,
            max_tokens: 500,
            stream,
        }
    }

    #[test]
    fn api_key_prefers_config() {
        let key = resolve_api_key(Some("sk-config"), |_| Some("sk-env".into())).unwrap();
        assert_eq!(key, "sk-config");
    }

    #[test]
    fn api_key_falls_back_to_env_when_blank() {
        let key = resolve_api_key(Some("  "), |name| {
            (name == "ANTHROPIC_API_KEY").then(|| "sk-env".to_string())
        })
        .unwrap();
        assert_eq!(key, "sk-env");
        assert_eq!(resolve_api_key(None, |_| Some("sk-env".into())).unwrap(), "sk-env");
    }

    #[test]
    fn api_key_missing_everywhere_is_config_error() {
        let err = resolve_api_key(None, |_| None).unwrap_err();
        assert!(matches!(err, ParleyError::Config(_)));
    }

    #[test]
    fn completion_request_maps_to_wire_request() {
        let wire = AnthropicProvider::to_message_request(&request(true));
        assert_eq!(wire.system.as_deref(), Some("You draft replies."));
        assert_eq!(wire.messages.len(), 1);
        assert_eq!(wire.messages[0].role, "user");
        assert_eq!(wire.max_tokens, 500);
        assert!(wire.stream);

        let mut no_system = request(false);
        no_system.system_prompt.clear();
        assert!(AnthropicProvider::to_message_request(&no_system).system.is_none());
    }

    #[tokio::test]
    async fn complete_returns_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(serde_json::json!({"temperature": 0.7})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "{\"suggestions\":[\"Sure!\"],\"confidence\":0.9}"}],
                "model": "claude-3-5-haiku-20241022",
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 42, "output_tokens": 12}
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(&config(&server.uri())).unwrap();
        let completion = provider.complete(request(false)).await.unwrap();
        assert!(completion.text.contains("Sure!"));
        assert_eq!(completion.input_tokens, 42);
        assert_eq!(completion.output_tokens, 12);
    }

    #[tokio::test]
    async fn stream_yields_text_deltas_until_message_stop() {
        let sse = concat!(
            "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_s\",\"model\":\"claude\",\"usage\":{\"input_tokens\":5,\"output_tokens\":0}}}\n\n",
            "event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Sounds \"}}\n\n",
            "event: ping\ndata: {}\n\n",
            "event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"good\"}}\n\n",
            "event: message_stop\ndata: {}\n\n",
            "event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"LATE\"}}\n\n",
        );
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(&config(&server.uri())).unwrap();
        let tokens: Vec<String> = provider
            .stream(request(true))
            .await
            .unwrap()
            .map(|t| t.unwrap())
            .collect()
            .await;
        assert_eq!(tokens, vec!["Sounds ".to_string(), "good".to_string()]);
    }

    #[tokio::test]
    async fn stream_error_event_becomes_provider_error() {
        let sse = concat!(
            "event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n",
            "event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
        );
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(&config(&server.uri())).unwrap();
        let items: Vec<_> = provider.stream(request(true)).await.unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "Hi");
        let err = items[1].as_ref().unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("overloaded_error"));
    }

    #[tokio::test]
    async fn plugin_adapter_metadata() {
        let provider = AnthropicProvider::new(&config("http://localhost:1")).unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.adapter_type(), AdapterType::Provider);
        assert_eq!(provider.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
