// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for Anthropic Messages API streaming responses.
//!
//! Converts a reqwest response byte stream into typed [`StreamEvent`]s
//! using `eventsource-stream` for the SSE framing.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use parley_core::ParleyError;

use crate::types::{SseContentBlockDelta, SseError, SseMessageStart};

/// Stream events the reply pipeline cares about.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    MessageStart(SseMessageStart),
    ContentBlockDelta(SseContentBlockDelta),
    MessageStop,
    Ping,
    Error(SseError),
}

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ParleyError>> + Send>>;

fn decode<T: serde::de::DeserializeOwned>(
    data: &str,
    event: &str,
) -> Result<T, ParleyError> {
    serde_json::from_str(data).map_err(|e| ParleyError::Provider {
        message: format!("failed to parse {event}: {e}"),
        transient: false,
        source: Some(Box::new(e)),
    })
}

/// Parses a streaming response body into [`StreamEvent`]s.
///
/// Events with no bearing on the reply text (block start/stop, message
/// deltas, anything newer than this client) are skipped.
pub fn parse_sse_stream(response: reqwest::Response) -> EventStream {
    let events = response.bytes_stream().eventsource();

    let mapped = events.filter_map(|result| async move {
        match result {
            Ok(event) => {
                let parsed = match event.event.as_str() {
                    "message_start" => {
                        decode(&event.data, "message_start").map(StreamEvent::MessageStart)
                    }
                    "content_block_delta" => decode(&event.data, "content_block_delta")
                        .map(StreamEvent::ContentBlockDelta),
                    "message_stop" => Ok(StreamEvent::MessageStop),
                    "ping" => Ok(StreamEvent::Ping),
                    "error" => decode(&event.data, "error event").map(StreamEvent::Error),
                    _ => return None,
                };
                Some(parsed)
            }
            // A broken transport mid-stream is worth another attempt.
            Err(e) => Some(Err(ParleyError::Provider {
                message: format!("SSE stream error: {e}"),
                transient: true,
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SseDelta;

    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;

        reqwest::get(&server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn parses_text_deltas() {
        let sse = "event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);

        match stream.next().await.unwrap().unwrap() {
            StreamEvent::ContentBlockDelta(d) => match d.delta {
                SseDelta::TextDelta { text } => assert_eq!(text, "Hello"),
                other => panic!("unexpected delta: {other:?}"),
            },
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn skips_unconsumed_events() {
        let sse = concat!(
            "event: content_block_start\ndata: {\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
            "event: ping\ndata: {}\n\n",
            "event: content_block_stop\ndata: {\"index\":0}\n\n",
            "event: message_delta\ndata: {\"delta\":{\"stop_reason\":\"end_turn\"}}\n\n",
            "event: message_stop\ndata: {}\n\n",
        );
        let events: Vec<_> = parse_sse_stream(mock_sse_response(sse).await)
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(StreamEvent::Ping)));
        assert!(matches!(events[1], Ok(StreamEvent::MessageStop)));
    }

    #[tokio::test]
    async fn parses_error_event() {
        let sse = "event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);
        match stream.next().await.unwrap().unwrap() {
            StreamEvent::Error(err) => {
                assert_eq!(err.error.type_, "overloaded_error");
                assert!(err.error.is_transient());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let sse = "event: content_block_delta\ndata: not json\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("content_block_delta"));
    }
}
