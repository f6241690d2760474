// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end runs of the response generator against in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use parley_cache::{CacheStore, MemoryCacheBackend};
use parley_config::ParleyConfig;
use parley_context::ContextBuilder;
use parley_core::types::{
    ChatType, ContactInfo, ContextMessage, ConversationRef, DateRange, Feedback, FeedbackUpdate,
    MessageKind, MessageType,
};
use parley_core::{CacheBackend, ParleyError};
use parley_generator::{
    ChannelSink, FAILURE_CONFIDENCE, FAILURE_SUGGESTIONS, ResponseGenerator, StreamEvent,
};
use parley_test_utils::{
    DEFAULT_REPLY, FailingCacheBackend, ManualClock, MemoryStore, MockProvider, MockReply,
    RecordingSink,
};
use tracing_test::traced_test;

struct Harness {
    store: Arc<MemoryStore>,
    provider: Arc<MockProvider>,
    generator: ResponseGenerator,
}

fn harness_with(
    provider: MockProvider,
    backend: Arc<dyn CacheBackend>,
    tweak: impl FnOnce(&mut ParleyConfig),
) -> Harness {
    let mut config = ParleyConfig::default();
    tweak(&mut config);

    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
    ));
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(provider);
    let cache = Arc::new(CacheStore::new(&config.cache, backend, clock.clone()));
    let context = Arc::new(ContextBuilder::new(
        &config.context,
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let generator = ResponseGenerator::new(
        &config,
        provider.clone(),
        cache,
        context,
        store.clone(),
        clock,
    );
    Harness {
        store,
        provider,
        generator,
    }
}

fn harness(provider: MockProvider) -> Harness {
    harness_with(provider, Arc::new(MemoryCacheBackend::new()), |_| {})
}

fn seed_conversation(store: &MemoryStore, relationship: Option<&str>) {
    store.add_conversation(ConversationRef {
        conversation_id: "c-1".into(),
        chat_type: ChatType::Individual,
        contact_id: Some("k-1".into()),
    });
    store.add_message(
        "c-1",
        ContextMessage {
            id: "m-1".into(),
            content: "Are we still on for lunch?".into(),
            from_self: false,
            sender_external_id: Some("k-1".into()),
            timestamp: Utc.with_ymd_and_hms(2026, 6, 1, 11, 59, 0).unwrap(),
            kind: MessageKind::Text,
        },
    );
    store.set_contact(
        "k-1",
        ContactInfo {
            display_name: Some("Sam".into()),
            relationship: relationship.map(str::to_string),
            ..Default::default()
        },
    );
}

#[tokio::test]
async fn batch_generation_caches_and_records() {
    let h = harness(MockProvider::new());
    seed_conversation(&h.store, Some("friend"));

    let first = h
        .generator
        .try_generate("m-1", "Are we still on for lunch?", "u-1", ChatType::Individual, None)
        .await
        .unwrap();
    assert!(!first.cached);
    assert_eq!(first.suggestions.len(), 3);
    assert_eq!(first.confidence, 0.85);
    assert_eq!(first.message_type, MessageType::Question);

    let records = h.store.analytics_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].request_id, "m-1");
    assert_eq!(records[0].context_message_count, 1);
    assert!(records[0].has_contact_info);

    // Same text and user from a different triggering message reuses the entry.
    let second = h
        .generator
        .try_generate("m-2", "Are we still on for lunch?", "u-1", ChatType::Individual, None)
        .await
        .unwrap();
    assert!(second.cached);
    assert_eq!(second.request_id, "m-2");
    assert_eq!(second.suggestions, first.suggestions);
    assert_eq!(h.provider.call_count(), 1);
    assert_eq!(h.store.analytics_records().len(), 1);
}

#[tokio::test]
async fn prompt_carries_message_and_relationship() {
    let h = harness(MockProvider::new());
    seed_conversation(&h.store, Some("colleague"));

    h.generator
        .generate_response("m-1", "Thanks so much for the help!", "u-1", ChatType::Individual, None)
        .await;

    let requests = h.provider.requests().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(!request.stream);
    assert_eq!(request.temperature, 0.7);
    assert_eq!(request.max_tokens, 500);
    assert!(request.user_prompt.contains("Thanks so much for the help!"));
    assert!(request.user_prompt.contains("colleague"));
    assert!(request.system_prompt.contains("JSON"));
}

#[tokio::test]
async fn chat_type_argument_selects_group_template() {
    let h = harness(MockProvider::new());
    seed_conversation(&h.store, None);

    h.generator
        .generate_response("m-1", "Who is bringing snacks?", "u-1", ChatType::Group, None)
        .await;

    let request = &h.provider.requests().await[0];
    assert!(request.system_prompt.contains("group conversation"));
    assert!(request.user_prompt.contains("group chat"));
}

#[tokio::test]
async fn different_content_never_shares_an_entry() {
    let h = harness(MockProvider::new());

    h.generator
        .generate_response("m-1", "See you at 5", "u-1", ChatType::Individual, None)
        .await;
    let other = h
        .generator
        .generate_response("m-2", "See you at 6", "u-1", ChatType::Individual, None)
        .await;

    assert!(!other.cached);
    assert_eq!(h.provider.call_count(), 2);
}

#[tokio::test]
#[traced_test]
async fn model_failure_yields_uncached_fallback() {
    let h = harness(MockProvider::with_replies(vec![MockReply::transient_error(
        "connection reset",
    )]));

    let err = h
        .generator
        .try_generate("m-1", "hello there", "u-1", ChatType::Individual, None)
        .await
        .unwrap_err();
    assert!(err.is_transient());

    h.provider
        .add_reply(MockReply::transient_error("connection reset"))
        .await;
    let response = h
        .generator
        .generate_response("m-2", "hello there", "u-1", ChatType::Individual, None)
        .await;
    assert_eq!(response.suggestions, FAILURE_SUGGESTIONS.to_vec());
    assert_eq!(response.confidence, FAILURE_CONFIDENCE);
    assert!(!response.cached);
    assert!(response.reasoning.unwrap().contains("connection reset"));
    assert!(h.store.analytics_records().is_empty());
    assert!(logs_contain("generation failed"));

    // Nothing was cached, so the next call reaches the model again.
    let recovered = h
        .generator
        .generate_response("m-3", "hello there", "u-1", ChatType::Individual, None)
        .await;
    assert!(!recovered.cached);
    assert_eq!(h.provider.call_count(), 3);
}

#[tokio::test]
async fn malformed_output_uses_parse_fallback() {
    let h = harness(MockProvider::with_responses(vec!["Sorry, I can't help with that."]));

    let response = h
        .generator
        .try_generate("m-1", "what's up", "u-1", ChatType::Individual, None)
        .await
        .unwrap();
    assert_eq!(response.suggestions.len(), 2);
    assert_eq!(response.confidence, 0.5);
    assert!(response.reasoning.unwrap().contains("fallback"));
}

#[tokio::test]
#[traced_test]
async fn all_unsafe_suggestions_collapse_to_one_fallback() {
    let reply = r#"{"suggestions":["Mail me at sam@example.com","Send me your credit card number","Call 555-123-4567 now"],"confidence":0.9}"#;
    let h = harness(MockProvider::with_responses(vec![reply]));

    let response = h
        .generator
        .generate_response("m-1", "how do I reach you?", "u-1", ChatType::Individual, None)
        .await;
    assert_eq!(response.suggestions.len(), 1);
    assert!(response.confidence <= 0.3);
    assert!(logs_contain("model suggestions needed safety remediation"));
    assert!(logs_contain("used_fallback=true"));
}

#[tokio::test]
async fn empty_suggestion_list_still_returns_one() {
    let h = harness(MockProvider::with_responses(vec![
        r#"{"suggestions":[],"confidence":0.9}"#,
    ]));

    let response = h
        .generator
        .generate_response("m-1", "ok", "u-1", ChatType::Individual, None)
        .await;
    assert_eq!(response.suggestions.len(), 1);
    assert!(response.confidence <= 0.3);
}

#[tokio::test]
async fn streaming_forwards_tokens_then_completes_once() {
    let h = harness(MockProvider::new());
    let sink = RecordingSink::new();

    let response = h
        .generator
        .try_generate("m-1", "dinner tonight?", "u-1", ChatType::Individual, Some(&sink))
        .await
        .unwrap();

    let tokens = sink.tokens();
    assert!(tokens.len() > 1);
    assert_eq!(tokens.concat(), DEFAULT_REPLY);
    assert_eq!(sink.completions(), vec![response]);
    assert!(sink.errors().is_empty());
    assert!(h.provider.requests().await[0].stream);
}

#[tokio::test]
async fn cache_hit_with_sink_completes_without_tokens() {
    let h = harness(MockProvider::new());
    h.generator
        .generate_response("m-1", "dinner tonight?", "u-1", ChatType::Individual, None)
        .await;

    let sink = RecordingSink::new();
    let response = h
        .generator
        .generate_response("m-2", "dinner tonight?", "u-1", ChatType::Individual, Some(&sink))
        .await;
    assert!(response.cached);
    assert!(sink.tokens().is_empty());
    assert_eq!(sink.completions().len(), 1);
}

#[tokio::test]
async fn closed_sink_cancels_generation() {
    let h = harness(MockProvider::new());
    let sink = RecordingSink::closing_after(2);

    let err = h
        .generator
        .try_generate("m-1", "dinner tonight?", "u-1", ChatType::Individual, Some(&sink))
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Cancelled));
    assert_eq!(sink.tokens().len(), 2);
    assert_eq!(sink.errors().len(), 1);
    assert!(sink.completions().is_empty());
    assert!(h.store.analytics_records().is_empty());
}

#[tokio::test]
async fn stream_failure_reports_exactly_one_error() {
    let h = harness(MockProvider::with_replies(vec![MockReply::StreamError {
        tokens: vec!["{\"sugg".into()],
        message: "stream interrupted".into(),
    }]));
    let sink = RecordingSink::new();

    let response = h
        .generator
        .generate_response("m-1", "you around?", "u-1", ChatType::Individual, Some(&sink))
        .await;
    assert_eq!(response.confidence, FAILURE_CONFIDENCE);
    assert_eq!(sink.tokens(), vec!["{\"sugg".to_string()]);
    assert_eq!(sink.errors().len(), 1);
    assert!(sink.completions().is_empty());
}

#[tokio::test]
async fn channel_sink_receives_the_final_response() {
    let h = harness(MockProvider::new());
    let (sink, mut rx) = ChannelSink::channel(64);

    let response = h
        .generator
        .try_generate("m-1", "dinner tonight?", "u-1", ChatType::Individual, Some(&sink))
        .await
        .unwrap();
    drop(sink);

    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }
    assert_eq!(last, Some(StreamEvent::Complete(response)));
}

#[tokio::test(start_paused = true)]
async fn slow_model_times_out() {
    let h = harness_with(
        MockProvider::with_replies(vec![MockReply::Delayed(
            Duration::from_secs(60),
            Box::new(MockReply::text(DEFAULT_REPLY)),
        )]),
        Arc::new(MemoryCacheBackend::new()),
        |config| config.model.timeout_secs = 5,
    );

    let err = h
        .generator
        .try_generate("m-1", "hey", "u-1", ChatType::Individual, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Timeout { duration } if duration == Duration::from_secs(5)));
    assert!(err.is_transient());
}

#[tokio::test(start_paused = true)]
async fn concurrent_misses_share_one_model_call() {
    let h = harness(MockProvider::with_replies(vec![MockReply::Delayed(
        Duration::from_millis(500),
        Box::new(MockReply::text(DEFAULT_REPLY)),
    )]));

    let (a, b) = tokio::join!(
        h.generator
            .try_generate("m-1", "party saturday?", "u-1", ChatType::Individual, None),
        h.generator
            .try_generate("m-2", "party saturday?", "u-1", ChatType::Individual, None),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(h.provider.call_count(), 1);
    assert!(a.cached != b.cached);
    assert_eq!(a.suggestions, b.suggestions);
    assert_eq!(h.generator.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn single_flight_can_be_disabled() {
    let h = harness_with(
        MockProvider::with_replies(vec![
            MockReply::Delayed(
                Duration::from_millis(500),
                Box::new(MockReply::text(DEFAULT_REPLY)),
            ),
            MockReply::Delayed(
                Duration::from_millis(500),
                Box::new(MockReply::text(DEFAULT_REPLY)),
            ),
        ]),
        Arc::new(MemoryCacheBackend::new()),
        |config| config.generator.single_flight = false,
    );

    let _ = tokio::join!(
        h.generator
            .try_generate("m-1", "party saturday?", "u-1", ChatType::Individual, None),
        h.generator
            .try_generate("m-2", "party saturday?", "u-1", ChatType::Individual, None),
    );
    assert_eq!(h.provider.call_count(), 2);
}

#[tokio::test]
async fn unavailable_cache_and_context_degrade() {
    let h = harness_with(MockProvider::new(), Arc::new(FailingCacheBackend), |_| {});
    seed_conversation(&h.store, Some("friend"));
    h.store.fail_messages(true);

    let response = h
        .generator
        .try_generate("m-1", "Are we still on for lunch?", "u-1", ChatType::Individual, None)
        .await
        .unwrap();
    assert_eq!(response.suggestions.len(), 3);
    assert_eq!(h.generator.get_cache_stats().await.total_keys, 0);
    assert_eq!(h.store.analytics_records()[0].context_message_count, 0);
}

#[tokio::test]
async fn analytics_failure_does_not_fail_generation() {
    let h = harness(MockProvider::new());
    h.store.fail_analytics(true);

    let response = h
        .generator
        .try_generate("m-1", "hi", "u-1", ChatType::Individual, None)
        .await;
    assert!(response.is_ok());
}

#[tokio::test]
async fn clearing_user_cache_forces_regeneration() {
    let h = harness(MockProvider::new());
    h.generator
        .generate_response("m-1", "ping", "u-1", ChatType::Individual, None)
        .await;
    h.generator
        .generate_response("m-2", "ping", "u-2", ChatType::Individual, None)
        .await;
    assert!(h.generator.get_cache_stats().await.total_keys >= 2);

    assert_eq!(h.generator.clear_user_cache("u-1").await, 1);

    let again = h
        .generator
        .generate_response("m-3", "ping", "u-1", ChatType::Individual, None)
        .await;
    assert!(!again.cached);
    let other = h
        .generator
        .generate_response("m-4", "ping", "u-2", ChatType::Individual, None)
        .await;
    assert!(other.cached);
}

#[tokio::test]
async fn feedback_is_idempotent_and_feeds_analytics() {
    let h = harness(MockProvider::new());
    h.generator
        .generate_response("m-1", "ping", "u-1", ChatType::Individual, None)
        .await;

    let update = FeedbackUpdate {
        selected_index: Some(1),
        feedback: Some(Feedback::Positive),
        custom_response: None,
    };
    assert!(h.generator.update_feedback("m-1", "u-1", &update).await.unwrap());
    let once = h.store.analytics_records();
    assert!(h.generator.update_feedback("m-1", "u-1", &update).await.unwrap());
    assert_eq!(h.store.analytics_records(), once);

    assert!(
        !h.generator
            .update_feedback("missing", "u-1", &update)
            .await
            .unwrap()
    );

    let summary = h.generator.get_analytics("u-1", None).await.unwrap();
    assert_eq!(summary.total_suggestions, 1);
    assert_eq!(summary.selection_rate, 1.0);
    // 0.4 * 0.85 + 0.4 * 1.0 + 0.2 * 1.0
    assert_eq!(summary.quality_score, 0.94);

    let later = DateRange {
        since: Some(Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()),
        until: None,
    };
    let empty = h.generator.get_analytics("u-1", Some(later)).await.unwrap();
    assert_eq!(empty.total_suggestions, 0);
    assert_eq!(empty.quality_score, 0.0);
}
