// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The response generator state machine.
//!
//! One run walks CacheCheck -> ContextBuild -> PromptBuild -> ModelInvoke ->
//! Parse -> SafetyFilter -> CacheWrite -> AnalyticsRecord -> Done. A cache hit
//! short-circuits to Done. Only a failed model invocation reaches Failed;
//! cache, context, parse and analytics problems are logged and absorbed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::StreamExt;
use parley_cache::{CacheEntry, CacheStore};
use parley_config::model::ParleyConfig;
use parley_context::{ContextBuilder, format_for_prompt};
use parley_core::types::{
    AnalyticsRecord, AnalyticsSummary, ChatType, CompletionRequest, ConversationContext,
    DateRange, FeedbackUpdate, GeneratedResponse,
};
use parley_core::{AnalyticsStore, CacheStats, Clock, ModelProvider, ParleyError, StreamSink};
use parley_prompt::{build_prompt, detect_message_type};
use parley_safety::SafetyFilter;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::analytics::summarize;
use crate::parse::parse_model_output;
use crate::recording::{Outcome, record_generation};
use crate::stage::Stage;

/// Suggestions returned by [`ResponseGenerator::generate_response`] when the model call fails.
pub const FAILURE_SUGGESTIONS: [&str; 2] = [
    "Thanks for reaching out! I'll get back to you soon.",
    "Got it, thanks for letting me know.",
];

/// Confidence of a failure fallback.
pub const FAILURE_CONFIDENCE: f64 = 0.3;

type FlightMap = DashMap<String, Arc<Mutex<()>>>;

/// Holds the per-fingerprint lock for the duration of one generation.
///
/// The map entry goes away once no holder or waiter references it.
struct FlightGuard<'a> {
    flights: &'a FlightMap,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.flights
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Turns inbound messages into safe, cached reply suggestions.
pub struct ResponseGenerator {
    provider: Arc<dyn ModelProvider>,
    cache: Arc<CacheStore>,
    context: Arc<ContextBuilder>,
    analytics: Arc<dyn AnalyticsStore>,
    clock: Arc<dyn Clock>,
    safety: SafetyFilter,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    suggestion_count: usize,
    single_flight: bool,
    flights: FlightMap,
}

impl ResponseGenerator {
    pub fn new(
        config: &ParleyConfig,
        provider: Arc<dyn ModelProvider>,
        cache: Arc<CacheStore>,
        context: Arc<ContextBuilder>,
        analytics: Arc<dyn AnalyticsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            cache,
            context,
            analytics,
            clock,
            safety: SafetyFilter::new(),
            model: config.model.model.clone(),
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
            timeout: Duration::from_secs(config.model.timeout_secs),
            suggestion_count: config.generator.suggestion_count,
            single_flight: config.generator.single_flight,
            flights: DashMap::new(),
        }
    }

    /// Generates suggestions, falling back to a fixed pair if the model call fails.
    ///
    /// Always returns at least one suggestion. The failure fallback is neither
    /// cached nor recorded. A supplied sink gets exactly one `on_complete` or
    /// one `on_error`.
    pub async fn generate_response(
        &self,
        request_id: &str,
        content: &str,
        user_id: &str,
        chat_type: ChatType,
        sink: Option<&dyn StreamSink>,
    ) -> GeneratedResponse {
        match self
            .try_generate(request_id, content, user_id, chat_type, sink)
            .await
        {
            Ok(response) => response,
            Err(e) => GeneratedResponse {
                request_id: request_id.to_string(),
                suggestions: FAILURE_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
                confidence: FAILURE_CONFIDENCE,
                reasoning: Some(format!("generation failed ({e}); using fallback suggestions")),
                message_type: detect_message_type(content),
                cached: false,
            },
        }
    }

    /// Runs the pipeline, surfacing model invocation failures as `Err`.
    ///
    /// The queue calls this so that failures consume an attempt and back off.
    pub async fn try_generate(
        &self,
        request_id: &str,
        content: &str,
        user_id: &str,
        chat_type: ChatType,
        sink: Option<&dyn StreamSink>,
    ) -> Result<GeneratedResponse, ParleyError> {
        let started = Instant::now();
        let result = self.run(request_id, content, user_id, chat_type, sink).await;

        let outcome = match &result {
            Ok(response) => {
                if let Some(sink) = sink {
                    sink.on_complete(response).await;
                }
                if response.cached {
                    Outcome::Cached
                } else {
                    Outcome::Generated
                }
            }
            Err(e) => {
                warn!(request_id, user_id, stage = %Stage::Failed, error = %e, "generation failed");
                if let Some(sink) = sink {
                    sink.on_error(e).await;
                }
                if matches!(e, ParleyError::Cancelled) {
                    Outcome::Cancelled
                } else {
                    Outcome::Failed
                }
            }
        };
        record_generation(outcome, started.elapsed().as_secs_f64());
        result
    }

    async fn run(
        &self,
        request_id: &str,
        content: &str,
        user_id: &str,
        chat_type: ChatType,
        sink: Option<&dyn StreamSink>,
    ) -> Result<GeneratedResponse, ParleyError> {
        debug!(request_id, stage = %Stage::CacheCheck);
        if let Some(entry) = self.cache.get(content, user_id).await {
            return Ok(cache_hit(entry, request_id));
        }

        let _flight = if self.single_flight {
            let flight = self.acquire_flight(content, user_id).await;
            // A concurrent leader may have just written the entry.
            if let Some(entry) = self.cache.get(content, user_id).await {
                debug!(request_id, "served by a concurrent generation");
                return Ok(cache_hit(entry, request_id));
            }
            Some(flight)
        } else {
            None
        };

        debug!(request_id, stage = %Stage::ContextBuild);
        let mut context = self.context.build_context(request_id, user_id, None).await;
        context.metadata.chat_type = chat_type;

        debug!(request_id, stage = %Stage::PromptBuild);
        let message_type = detect_message_type(content);
        let formatted = format_for_prompt(&context);
        let prompt = build_prompt(
            content,
            message_type,
            &context,
            &formatted,
            self.suggestion_count,
        );

        debug!(request_id, stage = %Stage::ModelInvoke, streaming = sink.is_some());
        let request = CompletionRequest {
            model: self.model.clone(),
            system_prompt: prompt.system,
            user_prompt: prompt.user,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: sink.is_some(),
        };
        let text = self.invoke(request, sink).await?;

        debug!(request_id, stage = %Stage::Parse, len = text.len());
        let parsed = parse_model_output(&text);

        debug!(request_id, stage = %Stage::SafetyFilter);
        let filtered =
            self.safety
                .validate_and_filter(&parsed.suggestions, parsed.confidence, &context);
        if filtered.had_issues() {
            warn!(
                request_id,
                issues = filtered.issues.len(),
                used_fallback = filtered.used_fallback,
                "model suggestions needed safety remediation"
            );
        }

        let response = GeneratedResponse {
            request_id: request_id.to_string(),
            suggestions: filtered.suggestions,
            confidence: filtered.confidence,
            reasoning: parsed.reasoning,
            message_type,
            cached: false,
        };

        debug!(request_id, stage = %Stage::CacheWrite);
        self.cache.set(content, user_id, &response, None).await;

        debug!(request_id, stage = %Stage::AnalyticsRecord);
        self.record_analytics(&response, user_id, &context).await;

        info!(
            request_id,
            user_id,
            stage = %Stage::Done,
            message_type = %response.message_type,
            suggestions = response.suggestions.len(),
            confidence = response.confidence,
            "response generated"
        );
        Ok(response)
    }

    async fn acquire_flight(&self, content: &str, user_id: &str) -> FlightGuard<'_> {
        let key = self.cache.fingerprint(content, user_id);
        let lock = self.flights.entry(key.clone()).or_default().clone();
        let guard = lock.lock_owned().await;
        FlightGuard {
            flights: &self.flights,
            key,
            guard: Some(guard),
        }
    }

    /// Calls the model within the configured wall-clock budget.
    async fn invoke(
        &self,
        request: CompletionRequest,
        sink: Option<&dyn StreamSink>,
    ) -> Result<String, ParleyError> {
        let call = async {
            match sink {
                Some(sink) => self.invoke_streaming(request, sink).await,
                None => self.provider.complete(request).await.map(|c| c.text),
            }
        };
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ParleyError::Timeout {
                duration: self.timeout,
            }),
        }
    }

    /// Forwards tokens as they arrive and returns the concatenated text.
    ///
    /// Stops and drops the model stream once the sink reports closed.
    async fn invoke_streaming(
        &self,
        request: CompletionRequest,
        sink: &dyn StreamSink,
    ) -> Result<String, ParleyError> {
        let mut stream = self.provider.stream(request).await?;
        let mut text = String::new();
        while let Some(token) = stream.next().await {
            let token = token?;
            if sink.is_closed() {
                debug!(received = text.len(), "stream consumer closed, abandoning model stream");
                return Err(ParleyError::Cancelled);
            }
            sink.on_token(&token).await;
            text.push_str(&token);
        }
        Ok(text)
    }

    async fn record_analytics(
        &self,
        response: &GeneratedResponse,
        user_id: &str,
        context: &ConversationContext,
    ) {
        let record = AnalyticsRecord {
            request_id: response.request_id.clone(),
            user_id: user_id.to_string(),
            message_type: response.message_type,
            confidence: response.confidence,
            suggestion_count: response.suggestions.len() as u32,
            context_message_count: context.messages.len() as u32,
            has_contact_info: context.contact.is_some(),
            cached: response.cached,
            created_at: self.clock.now(),
            selected_index: None,
            feedback: None,
            custom_response: None,
        };
        if let Err(e) = self.analytics.append_record(&record).await {
            warn!(request_id = %record.request_id, error = %e, "analytics append failed");
        }
    }

    /// Applies caller feedback to the stored record. Returns false if no record matched.
    pub async fn update_feedback(
        &self,
        request_id: &str,
        user_id: &str,
        update: &FeedbackUpdate,
    ) -> Result<bool, ParleyError> {
        if update.is_empty() {
            debug!(request_id, "empty feedback update, nothing to apply");
        }
        let updated = self
            .analytics
            .update_feedback(request_id, user_id, update)
            .await?;
        debug!(request_id, user_id, updated, "feedback applied");
        Ok(updated)
    }

    /// Summary of the user's records, optionally limited to `[since, until)`.
    pub async fn get_analytics(
        &self,
        user_id: &str,
        range: Option<DateRange>,
    ) -> Result<AnalyticsSummary, ParleyError> {
        let records = self
            .analytics
            .query_records(user_id, &range.unwrap_or_default())
            .await?;
        Ok(summarize(&records))
    }

    pub async fn get_cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Drops every cached suggestion set for `user_id`. Returns how many entries went.
    pub async fn clear_user_cache(&self, user_id: &str) -> u64 {
        let removed = self.cache.clear_for_user(user_id).await;
        info!(user_id, removed, "user cache cleared");
        removed
    }

    /// Fingerprints currently holding a single-flight lock.
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }
}

fn cache_hit(entry: CacheEntry, request_id: &str) -> GeneratedResponse {
    debug!(request_id, stage = %Stage::Done, "cache hit");
    entry.into_response(request_id)
}
