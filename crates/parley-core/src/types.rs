// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by every stage of the response pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a collaborator trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
    Cache,
}

// --- Conversation context ---

/// Whether a conversation has two participants or more.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    #[default]
    Individual,
    Group,
}

/// Content type of a stored message.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Audio,
    Video,
    Document,
    System,
}

/// One message inside the bounded conversation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMessage {
    /// External message id.
    pub id: String,
    pub content: String,
    /// Sent by the account owner.
    pub from_self: bool,
    /// External contact id of the sender, when the transport knows one.
    #[serde(default)]
    pub sender_external_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub kind: MessageKind,
}

/// Contact record attached to a conversation, user-entered and inferred fields side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Name the user saved for this contact. Always preferred over inference.
    pub display_name: Option<String>,
    /// User-entered relationship, e.g. "colleague" or "sister".
    pub relationship: Option<String>,
    pub notes: Option<String>,
    /// Written by contact inference only.
    pub inferred_name: Option<String>,
    /// Written by contact inference only.
    pub inferred_relationship: Option<String>,
    /// Confidence of the last inference, in `[0, 1]`.
    pub inference_confidence: Option<f64>,
}

impl ContactInfo {
    /// User-entered name, else the inferred one.
    pub fn effective_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.inferred_name.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// User-entered relationship, else the inferred one.
    pub fn effective_relationship(&self) -> Option<&str> {
        self.relationship
            .as_deref()
            .or(self.inferred_relationship.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Per-user reply style preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Free-form tone, e.g. "friendly" or "formal".
    pub tone: String,
    pub response_style: String,
    /// Language code for generated replies.
    pub language: String,
    #[serde(default)]
    pub personality_traits: Vec<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            tone: "friendly".to_string(),
            response_style: "concise".to_string(),
            language: "en".to_string(),
            personality_traits: Vec::new(),
        }
    }
}

/// Coarse conversation topic inferred from recent text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Work,
    Family,
    Travel,
    Health,
    Food,
    Social,
}

/// Derived facts about the conversation as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub chat_type: ChatType,
    /// Messages stored for the conversation, not just those in the window.
    pub message_count: u64,
    /// `None` until at least two replies can be measured.
    pub average_response_time_ms: Option<u64>,
    /// Timestamp of the newest message in the window.
    pub last_interaction_time: Option<DateTime<Utc>>,
    pub topic: Option<Topic>,
}

/// Everything the prompt needs to know about a conversation, assembled per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Oldest first.
    pub messages: Vec<ContextMessage>,
    /// Absent for group chats and for unknown contacts.
    pub contact: Option<ContactInfo>,
    pub preferences: UserPreferences,
    pub metadata: ContextMetadata,
}

/// Pointer from a triggering message to the conversation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRef {
    pub conversation_id: String,
    pub chat_type: ChatType,
    /// The other party of an individual chat. Group chats have none.
    pub contact_id: Option<String>,
}

// --- Generation ---

/// Intent tag assigned to an inbound message.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Question,
    /// Plans, invitations and scheduling.
    Event,
    Appreciation,
    /// Worry, bad news or a request for support.
    Concern,
    Business,
    /// Anything no other rule matched.
    #[default]
    Social,
}

/// Result of one generation call, as handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResponse {
    /// Id of the triggering message, echoed back even on a cache hit.
    pub request_id: String,
    /// Between one and three entries, never empty.
    pub suggestions: Vec<String>,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Model rationale, or the reason a fallback was used.
    pub reasoning: Option<String>,
    pub message_type: MessageType,
    /// True when served from the cache without a model call.
    pub cached: bool,
}

/// Request sent to a model endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask for incremental tokens instead of one completion.
    pub stream: bool,
}

/// A finished, non-streaming model completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

// --- Analytics ---

/// Caller feedback on a suggestion set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
    Neutral,
}

/// One generation, recorded for later aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    /// Together with `user_id`, identifies the record for feedback updates.
    pub request_id: String,
    pub user_id: String,
    pub message_type: MessageType,
    pub confidence: f64,
    pub suggestion_count: u32,
    /// Messages in the context window used for the prompt.
    pub context_message_count: u32,
    pub has_contact_info: bool,
    pub cached: bool,
    pub created_at: DateTime<Utc>,
    /// Zero-based index of the suggestion the user sent, if any.
    pub selected_index: Option<u32>,
    pub feedback: Option<Feedback>,
    /// Text the user sent instead of a suggestion.
    pub custom_response: Option<String>,
}

/// Fields a caller may set on an existing analytics record. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackUpdate {
    pub selected_index: Option<u32>,
    pub feedback: Option<Feedback>,
    pub custom_response: Option<String>,
}

impl FeedbackUpdate {
    /// Applies the update to a record in place.
    pub fn apply_to(&self, record: &mut AnalyticsRecord) {
        if let Some(index) = self.selected_index {
            record.selected_index = Some(index);
        }
        if let Some(feedback) = self.feedback {
            record.feedback = Some(feedback);
        }
        if let Some(custom) = &self.custom_response {
            record.custom_response = Some(custom.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected_index.is_none() && self.feedback.is_none() && self.custom_response.is_none()
    }
}

/// Half-open `[since, until)` window over record creation time. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| at >= since) && self.until.is_none_or(|until| at < until)
    }
}

/// Aggregate view over a user's analytics records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Number of records, one per generation.
    pub total_suggestions: u64,
    pub average_confidence: f64,
    /// Share of records with a selected suggestion.
    pub selection_rate: f64,
    /// Record count per message type name.
    pub message_type_breakdown: std::collections::BTreeMap<String, u64>,
    /// Weighted blend of confidence, selection rate and positive feedback.
    pub quality_score: f64,
}

// --- Ingestion ---

/// Attachment carried by an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub mime_type: String,
}

/// One delivered chat message, as emitted by the ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestEvent {
    pub external_message_id: String,
    pub conversation_id: String,
    /// Account owner the message was delivered to.
    pub user_id: String,
    /// External contact id of the sender, when the transport knows one.
    #[serde(default)]
    pub sender_external_id: Option<String>,
    pub body: String,
    pub from_self: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub chat_type: ChatType,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

// --- Side outputs of background jobs ---

/// A commitment detected in a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promise {
    pub id: String,
    pub message_id: String,
    pub conversation_id: String,
    /// The sentence containing the commitment.
    pub text: String,
    /// Time phrase found alongside it, such as "tomorrow".
    pub due_hint: Option<String>,
    /// True when the user made the promise, false when the contact did.
    pub from_self: bool,
    pub created_at: DateTime<Utc>,
}

/// Inferred contact facts, written only to the `inferred_*` contact fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInference {
    pub contact_id: String,
    pub inferred_name: Option<String>,
    pub inferred_relationship: Option<String>,
    /// In `[0, 1]`. Grows with the number of supporting hits.
    pub confidence: f64,
}

/// Broad media category derived from a MIME type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
}

impl MediaKind {
    /// Classifies by the MIME top-level type. Anything unrecognised is a document.
    pub fn from_mime(mime_type: &str) -> Self {
        let top = mime_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match top.as_str() {
            "image" => MediaKind::Image,
            "audio" => MediaKind::Audio,
            "video" => MediaKind::Video,
            _ => MediaKind::Document,
        }
    }
}

impl From<MediaKind> for MessageKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => MessageKind::Image,
            MediaKind::Audio => MessageKind::Audio,
            MediaKind::Video => MessageKind::Video,
            MediaKind::Document => MessageKind::Document,
        }
    }
}

impl IngestEvent {
    /// Kind of the stored message: text when there is a body, otherwise the
    /// first attachment's media kind.
    pub fn message_kind(&self) -> MessageKind {
        if !self.body.trim().is_empty() {
            return MessageKind::Text;
        }
        self.attachments
            .first()
            .map(|a| MediaKind::from_mime(&a.mime_type).into())
            .unwrap_or(MessageKind::Text)
    }
}

/// Stored descriptor of one attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    pub message_id: String,
    pub url: String,
    pub mime_type: String,
    pub kind: MediaKind,
    pub created_at: DateTime<Utc>,
}
