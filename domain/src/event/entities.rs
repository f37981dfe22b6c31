//! Event entities and the builders used to create them.

use crate::agent::intent::Intent;
use crate::core::ids::{AgentId, EventId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::borrow::Cow;

/// Kind of recorded fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Intent,
    Speech,
    Summary,
    Vote,
    System,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Intent => "INTENT",
            EventType::Speech => "SPEECH",
            EventType::Summary => "SUMMARY",
            EventType::Vote => "VOTE",
            EventType::System => "SYSTEM",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced an event.
///
/// Serialized as a plain string: an agent id, or the reserved values
/// `"moderator"` and `"system"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Speaker {
    Agent(AgentId),
    Moderator,
    System,
}

impl Speaker {
    pub fn as_str(&self) -> &str {
        match self {
            Speaker::Agent(id) => id.as_str(),
            Speaker::Moderator => "moderator",
            Speaker::System => "system",
        }
    }

    /// The agent id, if an agent spoke.
    pub fn agent(&self) -> Option<&AgentId> {
        match self {
            Speaker::Agent(id) => Some(id),
            _ => None,
        }
    }
}

impl From<String> for Speaker {
    fn from(s: String) -> Self {
        match s.as_str() {
            "moderator" => Speaker::Moderator,
            "system" => Speaker::System,
            _ => Speaker::Agent(AgentId::from(s)),
        }
    }
}

impl From<Speaker> for String {
    fn from(s: Speaker) -> Self {
        s.as_str().to_string()
    }
}

impl From<AgentId> for Speaker {
    fn from(id: AgentId) -> Self {
        Speaker::Agent(id)
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an event: free text or a small structured JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventContent {
    Text(String),
    Structured(Value),
}

impl EventContent {
    /// Human-readable rendering of the payload.
    ///
    /// Structured payloads render their `text` field when present, otherwise
    /// the compact JSON.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            EventContent::Text(s) => Cow::Borrowed(s),
            EventContent::Structured(v) => match v.get("text").and_then(Value::as_str) {
                Some(text) => Cow::Borrowed(text),
                None => Cow::Owned(v.to_string()),
            },
        }
    }

    /// Look up a field of a structured payload.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            EventContent::Structured(v) => v.get(key),
            EventContent::Text(_) => None,
        }
    }
}

impl From<String> for EventContent {
    fn from(s: String) -> Self {
        EventContent::Text(s)
    }
}

impl From<&str> for EventContent {
    fn from(s: &str) -> Self {
        EventContent::Text(s.to_string())
    }
}

/// Optional bookkeeping attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<EventId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_cost: Option<u32>,
}

impl EventMeta {
    pub fn for_round(phase_id: impl Into<String>, round: u32) -> Self {
        Self {
            phase_id: Some(phase_id.into()),
            round: Some(round),
            ..Default::default()
        }
    }

    pub fn with_reply_to(mut self, event_id: EventId) -> Self {
        self.reply_to = Some(event_id);
        self
    }

    pub fn with_token_cost(mut self, tokens: u32) -> Self {
        self.token_cost = Some(tokens);
        self
    }
}

/// Immutable, sequenced fact recorded in a session's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub event_type: EventType,
    pub speaker: Speaker,
    pub content: EventContent,
    pub timestamp: DateTime<Utc>,
    pub session_id: SessionId,
    pub sequence: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<EventMeta>,
}

impl Event {
    pub fn phase_id(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.phase_id.as_deref())
    }

    pub fn round(&self) -> Option<u32> {
        self.meta.as_ref().and_then(|m| m.round)
    }

    /// Whether this is a VOTE event asking to end the discussion.
    pub fn is_end_vote(&self) -> bool {
        self.event_type == EventType::Vote
            && self.content.field("end").and_then(Value::as_bool) == Some(true)
    }

    /// The system event kind, for SYSTEM events with a structured payload.
    pub fn system_kind(&self) -> Option<&str> {
        if self.event_type != EventType::System {
            return None;
        }
        self.content.field("kind").and_then(Value::as_str)
    }
}

/// Kinds of SYSTEM events written by the discussion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemKind {
    SessionStarted,
    OpeningRemarks,
    GuidingQuestion,
    PhaseSwitched,
    ClosingRemarks,
    DiscussionEnded,
}

impl SystemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemKind::SessionStarted => "session_started",
            SystemKind::OpeningRemarks => "opening_remarks",
            SystemKind::GuidingQuestion => "guiding_question",
            SystemKind::PhaseSwitched => "phase_switched",
            SystemKind::ClosingRemarks => "closing_remarks",
            SystemKind::DiscussionEnded => "discussion_ended",
        }
    }
}

/// An event before the ledger assigns it an id, timestamp and sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Idempotency key; when `None` the ledger generates one.
    pub event_id: Option<EventId>,
    pub event_type: EventType,
    pub speaker: Speaker,
    pub content: EventContent,
    pub timestamp: Option<DateTime<Utc>>,
    pub meta: Option<EventMeta>,
}

impl NewEvent {
    pub fn new(event_type: EventType, speaker: Speaker, content: impl Into<EventContent>) -> Self {
        Self {
            event_id: None,
            event_type,
            speaker,
            content: content.into(),
            timestamp: None,
            meta: None,
        }
    }

    /// Audit record of a non-pass intent. Only the public fields are stored.
    pub fn intent(intent: &Intent) -> Self {
        Self::new(
            EventType::Intent,
            Speaker::Agent(intent.agent_id.clone()),
            EventContent::Structured(json!({
                "kind": intent.kind.as_str(),
                "urgency": intent.urgency,
                "target": intent.target.as_ref().map(AgentId::as_str),
                "topic": intent.topic,
            })),
        )
    }

    pub fn speech(agent_id: AgentId, text: impl Into<String>) -> Self {
        Self::new(EventType::Speech, Speaker::Agent(agent_id), EventContent::Text(text.into()))
    }

    pub fn vote_end(agent_id: AgentId) -> Self {
        Self::new(
            EventType::Vote,
            Speaker::Agent(agent_id),
            EventContent::Structured(json!({ "end": true })),
        )
    }

    pub fn summary(payload: Value) -> Self {
        Self::new(EventType::Summary, Speaker::Moderator, EventContent::Structured(payload))
    }

    /// SYSTEM event; `payload` fields are merged next to `kind`.
    pub fn system(kind: SystemKind, speaker: Speaker, payload: Value) -> Self {
        let mut body = match payload {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("text".to_string(), other);
                map
            }
        };
        body.insert("kind".to_string(), Value::String(kind.as_str().to_string()));
        Self::new(EventType::System, speaker, EventContent::Structured(Value::Object(body)))
    }

    pub fn with_id(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn with_meta(mut self, meta: EventMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::intent::{Intent, IntentKind};

    #[test]
    fn test_speaker_string_round_trip() {
        assert_eq!(Speaker::from("moderator".to_string()), Speaker::Moderator);
        assert_eq!(Speaker::from("system".to_string()), Speaker::System);
        assert_eq!(
            Speaker::from("alice".to_string()),
            Speaker::Agent(AgentId::new("alice"))
        );
        assert_eq!(serde_json::to_string(&Speaker::Moderator).unwrap(), "\"moderator\"");
    }

    #[test]
    fn test_event_type_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&EventType::Speech).unwrap(), "\"SPEECH\"");
    }

    #[test]
    fn test_content_untagged_deserialize() {
        let text: EventContent = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(text, EventContent::Text("hello".into()));
        let structured: EventContent = serde_json::from_str("{\"end\":true}").unwrap();
        assert_eq!(structured.field("end"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_intent_event_carries_only_public_fields() {
        let intent = Intent::new("alice", IntentKind::Question, 4).with_topic("costs");
        let event = NewEvent::intent(&intent);
        assert_eq!(event.event_type, EventType::Intent);
        let text = event.content.as_text().to_string();
        assert!(text.contains("\"question\""));
        assert!(text.contains("costs"));
        assert!(!text.contains("reasoning"));
    }

    #[test]
    fn test_system_event_merges_kind() {
        let event = NewEvent::system(
            SystemKind::PhaseSwitched,
            Speaker::System,
            json!({ "from": "opening", "to": "debate" }),
        );
        assert_eq!(event.content.field("kind"), Some(&json!("phase_switched")));
        assert_eq!(event.content.field("to"), Some(&json!("debate")));
    }

    #[test]
    fn test_structured_text_rendering_prefers_text_field() {
        let content =
            EventContent::Structured(json!({ "kind": "guiding_question", "text": "Why?" }));
        assert_eq!(content.as_text(), "Why?");
    }
}
