//! Strict parsing of an agent's structured model output.
//!
//! The parse boundary is where untrusted model text becomes typed values:
//!
//! - malformed JSON or a missing required field is an [`OutputParseError`]
//!   (fatal for that call);
//! - out-of-range values are normalized here and never reach business logic
//!   (urgency clamped to `[1, 5]`, unknown intent → `pass`, unknown tone →
//!   `calm`, speech truncated to the configured length).

use super::intent::{IntentKind, clamp_urgency};
use crate::context::redaction::strip_internal_thoughts;
use crate::core::ids::AgentId;
use crate::core::string::truncate_chars;
use crate::parsing::{extract_json_object, field_as_string};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const RAW_EXCERPT_CHARS: usize = 200;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OutputParseError {
    #[error("Response is not a JSON object: {raw}")]
    MalformedJson { raw: String },

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl OutputParseError {
    fn malformed(raw: &str) -> Self {
        OutputParseError::MalformedJson {
            raw: truncate_chars(raw.trim(), RAW_EXCERPT_CHARS),
        }
    }
}

/// Tone of a speech, from a small closed set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Calm,
    Assertive,
    Passionate,
    Skeptical,
    Conciliatory,
    Humorous,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Calm => "calm",
            Tone::Assertive => "assertive",
            Tone::Passionate => "passionate",
            Tone::Skeptical => "skeptical",
            Tone::Conciliatory => "conciliatory",
            Tone::Humorous => "humorous",
        }
    }

    /// Unknown values fall back to `Calm`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "assertive" => Tone::Assertive,
            "passionate" => Tone::Passionate,
            "skeptical" => Tone::Skeptical,
            "conciliatory" => Tone::Conciliatory,
            "humorous" => Tone::Humorous,
            _ => Tone::Calm,
        }
    }
}

/// What an agent said it wants to do this round.
///
/// `reasoning` is private: it goes into the agent's own memory and is never
/// written to the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentOutput {
    pub intent: IntentKind,
    pub urgency: u8,
    pub target: Option<AgentId>,
    pub topic: Option<String>,
    pub reasoning: Option<String>,
    pub vote_end: bool,
}

impl IntentOutput {
    pub fn pass() -> Self {
        Self {
            intent: IntentKind::Pass,
            urgency: 1,
            target: None,
            topic: None,
            reasoning: None,
            vote_end: false,
        }
    }
}

/// What an authorized agent said.
///
/// `content` is already stripped of internal-thought markers and truncated;
/// `inner_thought` stays private like [`IntentOutput::reasoning`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOutput {
    pub content: String,
    pub tone: Tone,
    pub addressed_to: Option<AgentId>,
    pub inner_thought: Option<String>,
}

/// Parse an intent response.
///
/// Expected shape:
/// ```json
/// { "intent": "speak", "urgency": 3, "target": "bob", "topic": "...",
///   "reasoning": "...", "vote_end": false }
/// ```
/// `intent` and `urgency` are required.
pub fn parse_intent_output(text: &str) -> Result<IntentOutput, OutputParseError> {
    let json = extract_json_object(text).ok_or_else(|| OutputParseError::malformed(text))?;

    let intent = match json.get("intent") {
        None | Some(Value::Null) => return Err(OutputParseError::MissingField("intent")),
        Some(Value::String(s)) => IntentKind::parse_lenient(s),
        Some(_) => IntentKind::Pass,
    };

    let urgency = match json.get("urgency") {
        None | Some(Value::Null) => return Err(OutputParseError::MissingField("urgency")),
        Some(value) => clamp_urgency(urgency_value(value)?),
    };

    Ok(IntentOutput {
        intent,
        urgency,
        target: field_as_string(&json, "target").map(AgentId::from),
        topic: field_as_string(&json, "topic"),
        reasoning: field_as_string(&json, "reasoning"),
        vote_end: json.get("vote_end").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn urgency_value(value: &Value) -> Result<i64, OutputParseError> {
    let invalid = |reason: &str| OutputParseError::InvalidField {
        field: "urgency",
        reason: reason.to_string(),
    };
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .ok_or_else(|| invalid("not a finite number")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| f.round() as i64)
            .map_err(|_| invalid("not numeric")),
        _ => Err(invalid("expected a number")),
    }
}

/// Parse a speech response, truncating `content` to `max_chars`.
///
/// Expected shape:
/// ```json
/// { "content": "...", "tone": "calm", "addressed_to": "bob", "inner_thought": "..." }
/// ```
/// `content` is required and must be non-empty after redaction.
pub fn parse_speech_output(text: &str, max_chars: usize) -> Result<SpeechOutput, OutputParseError> {
    let json = extract_json_object(text).ok_or_else(|| OutputParseError::malformed(text))?;

    let raw_content = match json.get("content") {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => return Err(OutputParseError::MissingField("content")),
        Some(_) => {
            return Err(OutputParseError::InvalidField {
                field: "content",
                reason: "expected a string".into(),
            });
        }
    };

    let cleaned = strip_internal_thoughts(raw_content);
    if cleaned.is_empty() {
        return Err(OutputParseError::InvalidField {
            field: "content",
            reason: "empty after removing internal notes".into(),
        });
    }

    let tone = json
        .get("tone")
        .and_then(Value::as_str)
        .map(Tone::parse_lenient)
        .unwrap_or_default();

    Ok(SpeechOutput {
        content: truncate_chars(&cleaned, max_chars),
        tone,
        addressed_to: field_as_string(&json, "addressed_to").map(AgentId::from),
        inner_thought: field_as_string(&json, "inner_thought"),
    })
}
