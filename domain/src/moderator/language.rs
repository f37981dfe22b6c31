//! Structured inputs and outputs of the moderator language generator.
//!
//! The generator itself lives in the application layer; this module holds
//! the value types it exchanges and the lenient parsers applied to model
//! output. Non-JSON responses are accepted as plain text wherever a single
//! text field is enough.

use crate::context::redaction::{CondensedEvent, strip_internal_thoughts};
use crate::context::visible::{ParticipantInfo, PhaseDescriptor};
use crate::core::ids::AgentId;
use crate::parsing::{extract_json_object, field_as_string, field_as_string_list};
use crate::scenario::PhaseConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutline {
    pub phase_id: String,
    pub key_points: Vec<String>,
    pub suggested_questions: Vec<String>,
}

/// Per-phase plan produced before the discussion starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscussionOutline {
    pub phases: Vec<PhaseOutline>,
}

impl DiscussionOutline {
    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(|p| p.key_points.is_empty() && p.suggested_questions.is_empty())
    }

    pub fn for_phase(&self, phase_id: &str) -> Option<&PhaseOutline> {
        self.phases.iter().find(|p| p.phase_id == phase_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Open,
    Directed,
    Clarification,
    Challenge,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Open => "open",
            QuestionType::Directed => "directed",
            QuestionType::Clarification => "clarification",
            QuestionType::Challenge => "challenge",
        }
    }

    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "directed" => QuestionType::Directed,
            "clarification" | "clarify" => QuestionType::Clarification,
            "challenge" | "challenging" => QuestionType::Challenge,
            _ => QuestionType::Open,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidingQuestionInput {
    pub topic: String,
    pub phase: PhaseDescriptor,
    pub recent_events: Vec<CondensedEvent>,
    /// Agents that have been quiet lately, candidates for a directed question.
    pub quiet_agents: Vec<AgentId>,
    pub preferred_type: QuestionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidingQuestion {
    pub text: String,
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<AgentId>,
}

impl GuidingQuestion {
    pub fn to_payload(&self) -> Value {
        json!({
            "text": self.text,
            "question_type": self.question_type.as_str(),
            "target": self.target.as_ref().map(AgentId::as_str),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryInput {
    pub topic: String,
    pub phase_name: String,
    pub events: Vec<CondensedEvent>,
    pub consensus: Vec<String>,
    pub divergence: Vec<String>,
    /// The summary that closes the whole discussion.
    pub is_final: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub text: String,
    pub highlights: Vec<String>,
    pub consensus: Vec<String>,
    pub divergence: Vec<String>,
}

impl SummaryOutput {
    pub fn to_payload(&self) -> Value {
        json!({
            "text": self.text,
            "highlights": self.highlights,
            "consensus": self.consensus,
            "divergence": self.divergence,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemarksInput {
    pub topic: String,
    pub participants: Vec<ParticipantInfo>,
    pub phase_names: Vec<String>,
    /// Final summary text, for closing remarks.
    pub summary: Option<String>,
}

fn clean_text(text: &str) -> Option<String> {
    let text = strip_internal_thoughts(text);
    (!text.is_empty()).then_some(text)
}

/// Parse an outline response. Anything unusable yields an empty outline.
///
/// Expected shape:
/// ```json
/// { "phases": [ { "phase_id": "opening", "key_points": [], "suggested_questions": [] } ] }
/// ```
pub fn parse_outline(text: &str, phases: &[PhaseConfig]) -> DiscussionOutline {
    let Some(json) = extract_json_object(text) else {
        return DiscussionOutline::default();
    };
    let Some(items) = json.get("phases").and_then(Value::as_array) else {
        return DiscussionOutline::default();
    };

    let phases = phases
        .iter()
        .map(|phase| {
            let item = items
                .iter()
                .find(|i| field_as_string(i, "phase_id").as_deref() == Some(phase.id.as_str()));
            PhaseOutline {
                phase_id: phase.id.clone(),
                key_points: item.map(|i| field_as_string_list(i, "key_points")).unwrap_or_default(),
                suggested_questions: item
                    .map(|i| field_as_string_list(i, "suggested_questions"))
                    .unwrap_or_default(),
            }
        })
        .collect();
    DiscussionOutline { phases }
}

/// Parse a guiding question; plain text is taken as an open question.
pub fn parse_guiding_question(text: &str, preferred: QuestionType) -> Option<GuidingQuestion> {
    match extract_json_object(text) {
        Some(json) => {
            let question = field_as_string(&json, "question")
                .or_else(|| field_as_string(&json, "text"))?;
            Some(GuidingQuestion {
                text: clean_text(&question)?,
                question_type: field_as_string(&json, "type")
                    .map(|t| QuestionType::parse_lenient(&t))
                    .unwrap_or(preferred),
                target: field_as_string(&json, "target")
                    .filter(|t| !t.trim().is_empty())
                    .map(AgentId::from),
            })
        }
        None => Some(GuidingQuestion {
            text: clean_text(text)?,
            question_type: preferred,
            target: None,
        }),
    }
}

/// Parse a summary; plain text becomes the summary body and the running
/// consensus/divergence lists are carried over unchanged.
pub fn parse_summary(text: &str, input: &SummaryInput) -> Option<SummaryOutput> {
    match extract_json_object(text) {
        Some(json) => {
            let body =
                field_as_string(&json, "summary").or_else(|| field_as_string(&json, "text"))?;
            let list_or = |key: &str, fallback: &[String]| {
                if json.get(key).is_some() {
                    field_as_string_list(&json, key)
                } else {
                    fallback.to_vec()
                }
            };
            Some(SummaryOutput {
                text: clean_text(&body)?,
                highlights: field_as_string_list(&json, "highlights"),
                consensus: list_or("consensus", &input.consensus),
                divergence: list_or("divergence", &input.divergence),
            })
        }
        None => Some(SummaryOutput {
            text: clean_text(text)?,
            highlights: Vec::new(),
            consensus: input.consensus.clone(),
            divergence: input.divergence.clone(),
        }),
    }
}

/// Parse opening or closing remarks.
pub fn parse_remarks(text: &str) -> Option<String> {
    match extract_json_object(text) {
        Some(json) => field_as_string(&json, "remarks")
            .or_else(|| field_as_string(&json, "text"))
            .and_then(|t| clean_text(&t)),
        None => clean_text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::PhaseType;

    fn summary_input() -> SummaryInput {
        SummaryInput {
            topic: "Four-day week".into(),
            phase_name: "Discussion".into(),
            events: Vec::new(),
            consensus: vec!["pilot first".into()],
            divergence: vec!["scope".into()],
            is_final: false,
        }
    }

    #[test]
    fn test_outline_aligns_with_phases_and_tolerates_garbage() {
        let phases = vec![
            PhaseConfig::new("opening", "Opening", PhaseType::Opening, 2),
            PhaseConfig::new("discussion", "Discussion", PhaseType::Discussion, 5),
        ];
        let outline = parse_outline(
            r#"{"phases":[{"phase_id":"discussion","key_points":["cost"],
                "suggested_questions":["Who pays?"]}]}"#,
            &phases,
        );
        assert_eq!(outline.phases.len(), 2);
        assert!(outline.for_phase("opening").unwrap().key_points.is_empty());
        assert_eq!(
            outline.for_phase("discussion").unwrap().suggested_questions,
            vec!["Who pays?"]
        );

        assert!(parse_outline("no idea", &phases).is_empty());
    }

    #[test]
    fn test_question_json_and_plain_text() {
        let q = parse_guiding_question(
            r#"{"question":"Bob, what would convince you?","type":"directed","target":"bob"}"#,
            QuestionType::Open,
        )
        .unwrap();
        assert_eq!(q.question_type, QuestionType::Directed);
        assert_eq!(q.target, Some(AgentId::new("bob")));

        let plain =
            parse_guiding_question("What is the real risk here?", QuestionType::Challenge).unwrap();
        assert_eq!(plain.question_type, QuestionType::Challenge);
        assert!(plain.target.is_none());

        assert!(parse_guiding_question("   ", QuestionType::Open).is_none());
        assert!(parse_guiding_question(r#"{"type":"open"}"#, QuestionType::Open).is_none());
    }

    #[test]
    fn test_summary_keeps_running_lists_when_absent() {
        let input = summary_input();
        let out = parse_summary(
            r#"{"summary":"Agreed on a pilot.","highlights":["pilot"]}"#,
            &input,
        )
        .unwrap();
        assert_eq!(out.consensus, vec!["pilot first"]);
        assert_eq!(out.highlights, vec!["pilot"]);

        let replaced = parse_summary(r#"{"summary":"x","consensus":[]}"#, &input).unwrap();
        assert!(replaced.consensus.is_empty());

        let plain = parse_summary("Everyone wants a pilot.", &input).unwrap();
        assert_eq!(plain.text, "Everyone wants a pilot.");
        assert_eq!(plain.divergence, vec!["scope"]);
    }

    #[test]
    fn test_remarks_strip_thoughts() {
        assert_eq!(
            parse_remarks("<thinking>keep it short</thinking>Welcome, everyone.").as_deref(),
            Some("Welcome, everyone.")
        );
        assert_eq!(
            parse_remarks(r#"{"remarks":"Thank you all."}"#).as_deref(),
            Some("Thank you all.")
        );
        assert!(parse_remarks("<thinking>only this").is_none());
    }
}
