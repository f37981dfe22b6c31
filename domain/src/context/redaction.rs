//! Removal of private reasoning from public text.

use crate::core::string::truncate_chars;
use crate::event::{Event, EventType, Speaker};
use serde::{Deserialize, Serialize};

const THOUGHT_TAGS: &[&str] = &["thinking", "thought", "inner", "scratchpad", "reasoning"];

/// Remove `<thinking>…</thinking>`-style blocks (and anything after an
/// unclosed opening tag) and trim the result.
pub fn strip_internal_thoughts(text: &str) -> String {
    let mut out = text.to_string();
    for tag in THOUGHT_TAGS {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        while let Some(start) = out.find(&open) {
            match out[start..].find(&close) {
                Some(rel_end) => {
                    out.replace_range(start..start + rel_end + close.len(), "");
                }
                None => out.truncate(start),
            }
        }
        // Stray closing tags carry no content but still leak the marker.
        out = out.replace(&close, "");
    }
    out.trim().to_string()
}

/// Whether any internal-thought marker survives in `text`.
pub fn contains_internal_thought_marker(text: &str) -> bool {
    THOUGHT_TAGS
        .iter()
        .any(|tag| text.contains(&format!("<{tag}>")) || text.contains(&format!("</{tag}>")))
}

/// A public event reduced to what a summarizer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondensedEvent {
    pub sequence: u64,
    pub speaker: String,
    pub event_type: EventType,
    pub text: String,
}

/// Condense events for the moderator language generator.
///
/// INTENT and VOTE events are dropped, thought markers are stripped, and
/// each text is cut to `max_chars`.
pub fn condense_events(events: &[Event], max_chars: usize) -> Vec<CondensedEvent> {
    events
        .iter()
        .filter(|e| {
            matches!(
                e.event_type,
                EventType::Speech | EventType::Summary | EventType::System
            )
        })
        .filter(|e| !(e.event_type == EventType::System && e.speaker == Speaker::System))
        .filter_map(|e| {
            let text = strip_internal_thoughts(&e.content.as_text());
            if text.is_empty() {
                return None;
            }
            Some(CondensedEvent {
                sequence: e.sequence,
                speaker: e.speaker.to_string(),
                event_type: e.event_type,
                text: truncate_chars(&text, max_chars),
            })
        })
        .collect()
}
