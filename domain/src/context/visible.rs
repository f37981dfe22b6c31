//! The public view of a discussion handed to an agent.

use super::redaction::strip_internal_thoughts;
use crate::agent::persona::AgentPersona;
use crate::core::ids::AgentId;
use crate::core::string::truncate_chars;
use crate::event::{Event, EventType};
use crate::scenario::{PhaseConfig, PhaseType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the discussion currently stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDescriptor {
    pub phase_id: String,
    pub phase_type: PhaseType,
    pub name: String,
    pub description: String,
    /// 1-based round within the phase, as seen by the agent.
    pub round: u32,
    pub max_rounds: u32,
}

impl PhaseDescriptor {
    pub fn from_config(phase: &PhaseConfig, phase_round: u32) -> Self {
        Self {
            phase_id: phase.id.clone(),
            phase_type: phase.phase_type,
            name: phase.name.clone(),
            description: phase.description.clone(),
            round: phase_round + 1,
            max_rounds: phase.max_rounds,
        }
    }
}

/// One public event as an agent sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleEvent {
    pub speaker: String,
    pub event_type: EventType,
    pub content: String,
    pub relative_time: String,
}

/// Public identity card of another participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: AgentId,
    pub name: String,
    pub role: String,
}

impl From<&AgentPersona> for ParticipantInfo {
    fn from(persona: &AgentPersona) -> Self {
        Self {
            id: persona.id.clone(),
            name: persona.name.clone(),
            role: persona.role.clone(),
        }
    }
}

/// Everything an agent may build a prompt from, apart from its own persona
/// and memory.
///
/// Built from public events only. INTENT and VOTE events are bookkeeping
/// and never shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentVisibleContext {
    pub topic: String,
    pub phase: PhaseDescriptor,
    pub recent_events: Vec<VisibleEvent>,
    pub phase_summary: Option<String>,
    pub participants: Vec<ParticipantInfo>,
    pub called_on: bool,
    pub call_reason: Option<String>,
}

impl AgentVisibleContext {
    /// Build the shared snapshot for one round.
    ///
    /// `events` is any ascending slice of the log; at most `window` visible
    /// events are kept (the most recent ones) and each is cut to
    /// `max_event_chars`.
    pub fn build(
        topic: impl Into<String>,
        phase: PhaseDescriptor,
        events: &[Event],
        window: usize,
        max_event_chars: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let phase_summary = events
            .iter()
            .rev()
            .find(|e| {
                e.event_type == EventType::Summary
                    && e.phase_id() == Some(phase.phase_id.as_str())
            })
            .map(|e| strip_internal_thoughts(&e.content.as_text()));

        let visible: Vec<&Event> = events.iter().filter(|e| is_visible(e)).collect();
        let start = visible.len().saturating_sub(window);
        let recent_events = visible[start..]
            .iter()
            .filter_map(|e| {
                let text = strip_internal_thoughts(&e.content.as_text());
                if text.is_empty() {
                    return None;
                }
                Some(VisibleEvent {
                    speaker: e.speaker.to_string(),
                    event_type: e.event_type,
                    content: truncate_chars(&text, max_event_chars),
                    relative_time: relative_time(e.timestamp, now),
                })
            })
            .collect();

        Self {
            topic: topic.into(),
            phase,
            recent_events,
            phase_summary,
            participants: Vec::new(),
            called_on: false,
            call_reason: None,
        }
    }

    pub fn with_participants(mut self, participants: Vec<ParticipantInfo>) -> Self {
        self.participants = participants;
        self
    }

    /// Copy of this view for an agent the moderator called on.
    pub fn with_call(&self, reason: impl Into<String>) -> Self {
        let mut ctx = self.clone();
        ctx.called_on = true;
        ctx.call_reason = Some(reason.into());
        ctx
    }

    /// Participants other than `me`.
    pub fn others<'a>(&'a self, me: &'a AgentId) -> impl Iterator<Item = &'a ParticipantInfo> {
        self.participants.iter().filter(move |p| &p.id != me)
    }
}

fn is_visible(event: &Event) -> bool {
    match event.event_type {
        EventType::Speech | EventType::Summary => true,
        // session bookkeeping carries nothing an agent should react to
        EventType::System => event.system_kind() != Some("session_started"),
        EventType::Intent | EventType::Vote => false,
    }
}

/// Coarse "how long ago" rendering used in prompts.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        0..=9 => "just now".to_string(),
        10..=59 => format!("{secs}s ago"),
        60..=3_599 => format!("{}m ago", secs / 60),
        _ => format!("{}h ago", secs / 3_600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::SessionId;
    use crate::event::{EventMeta, NewEvent, SessionLedger, Speaker, SystemKind};
    use crate::agent::intent::{Intent, IntentKind};
    use chrono::Duration;
    use serde_json::json;

    fn phase() -> PhaseDescriptor {
        PhaseDescriptor::from_config(
            &PhaseConfig::new("discussion", "Open discussion", PhaseType::Discussion, 5),
            0,
        )
    }

    fn ledger() -> SessionLedger {
        let mut ledger = SessionLedger::new(SessionId::new("s1"));
        ledger.append(NewEvent::system(SystemKind::SessionStarted, Speaker::System, json!({})));
        ledger.append(NewEvent::intent(&Intent::new("alice", IntentKind::Speak, 4)));
        ledger.append(NewEvent::vote_end(AgentId::new("bob")));
        ledger.append(NewEvent::speech(AgentId::new("alice"), "We should start small."));
        ledger.append(
            NewEvent::summary(json!({ "text": "Alice favors a pilot." }))
                .with_meta(EventMeta::for_round("discussion", 1)),
        );
        ledger.append(NewEvent::speech(
            AgentId::new("bob"),
            "<thinking>she is wrong</thinking>A pilot is too slow.",
        ));
        ledger
    }

    #[test]
    fn test_only_public_event_types_are_visible() {
        let ledger = ledger();
        let ctx =
            AgentVisibleContext::build("Budget", phase(), ledger.events(), 10, 200, Utc::now());

        let types: Vec<EventType> = ctx.recent_events.iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec![EventType::Speech, EventType::Summary, EventType::Speech]);
        assert_eq!(ctx.recent_events[2].content, "A pilot is too slow.");
        assert_eq!(ctx.phase_summary.as_deref(), Some("Alice favors a pilot."));
        assert!(!ctx.called_on);
    }

    #[test]
    fn test_window_keeps_most_recent() {
        let ledger = ledger();
        let ctx =
            AgentVisibleContext::build("Budget", phase(), ledger.events(), 1, 200, Utc::now());
        assert_eq!(ctx.recent_events.len(), 1);
        assert_eq!(ctx.recent_events[0].speaker, "bob");
    }

    #[test]
    fn test_with_call_marks_only_the_copy() {
        let ctx = AgentVisibleContext::build("Budget", phase(), &[], 10, 200, Utc::now());
        let called = ctx.with_call("has not spoken yet");
        assert!(called.called_on);
        assert_eq!(called.call_reason.as_deref(), Some("has not spoken yet"));
        assert!(!ctx.called_on);
        assert_eq!(ctx.phase.round, 1);
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(relative_time(now, now), "just now");
        assert_eq!(relative_time(now - Duration::seconds(42), now), "42s ago");
        assert_eq!(relative_time(now - Duration::minutes(3), now), "3m ago");
        assert_eq!(relative_time(now - Duration::hours(2), now), "2h ago");
        assert_eq!(relative_time(now + Duration::seconds(5), now), "just now");
    }
}
