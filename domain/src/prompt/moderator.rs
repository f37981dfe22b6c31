//! Prompt templates for the moderator language generator.

use crate::context::redaction::CondensedEvent;
use crate::moderator::language::{GuidingQuestionInput, RemarksInput, SummaryInput};
use crate::scenario::PhaseConfig;
use crate::session::ChatMessage;

pub struct ModeratorPromptTemplate;

impl ModeratorPromptTemplate {
    pub fn system() -> &'static str {
        r#"You are the moderator of a structured group discussion.
You are neutral: you never take sides and never argue a position yourself.
Keep the discussion focused, fair and moving forward.
When asked for JSON, respond with a single JSON object and nothing else."#
    }

    pub fn outline(topic: &str, phases: &[PhaseConfig]) -> Vec<ChatMessage> {
        let phase_list = phases
            .iter()
            .map(|p| format!("- {} ({}, {}): {}", p.id, p.name, p.phase_type, p.description))
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!(
            r#"Prepare an outline for a discussion on:

{topic}

Phases:
{phase_list}

Respond with:
```json
{{ "phases": [ {{ "phase_id": "...", "key_points": ["..."], "suggested_questions": ["..."] }} ] }}
```"#
        );
        Self::messages(body)
    }

    pub fn guiding_question(input: &GuidingQuestionInput) -> Vec<ChatMessage> {
        let quiet = if input.quiet_agents.is_empty() {
            "none".to_string()
        } else {
            input.quiet_agents.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(", ")
        };
        let body = format!(
            r#"Topic: {topic}
Phase: {phase} ({kind}), round {round} of {max}

The discussion has stalled. Recent conversation:
{events}
Quiet participants: {quiet}

Ask one short question that gets the discussion going again. Preferred type: {preferred}.

Respond with:
```json
{{ "question": "...", "type": "open | directed | clarification | challenge", "target": "participant id or null" }}
```"#,
            topic = input.topic,
            phase = input.phase.name,
            kind = input.phase.phase_type,
            round = input.phase.round,
            max = input.phase.max_rounds,
            events = render_events(&input.recent_events),
            preferred = input.preferred_type.as_str(),
        );
        Self::messages(body)
    }

    pub fn summary(input: &SummaryInput) -> Vec<ChatMessage> {
        let scope = if input.is_final {
            "the whole discussion".to_string()
        } else {
            format!("the {} phase so far", input.phase_name)
        };
        let body = format!(
            r#"Topic: {topic}

Summarize {scope}. Events:
{events}
Known points of consensus: {consensus}
Known points of divergence: {divergence}

Respond with:
```json
{{ "summary": "...", "highlights": ["..."], "consensus": ["..."], "divergence": ["..."] }}
```"#,
            topic = input.topic,
            events = render_events(&input.events),
            consensus = render_list(&input.consensus),
            divergence = render_list(&input.divergence),
        );
        Self::messages(body)
    }

    pub fn opening_remarks(input: &RemarksInput) -> Vec<ChatMessage> {
        let participants = input
            .participants
            .iter()
            .map(|p| format!("- {} ({})", p.name, p.role))
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!(
            r#"Open a discussion on: {topic}

Participants:
{participants}

Planned phases: {phases}

Welcome the participants and frame the topic in a few sentences.
Respond with:
```json
{{ "remarks": "..." }}
```"#,
            topic = input.topic,
            phases = input.phase_names.join(" → "),
        );
        Self::messages(body)
    }

    pub fn closing_remarks(input: &RemarksInput) -> Vec<ChatMessage> {
        let summary = input.summary.as_deref().unwrap_or("(no summary available)");
        let body = format!(
            r#"Close the discussion on: {topic}

Final summary:
{summary}

Thank the participants and restate the main outcome in a few sentences.
Respond with:
```json
{{ "remarks": "..." }}
```"#,
            topic = input.topic,
        );
        Self::messages(body)
    }

    fn messages(body: String) -> Vec<ChatMessage> {
        vec![ChatMessage::system(Self::system()), ChatMessage::user(body)]
    }
}

fn render_events(events: &[CondensedEvent]) -> String {
    if events.is_empty() {
        return "(none)\n".to_string();
    }
    events
        .iter()
        .map(|e| format!("#{} {}: {}\n", e.sequence, e.speaker, e.text))
        .collect()
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use crate::scenario::PhaseType;

    #[test]
    fn test_summary_prompt_renders_condensed_events() {
        let input = SummaryInput {
            topic: "Transit fares".into(),
            phase_name: "Discussion".into(),
            events: vec![CondensedEvent {
                sequence: 7,
                speaker: "alice".into(),
                event_type: EventType::Speech,
                text: "Make buses free.".into(),
            }],
            consensus: Vec::new(),
            divergence: vec!["funding".into()],
            is_final: false,
        };
        let messages = ModeratorPromptTemplate::summary(&input);
        assert_eq!(messages[0].content, ModeratorPromptTemplate::system());
        assert!(messages[1].content.contains("#7 alice: Make buses free."));
        assert!(messages[1].content.contains("the Discussion phase so far"));
        assert!(messages[1].content.contains("divergence: funding"));
    }

    #[test]
    fn test_outline_lists_phases() {
        let phases = vec![PhaseConfig::new("opening", "Opening", PhaseType::Opening, 2)];
        let messages = ModeratorPromptTemplate::outline("Transit fares", &phases);
        assert!(messages[1].content.contains("- opening (Opening, opening)"));
    }
}
