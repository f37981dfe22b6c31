//! Prompt templates for discussion participants.
//!
//! Inputs are limited to the agent's persona, its own memory and the
//! [`AgentVisibleContext`]; nothing else can reach an agent prompt.

use crate::agent::memory::MemoryEntry;
use crate::agent::persona::AgentPersona;
use crate::context::visible::AgentVisibleContext;
use crate::session::ChatMessage;

/// Number of memory entries rendered into a prompt.
pub const MEMORY_IN_PROMPT: usize = 8;

pub struct AgentPromptTemplate;

impl AgentPromptTemplate {
    /// System prompt describing who the agent is.
    pub fn system(persona: &AgentPersona, goal: &str) -> String {
        let mut prompt = format!(
            "You are {name}, taking part in a moderated group discussion as {role}.\n",
            name = persona.name,
            role = persona.role
        );
        if !persona.description.is_empty() {
            prompt.push_str(&format!("\n{}\n", persona.description));
        }
        if let Some(stance) = &persona.stance {
            prompt.push_str(&format!("\nYour stance: {stance}\n"));
        }
        if !persona.expertise.is_empty() {
            prompt.push_str(&format!("Expertise: {}\n", persona.expertise.join(", ")));
        }
        if !persona.traits.is_empty() {
            prompt.push_str(&format!("Traits: {}\n", persona.traits.join(", ")));
        }
        prompt.push_str(&format!("\nSpeaking style: {}.\n", persona.style.guidance()));
        if !goal.is_empty() {
            prompt.push_str(&format!("Your goal: {goal}\n"));
        }
        prompt.push_str(
            "\nStay in character. Only the moderator decides who speaks; \
             never speak for other participants.",
        );
        prompt
    }

    /// Ask for a JSON intent.
    pub fn intent(
        persona: &AgentPersona,
        goal: &str,
        visible: &AgentVisibleContext,
        memory: &[MemoryEntry],
    ) -> Vec<ChatMessage> {
        let body = format!(
            r#"{context}
## Your Turn

Decide whether you want to speak in the next round.

Respond with a single JSON object:
```json
{{
  "intent": "speak | interrupt | question | respond | pass",
  "urgency": 1,
  "target": "participant id or null",
  "topic": "what you would talk about, or null",
  "reasoning": "private, never shown to others",
  "vote_end": false
}}
```
`urgency` ranges from 1 (could wait) to 5 (must speak now).
Set `vote_end` to true only if you believe the discussion has run its course."#,
            context = Self::render_context(persona, visible, memory),
        );
        vec![ChatMessage::system(Self::system(persona, goal)), ChatMessage::user(body)]
    }

    /// Ask for a JSON speech once the moderator gave the floor.
    pub fn speech(
        persona: &AgentPersona,
        goal: &str,
        visible: &AgentVisibleContext,
        memory: &[MemoryEntry],
        intended_topic: Option<&str>,
        max_chars: usize,
    ) -> Vec<ChatMessage> {
        let floor = match (&visible.call_reason, intended_topic) {
            (Some(reason), _) if visible.called_on => {
                format!("The moderator has called on you ({reason}). You have the floor.")
            }
            (_, Some(topic)) => format!("You have the floor. You wanted to talk about: {topic}"),
            _ => "You have the floor.".to_string(),
        };
        let body = format!(
            r#"{context}
## Your Turn

{floor}

Respond with a single JSON object:
```json
{{
  "content": "what you say out loud, at most {max_chars} characters",
  "tone": "calm | assertive | passionate | skeptical | conciliatory | humorous",
  "addressed_to": "participant id or null",
  "inner_thought": "private, never shown to others"
}}
```"#,
            context = Self::render_context(persona, visible, memory),
        );
        vec![ChatMessage::system(Self::system(persona, goal)), ChatMessage::user(body)]
    }

    fn render_context(
        persona: &AgentPersona,
        visible: &AgentVisibleContext,
        memory: &[MemoryEntry],
    ) -> String {
        let phase = &visible.phase;
        let mut out = format!(
            "## Discussion\n\nTopic: {topic}\nPhase: {name} ({kind}), round {round} of {max}\n",
            topic = visible.topic,
            name = phase.name,
            kind = phase.phase_type,
            round = phase.round,
            max = phase.max_rounds,
        );
        if !phase.description.is_empty() {
            out.push_str(&format!("{}\n", phase.description));
        }

        let others: Vec<String> = visible
            .others(&persona.id)
            .map(|p| format!("- {} ({}): {}", p.id, p.name, p.role))
            .collect();
        if !others.is_empty() {
            out.push_str(&format!("\n## Participants\n\n{}\n", others.join("\n")));
        }

        if let Some(summary) = &visible.phase_summary {
            out.push_str(&format!("\n## Summary So Far\n\n{summary}\n"));
        }

        out.push_str("\n## Recent Conversation\n\n");
        if visible.recent_events.is_empty() {
            out.push_str("(nothing has been said yet)\n");
        }
        for event in &visible.recent_events {
            out.push_str(&format!(
                "[{}] {}: {}\n",
                event.relative_time, event.speaker, event.content
            ));
        }

        if !memory.is_empty() {
            out.push_str("\n## Your Notes\n\n");
            for entry in memory {
                out.push_str(&format!("- ({}) {}\n", entry.category.as_str(), entry.content));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::memory::MemoryCategory;
    use crate::context::visible::{ParticipantInfo, PhaseDescriptor};
    use crate::scenario::{PhaseConfig, PhaseType};
    use chrono::Utc;

    fn visible() -> AgentVisibleContext {
        let config = PhaseConfig::new("d", "Debate", PhaseType::Debate, 3);
        let phase = PhaseDescriptor::from_config(&config, 1);
        AgentVisibleContext::build("Remote work", phase, &[], 10, 200, Utc::now())
            .with_participants(vec![
                ParticipantInfo {
                    id: "alice".into(),
                    name: "Alice".into(),
                    role: "manager".into(),
                },
                ParticipantInfo {
                    id: "bob".into(),
                    name: "Bob".into(),
                    role: "engineer".into(),
                },
            ])
    }

    #[test]
    fn test_intent_prompt_contents() {
        let persona = AgentPersona::new("alice", "Alice", "manager").with_stance("pro office");
        let memory = vec![MemoryEntry::new("I chose to speak", 0.3, MemoryCategory::Action)];
        let messages =
            AgentPromptTemplate::intent(&persona, "win the argument", &visible(), &memory);

        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("pro office"));
        assert!(messages[0].content.contains("win the argument"));
        let user = &messages[1].content;
        assert!(user.contains("round 2 of 3"));
        assert!(user.contains("- bob (Bob): engineer"));
        assert!(!user.contains("- alice (Alice)"));
        assert!(user.contains("I chose to speak"));
        assert!(user.contains("\"vote_end\""));
    }

    #[test]
    fn test_speech_prompt_mentions_call_reason() {
        let persona = AgentPersona::new("bob", "Bob", "engineer");
        let called = visible().with_call("opening statement");
        let messages = AgentPromptTemplate::speech(&persona, "", &called, &[], None, 280);
        assert!(messages[1].content.contains("called on you (opening statement)"));
        assert!(messages[1].content.contains("at most 280 characters"));

        let own =
            AgentPromptTemplate::speech(&persona, "", &visible(), &[], Some("commute costs"), 280);
        assert!(own[1].content.contains("commute costs"));
    }
}
