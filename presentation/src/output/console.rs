//! Console output formatter for discussion results

use colored::Colorize;
use agora_application::DiscussionOutcome;
use agora_domain::{Event, EventType, OutputFormat, Speaker};
use serde_json::{Value, json};

/// Formats discussion events and outcomes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Force colors on or off for everything this crate prints.
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    /// Render the result of a finished discussion in `format`.
    pub fn render(
        format: OutputFormat,
        topic: &str,
        events: &[Event],
        outcome: &DiscussionOutcome,
    ) -> String {
        match format {
            OutputFormat::Transcript => Self::format_transcript(topic, events, outcome),
            OutputFormat::Summary => Self::format_summary(topic, outcome),
            OutputFormat::Json => Self::format_json(events, outcome),
        }
    }

    /// Every visible event followed by the outcome block.
    pub fn format_transcript(topic: &str, events: &[Event], outcome: &DiscussionOutcome) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(topic));
        output.push('\n');
        for line in events.iter().filter_map(Self::format_event) {
            output.push_str(&line);
            output.push('\n');
        }
        output.push_str(&Self::format_outcome(outcome));
        output
    }

    /// Final summary and outcome only (concise output)
    pub fn format_summary(topic: &str, outcome: &DiscussionOutcome) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n\n", "=== Discussion Summary ===".cyan().bold()));
        output.push_str(&format!("{} {}\n\n", "Topic:".bold(), topic));
        output.push_str(&Self::format_outcome(outcome));
        output
    }

    /// Format as JSON
    pub fn format_json(events: &[Event], outcome: &DiscussionOutcome) -> String {
        let value = json!({ "outcome": outcome, "events": events });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// One transcript line for `event`, or `None` for events that are not
    /// shown (intents and system bookkeeping).
    pub fn format_event(event: &Event) -> Option<String> {
        let text = event.content.as_text();
        match event.event_type {
            EventType::Speech => {
                let speaker = event.speaker.as_str().yellow().bold();
                let tone = event
                    .content
                    .field("tone")
                    .and_then(Value::as_str)
                    .map(|t| format!(" ({t})").dimmed().to_string())
                    .unwrap_or_default();
                let addressed = event
                    .content
                    .field("addressed_to")
                    .and_then(Value::as_str)
                    .map(|a| format!(" @{a}"))
                    .unwrap_or_default();
                Some(format!("{speaker}{tone}{addressed}: {text}"))
            }
            EventType::Summary => {
                let scope = match event.content.field("scope").and_then(Value::as_str) {
                    Some("final") => "Final summary",
                    _ => "Summary",
                };
                Some(format!("\n{} {}\n", format!("[{scope}]").cyan().bold(), text))
            }
            EventType::Vote => {
                Some(format!("{} votes to end", event.speaker).dimmed().to_string())
            }
            EventType::Intent => None,
            EventType::System => Self::format_system(event),
        }
    }

    fn format_system(event: &Event) -> Option<String> {
        let text = || event.content.field("text").and_then(Value::as_str).unwrap_or_default();
        match event.system_kind()? {
            "opening_remarks" | "closing_remarks" => {
                Some(format!("{} {}", "Moderator:".green().bold(), text()))
            }
            "guiding_question" => Some(format!("{} {}", "Moderator asks:".green().bold(), text())),
            "phase_switched" => {
                let name = event.content.field("name").and_then(Value::as_str).unwrap_or_default();
                Some(Self::section_header(&format!("Phase: {name}")))
            }
            "discussion_ended" => {
                let reason = event
                    .content
                    .field("reason")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(format!("-- discussion ended ({reason}) --").dimmed().to_string())
            }
            _ if event.speaker == Speaker::Moderator && !text().is_empty() => {
                Some(format!("{} {}", "Moderator:".green().bold(), text()))
            }
            _ => None,
        }
    }

    /// Outcome block: end reason, rounds, summary, consensus and divergence.
    pub fn format_outcome(outcome: &DiscussionOutcome) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} after {} round(s), {} events (session {})\n",
            "Ended:".cyan().bold(),
            outcome.end_reason,
            outcome.rounds,
            outcome.events_recorded,
            outcome.session_id
        ));

        if let Some(summary) = &outcome.final_summary {
            output.push_str(&format!("\n{}\n{}\n", "Summary:".cyan().bold(), summary));
        }

        if !outcome.consensus.is_empty() {
            output.push_str(&format!("\n{}\n", "Areas of Consensus:".green().bold()));
            for point in &outcome.consensus {
                output.push_str(&format!("  * {}\n", point));
            }
        }

        if !outcome.divergence.is_empty() {
            output.push_str(&format!("\n{}\n", "Disagreements:".yellow().bold()));
            for point in &outcome.divergence {
                output.push_str(&format!("  * {}\n", point));
            }
        }

        if !outcome.failed_steps.is_empty() {
            output.push_str(&format!("\n{}\n", "Failed steps:".red().bold()));
            for failed in &outcome.failed_steps {
                let agent = failed.agent_id.as_ref().map(|a| format!(" {a}")).unwrap_or_default();
                output.push_str(&format!(
                    "  * round {} {}{}: {}\n",
                    failed.round, failed.step, agent, failed.error
                ));
            }
        }

        output
    }

    fn header(topic: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}\n", line.cyan(), topic.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}", title.cyan().bold(), "-".repeat(40))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_application::FailedStep;
    use agora_domain::{
        AgentId, EndReason, EventContent, EventMeta, NewEvent, SessionId, SessionLedger, SystemKind,
    };

    fn ledger() -> SessionLedger {
        let mut ledger = SessionLedger::new(SessionId::new("s"));
        ledger.append(NewEvent::system(
            SystemKind::OpeningRemarks,
            Speaker::Moderator,
            json!({ "text": "Welcome everyone." }),
        ));
        ledger.append(
            NewEvent::new(
                EventType::Speech,
                Speaker::Agent(AgentId::new("ann")),
                EventContent::Structured(json!({
                    "text": "Taxes are too high.",
                    "tone": "assertive"
                })),
            )
            .with_meta(EventMeta::for_round("opening", 1)),
        );
        ledger.append(NewEvent::system(
            SystemKind::DiscussionEnded,
            Speaker::System,
            json!({ "reason": "phases_complete", "rounds": 1 }),
        ));
        ledger
    }

    fn outcome() -> DiscussionOutcome {
        DiscussionOutcome {
            session_id: SessionId::new("s"),
            rounds: 1,
            end_reason: EndReason::PhasesComplete,
            events_recorded: 3,
            final_summary: Some("Ann wants lower taxes.".into()),
            consensus: vec!["schools matter".into()],
            divergence: Vec::new(),
            failed_steps: vec![FailedStep {
                round: 1,
                step: "speech".into(),
                agent_id: Some(AgentId::new("ben")),
                error: "timeout".into(),
            }],
        }
    }

    #[test]
    fn test_transcript_lists_speeches_and_outcome() {
        let ledger = ledger();
        let text = ConsoleFormatter::format_transcript("Flat tax?", ledger.events(), &outcome());
        assert!(text.contains("Welcome everyone."));
        assert!(text.contains("Taxes are too high."));
        assert!(text.contains("assertive"));
        assert!(text.contains("phases_complete"));
        assert!(text.contains("schools matter"));
        assert!(text.contains("timeout"));
    }

    #[test]
    fn test_intents_are_hidden() {
        let mut ledger = SessionLedger::new(SessionId::new("s"));
        let intent = agora_domain::Intent::new("ann", agora_domain::IntentKind::Speak, 3);
        let event = ledger.append(NewEvent::intent(&intent));
        assert!(ConsoleFormatter::format_event(&event).is_none());
    }

    #[test]
    fn test_json_contains_outcome_and_events() {
        let ledger = ledger();
        let text =
            ConsoleFormatter::render(OutputFormat::Json, "Flat tax?", ledger.events(), &outcome());
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["outcome"]["end_reason"], "phases_complete");
        assert_eq!(value["events"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_summary_skips_events() {
        let text = ConsoleFormatter::render(OutputFormat::Summary, "Flat tax?", &[], &outcome());
        assert!(text.contains("Ann wants lower taxes."));
        assert!(!text.contains("Welcome everyone."));
    }
}
