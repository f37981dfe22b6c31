//! Progress reporting while a discussion runs

use crate::output::console::ConsoleFormatter;
use agora_application::DiscussionProgressNotifier;
use agora_domain::{AgentId, Decision, EndReason, Event, Intent, PhaseConfig, SessionId};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Spinner showing the current phase and round.
///
/// With [`with_transcript`](Self::with_transcript) enabled, every visible
/// event is printed above the spinner as it is recorded.
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
    transcript: bool,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            transcript: false,
        }
    }

    pub fn with_transcript(mut self, transcript: bool) -> Self {
        self.transcript = transcript;
        self
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.spinner.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscussionProgressNotifier for ProgressReporter {
    fn on_session_start(&self, _session_id: &SessionId, topic: &str, roster: &[AgentId]) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix("Opening");
        pb.set_message(format!("{} participants on \"{}\"", roster.len(), topic));
        pb.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut spinner) = self.spinner.lock() {
            *spinner = Some(pb);
        }
    }

    fn on_phase_start(&self, phase: &PhaseConfig) {
        self.with_spinner(|pb| pb.set_prefix(phase.name.clone()));
    }

    fn on_round_start(&self, round: u32) {
        self.with_spinner(|pb| pb.set_message(format!("round {round}: collecting intents")));
    }

    fn on_intents(&self, intents: &[Intent]) {
        let names = intents.iter().map(|i| i.agent_id.as_str()).collect::<Vec<_>>().join(", ");
        self.with_spinner(|pb| {
            if names.is_empty() {
                pb.set_message("nobody asked to speak");
            } else {
                pb.set_message(format!("wants to speak: {names}"));
            }
        });
    }

    fn on_decision(&self, decision: &Decision) {
        self.with_spinner(|pb| pb.set_message(decision.to_string()));
    }

    fn on_event(&self, event: &Event) {
        if !self.transcript {
            return;
        }
        if let Some(line) = ConsoleFormatter::format_event(event) {
            self.with_spinner(|pb| pb.println(&line));
        }
    }

    fn on_step_failed(&self, step: &str, agent_id: Option<&AgentId>, error: &str) {
        let who = agent_id.map(|a| format!(" ({a})")).unwrap_or_default();
        self.with_spinner(|pb| pb.println(format!("{} {step}{who}: {error}", "x".red())));
    }

    fn on_session_end(&self, _session_id: &SessionId, reason: EndReason, rounds: u32) {
        if let Ok(mut spinner) = self.spinner.lock()
            && let Some(pb) = spinner.take()
        {
            pb.finish_with_message(format!("{} ({reason}, {rounds} rounds)", "done".green()));
        }
    }
}

/// Simple text-based progress (no spinner), printing events as they happen
pub struct SimpleProgress;

impl DiscussionProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: &PhaseConfig) {
        println!("{} {}", "->".cyan(), phase.name.bold());
    }

    fn on_event(&self, event: &Event) {
        if let Some(line) = ConsoleFormatter::format_event(event) {
            println!("{line}");
        }
    }

    fn on_step_failed(&self, step: &str, agent_id: Option<&AgentId>, error: &str) {
        let who = agent_id.map(|a| format!(" ({a})")).unwrap_or_default();
        println!("  {} {step}{who}: {error}", "x".red());
    }

    fn on_session_end(&self, _session_id: &SessionId, reason: EndReason, rounds: u32) {
        println!("{} ended: {reason} after {rounds} round(s)", "v".green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::PhaseType;

    #[test]
    fn test_reporter_shows_phase_and_finishes() {
        let reporter = ProgressReporter::new().with_transcript(true);
        reporter.on_session_start(&SessionId::new("s"), "Flat tax?", &[AgentId::new("ann")]);
        reporter.on_phase_start(&PhaseConfig::new("debate", "Debate", PhaseType::Debate, 3));
        reporter.on_round_start(1);
        reporter.on_decision(&Decision::Wait);
        let prefix = reporter.spinner.lock().unwrap().as_ref().map(|pb| pb.prefix());
        assert_eq!(prefix.as_deref(), Some("Debate"));

        reporter.on_session_end(&SessionId::new("s"), EndReason::PhasesComplete, 1);
        assert!(reporter.spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_callbacks_before_start_are_ignored() {
        let reporter = ProgressReporter::default();
        reporter.on_round_start(1);
        reporter.on_step_failed("speech", None, "timeout");
        assert!(reporter.spinner.lock().unwrap().is_none());
    }
}
