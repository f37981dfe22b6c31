//! Progress notification port
//!
//! Defines the interface for reporting progress while a discussion runs.

use agora_domain::{AgentId, Decision, EndReason, Event, Intent, PhaseConfig, SessionId};

/// Callback for progress updates during a discussion.
///
/// Implementations live in the presentation layer. Every method has a no-op
/// default so adapters implement only what they display.
pub trait DiscussionProgressNotifier: Send + Sync {
    fn on_session_start(&self, _session_id: &SessionId, _topic: &str, _roster: &[AgentId]) {}

    fn on_phase_start(&self, _phase: &PhaseConfig) {}

    fn on_round_start(&self, _round: u32) {}

    /// Non-pass intents of the round, in submission order.
    fn on_intents(&self, _intents: &[Intent]) {}

    fn on_decision(&self, _decision: &Decision) {}

    fn on_event(&self, _event: &Event) {}

    fn on_step_failed(&self, _step: &str, _agent_id: Option<&AgentId>, _error: &str) {}

    fn on_session_end(&self, _session_id: &SessionId, _reason: EndReason, _rounds: u32) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DiscussionProgressNotifier for NoProgress {}
