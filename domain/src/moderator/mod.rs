//! Turn-taking authority of a discussion.
//!
//! ```text
//!   intents ──┐
//!   state ────┼──▶ ModeratorController::decide ──▶ Decision
//!   events ───┘                                      │
//!                           loop executes, appends ◀─┘
//!                                  │
//!            update_state_after_* ◀┘
//! ```
//!
//! The controller never produces natural language; moderator text comes from
//! the language generator whose inputs and parsers live in [`language`].

pub mod controller;
pub mod decision;
pub mod language;
pub mod state;

pub use controller::{DecisionError, ModeratorController};
pub use decision::{Decision, EndReason};
pub use language::{
    DiscussionOutline, GuidingQuestion, GuidingQuestionInput, PhaseOutline, QuestionType,
    RemarksInput, SummaryInput, SummaryOutput, parse_guiding_question, parse_outline,
    parse_remarks, parse_summary,
};
pub use state::ModeratorState;
