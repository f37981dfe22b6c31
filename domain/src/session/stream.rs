//! Streaming events for LLM completions.

use super::entities::Completion;

/// An event in a streaming completion.
///
/// `Completed` carries the full response and ends the stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Delta(String),
    Completed(Completion),
    Error(String),
}

impl StreamEvent {
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            StreamEvent::Completed(c) => Some(&c.content),
            StreamEvent::Error(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}
