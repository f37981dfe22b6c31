//! Launcher port
//!
//! Starts and stops registered discussion sessions in the background.

use agora_domain::SessionId;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Session already registered: {0}")]
    AlreadyRegistered(SessionId),

    #[error("Session already running: {0}")]
    AlreadyRunning(SessionId),

    #[error("Session not running: {0}")]
    NotRunning(SessionId),

    #[error("Discussion task failed: {0}")]
    Join(String),
}

#[async_trait]
pub trait DiscussionLauncher: Send + Sync {
    /// Begin running a registered session.
    async fn start(&self, session_id: &SessionId) -> Result<(), LaunchError>;

    /// Request cancellation of a running session.
    async fn stop(&self, session_id: &SessionId) -> Result<(), LaunchError>;
}
