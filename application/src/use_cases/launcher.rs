//! Background session launcher
//!
//! Sessions are registered with their input, started as tokio tasks and
//! stopped through their cancellation token. Each session runs on its own
//! task, so appends stay sequential within a session while independent
//! sessions progress concurrently.

use crate::ports::launcher::{DiscussionLauncher, LaunchError};
use crate::ports::progress::{DiscussionProgressNotifier, NoProgress};
use crate::use_cases::run_discussion::{
    DiscussionOutcome, RunDiscussionError, RunDiscussionInput, RunDiscussionUseCase,
};
use agora_domain::SessionId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

type SessionTask = JoinHandle<Result<DiscussionOutcome, RunDiscussionError>>;

struct RunningSession {
    token: CancellationToken,
    /// Cancelled when the session task ends, however it ends.
    done: CancellationToken,
    handle: SessionTask,
}

pub struct SessionLauncher {
    use_case: Arc<RunDiscussionUseCase>,
    progress: Arc<dyn DiscussionProgressNotifier>,
    pending: Mutex<HashMap<SessionId, RunDiscussionInput>>,
    running: Mutex<HashMap<SessionId, RunningSession>>,
}

impl SessionLauncher {
    pub fn new(use_case: Arc<RunDiscussionUseCase>) -> Self {
        Self {
            use_case,
            progress: Arc::new(NoProgress),
            pending: Mutex::new(HashMap::new()),
            running: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn DiscussionProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    /// Register a session so it can be started later.
    pub async fn register(&self, input: RunDiscussionInput) -> Result<SessionId, LaunchError> {
        let session_id = input.session_id.clone();
        if self.running.lock().await.contains_key(&session_id) {
            return Err(LaunchError::AlreadyRunning(session_id));
        }
        let mut pending = self.pending.lock().await;
        if pending.contains_key(&session_id) {
            return Err(LaunchError::AlreadyRegistered(session_id));
        }
        pending.insert(session_id.clone(), input);
        debug!(session_id = %session_id, "Session registered");
        Ok(session_id)
    }

    pub async fn is_running(&self, session_id: &SessionId) -> bool {
        self.running
            .lock()
            .await
            .get(session_id)
            .is_some_and(|s| !s.done.is_cancelled())
    }

    /// Resolve once a started session has finished, leaving its outcome for
    /// [`wait`](Self::wait).
    pub async fn finished(&self, session_id: &SessionId) -> Result<(), LaunchError> {
        let done = self
            .running
            .lock()
            .await
            .get(session_id)
            .map(|s| s.done.clone())
            .ok_or_else(|| LaunchError::NotRunning(session_id.clone()))?;
        done.cancelled().await;
        Ok(())
    }

    /// Wait for a started session to finish and take its outcome.
    pub async fn wait(
        &self,
        session_id: &SessionId,
    ) -> Result<Result<DiscussionOutcome, RunDiscussionError>, LaunchError> {
        let session = self
            .running
            .lock()
            .await
            .remove(session_id)
            .ok_or_else(|| LaunchError::NotRunning(session_id.clone()))?;
        session.handle.await.map_err(|e| LaunchError::Join(e.to_string()))
    }
}

#[async_trait]
impl DiscussionLauncher for SessionLauncher {
    async fn start(&self, session_id: &SessionId) -> Result<(), LaunchError> {
        let mut running = self.running.lock().await;
        if running.contains_key(session_id) {
            return Err(LaunchError::AlreadyRunning(session_id.clone()));
        }
        let input = self
            .pending
            .lock()
            .await
            .remove(session_id)
            .ok_or_else(|| LaunchError::UnknownSession(session_id.clone()))?;

        let token = CancellationToken::new();
        let use_case = Arc::clone(&self.use_case);
        let progress = Arc::clone(&self.progress);
        let task_token = token.clone();
        let done = CancellationToken::new();
        let done_guard = done.clone().drop_guard();
        let handle = tokio::spawn(async move {
            let _done = done_guard;
            use_case.execute_with(input, progress.as_ref(), task_token).await
        });

        info!(session_id = %session_id, "Session started");
        running.insert(session_id.clone(), RunningSession { token, done, handle });
        Ok(())
    }

    async fn stop(&self, session_id: &SessionId) -> Result<(), LaunchError> {
        let running = self.running.lock().await;
        let session = running
            .get(session_id)
            .ok_or_else(|| LaunchError::NotRunning(session_id.clone()))?;
        session.token.cancel();
        info!(session_id = %session_id, "Session stop requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::run_discussion::ParticipantSpec;
    use crate::use_cases::run_discussion::tests::{
        Behavior, RoleplayClient, StuckSpeechClient, TestEventLog,
    };
    use agora_domain::{AgentPersona, EndReason, PhaseConfig, PhaseType, ScenarioConfig};

    fn input(id: &str) -> RunDiscussionInput {
        let scenario = ScenarioConfig {
            phases: vec![PhaseConfig::new("discussion", "Discussion", PhaseType::Discussion, 3)],
            summary_every: 0,
            ..ScenarioConfig::default()
        };
        RunDiscussionInput::new(
            "Four-day week",
            scenario,
            vec![ParticipantSpec::new(AgentPersona::new("ann", "Ann", "manager"))],
        )
        .with_session_id(SessionId::new(id))
    }

    fn launcher(log: Arc<TestEventLog>) -> SessionLauncher {
        let client = RoleplayClient::new(&[("Ann", Behavior::Speaks { urgency: 3 })]);
        SessionLauncher::new(Arc::new(RunDiscussionUseCase::new(Arc::new(client), log)))
    }

    #[tokio::test]
    async fn test_start_runs_registered_session() {
        let log = Arc::new(TestEventLog::default());
        let launcher = launcher(log.clone());
        let id = launcher.register(input("s1")).await.unwrap();

        launcher.start(&id).await.unwrap();
        let outcome = launcher.wait(&id).await.unwrap().unwrap();

        assert_eq!(outcome.end_reason, EndReason::PhasesComplete);
        assert_eq!(log.events(&id).len(), outcome.events_recorded);
    }

    #[tokio::test]
    async fn test_independent_sessions_do_not_share_logs() {
        let log = Arc::new(TestEventLog::default());
        let launcher = launcher(log.clone());
        let a = launcher.register(input("a")).await.unwrap();
        let b = launcher.register(input("b")).await.unwrap();

        launcher.start(&a).await.unwrap();
        launcher.start(&b).await.unwrap();
        launcher.wait(&a).await.unwrap().unwrap();
        launcher.wait(&b).await.unwrap().unwrap();

        assert!(log.events(&a).iter().all(|e| e.session_id == a));
        assert!(log.events(&b).iter().all(|e| e.session_id == b));
    }

    #[tokio::test]
    async fn test_registration_and_lifecycle_errors() {
        let launcher = launcher(Arc::new(TestEventLog::default()));
        let id = launcher.register(input("dup")).await.unwrap();
        assert!(matches!(
            launcher.register(input("dup")).await,
            Err(LaunchError::AlreadyRegistered(_))
        ));
        assert!(matches!(
            launcher.start(&SessionId::new("missing")).await,
            Err(LaunchError::UnknownSession(_))
        ));
        assert!(matches!(launcher.stop(&id).await, Err(LaunchError::NotRunning(_))));
    }

    #[tokio::test]
    async fn test_stop_cancels_session_blocked_in_a_model_call() {
        let log = Arc::new(TestEventLog::default());
        let speech_started = Arc::new(tokio::sync::Notify::new());
        let client = StuckSpeechClient {
            inner: RoleplayClient::new(&[("Ann", Behavior::Speaks { urgency: 3 })]),
            speech_started: Arc::clone(&speech_started),
        };
        let use_case = RunDiscussionUseCase::new(Arc::new(client), log.clone());
        let launcher = SessionLauncher::new(Arc::new(use_case));
        let id = launcher.register(input("stop")).await.unwrap();

        launcher.start(&id).await.unwrap();
        speech_started.notified().await;
        assert!(launcher.is_running(&id).await);

        launcher.stop(&id).await.unwrap();
        launcher.finished(&id).await.unwrap();
        assert!(!launcher.is_running(&id).await);

        let err = launcher.wait(&id).await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert!(log.events(&id).iter().all(|e| e.event_type != agora_domain::EventType::Speech));
    }

    #[tokio::test]
    async fn test_finished_requires_a_started_session() {
        let launcher = launcher(Arc::new(TestEventLog::default()));
        let id = launcher.register(input("idle")).await.unwrap();
        assert!(matches!(launcher.finished(&id).await, Err(LaunchError::NotRunning(_))));

        launcher.start(&id).await.unwrap();
        launcher.finished(&id).await.unwrap();
        assert!(launcher.wait(&id).await.unwrap().is_ok());
    }
}
