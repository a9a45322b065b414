pub mod actor;
pub mod commands;
pub mod difficulty;
pub mod handle;
pub mod snapshot;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use engine::OracleLauncher;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use actor::run_session_actor;
pub use commands::{DifficultyChange, MoveOutcome, SessionError};
pub use difficulty::Difficulty;
pub use handle::SessionHandle;
pub use snapshot::SessionSnapshot;
use state::SessionState;

/// A freshly created session.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub session_id: String,
    pub snapshot: SessionSnapshot,
    pub oracle_available: bool,
}

/// Holds every session for the lifetime of the process. Spawns an actor task
/// per session. Sessions are never removed.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    launcher: Arc<dyn OracleLauncher>,
    oracle_timeout: Duration,
}

impl SessionStore {
    pub fn new(launcher: Arc<dyn OracleLauncher>, oracle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            launcher,
            oracle_timeout,
        }
    }

    /// Start a new game. A missing oracle does not prevent creation.
    pub async fn create(&self) -> CreatedSession {
        let session_id = Uuid::new_v4().to_string();

        let oracle = match self.launcher.launch(&session_id).await {
            Ok(mut oracle) => {
                let params = Difficulty::default().search_params();
                if let Err(e) = oracle.configure(params).await {
                    tracing::warn!(session = %session_id, "Oracle configuration failed: {}", e);
                }
                Some(oracle)
            }
            Err(e) => {
                tracing::warn!(session = %session_id, "Oracle unavailable: {}", e);
                None
            }
        };
        let oracle_available = oracle.is_some();

        let state = SessionState::new(session_id.clone(), oracle, self.oracle_timeout);
        let snapshot = state.snapshot();

        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        tokio::spawn(run_session_actor(state, cmd_rx));

        let handle = SessionHandle::new(session_id.clone(), cmd_tx);
        let count = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), handle);
            sessions.len()
        };
        tracing::info!(session = %session_id, oracle_available, sessions = count, "Session created");

        CreatedSession {
            session_id,
            snapshot,
            oracle_available,
        }
    }

    pub async fn get(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
