//! Scripted oracle for testing

use crate::oracle::{MoveOracle, OracleError, OracleLauncher, SearchParams};
use async_trait::async_trait;
use chess::parse_uci_move;
use cozy_chess::Move;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Reply = Result<String, OracleError>;

/// Launcher whose oracles answer from a shared queue of canned replies.
///
/// Clones share the queue and the call log, so a test can keep one clone
/// and inspect what the code under test did with the other.
#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    call_log: Arc<Mutex<Vec<OracleCall>>>,
    launch_error: Option<OracleError>,
    configure_error: Option<OracleError>,
    delay: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleCall {
    Launch { label: String },
    Configure(SearchParams),
    BestMove { fen: String },
    Shutdown,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue move tokens to be suggested in order
    pub fn with_moves<I, S>(self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies
            .lock()
            .unwrap()
            .extend(tokens.into_iter().map(|t| Ok(t.into())));
        self
    }

    /// Queue a failure as the next reply
    pub fn with_failure(self, error: OracleError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Every launch fails with `error`
    pub fn failing(error: OracleError) -> Self {
        Self {
            launch_error: Some(error),
            ..Self::default()
        }
    }

    /// Every `configure` after launch fails with `error`
    pub fn with_configure_error(mut self, error: OracleError) -> Self {
        self.configure_error = Some(error);
        self
    }

    /// Each query takes `delay`; queries with a shorter timeout time out
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<OracleCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Configure calls seen so far, in order
    pub fn configured(&self) -> Vec<SearchParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                OracleCall::Configure(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    pub fn queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, OracleCall::BestMove { .. }))
            .count()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl OracleLauncher for ScriptedLauncher {
    async fn launch(&self, label: &str) -> Result<Box<dyn MoveOracle>, OracleError> {
        self.call_log.lock().unwrap().push(OracleCall::Launch {
            label: label.to_string(),
        });
        if let Some(error) = &self.launch_error {
            return Err(error.clone());
        }
        Ok(Box::new(ScriptedOracle {
            launcher: self.clone(),
            shut_down: false,
        }))
    }
}

pub struct ScriptedOracle {
    launcher: ScriptedLauncher,
    shut_down: bool,
}

impl ScriptedOracle {
    fn log(&self, call: OracleCall) {
        self.launcher.call_log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MoveOracle for ScriptedOracle {
    async fn configure(&mut self, params: SearchParams) -> Result<(), OracleError> {
        self.log(OracleCall::Configure(params));
        match &self.launcher.configure_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn best_move(&mut self, fen: &str, timeout: Duration) -> Result<Move, OracleError> {
        self.log(OracleCall::BestMove {
            fen: fen.to_string(),
        });
        if self.shut_down {
            return Err(OracleError::Unreachable("engine was shut down".to_string()));
        }

        if let Some(delay) = self.launcher.delay {
            if delay >= timeout {
                tokio::time::sleep(timeout).await;
                return Err(OracleError::TimedOut(timeout));
            }
            tokio::time::sleep(delay).await;
        }

        let reply = self.launcher.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(token)) => {
                parse_uci_move(&token).map_err(|_| OracleError::IllegalSuggestion(token))
            }
            Some(Err(error)) => Err(error),
            None => Err(OracleError::NoMove),
        }
    }

    async fn shutdown(&mut self) {
        self.log(OracleCall::Shutdown);
        self.shut_down = true;
    }
}
