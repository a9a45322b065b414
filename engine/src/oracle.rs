//! Best-move oracle seam.
//!
//! A [`MoveOracle`] answers "what would you play here?" for a FEN position.
//! Each session owns its own oracle, created through an [`OracleLauncher`].

use crate::stockfish::{EngineConfig, StockfishEngine};
use crate::{EngineCommand, EngineEvent, EngineInfo};
use async_trait::async_trait;
use cozy_chess::Move;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// How long a stopped search may take to report its `bestmove`.
const STOP_GRACE: Duration = Duration::from_secs(1);

/// How long the engine gets to acknowledge new options.
const CONFIGURE_TIMEOUT: Duration = Duration::from_secs(2);

/// Lowest `UCI_Elo` current Stockfish accepts; lower values are ignored.
pub const STOCKFISH_MIN_ELO: u32 = 1320;

/// Search strength applied to every query until reconfigured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    pub depth: u8,
    /// `None` plays at full strength
    pub target_elo: Option<u32>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            depth: 15,
            target_elo: None,
        }
    }
}

impl SearchParams {
    /// Whether the target Elo is below what Stockfish can emulate.
    pub fn below_engine_floor(&self) -> bool {
        self.target_elo.is_some_and(|elo| elo < STOCKFISH_MIN_ELO)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("Move oracle unavailable")]
    Unavailable,
    #[error("Move oracle unreachable: {0}")]
    Unreachable(String),
    #[error("Move oracle timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Move oracle found no move")]
    NoMove,
    #[error("Move oracle suggested an illegal move: {0}")]
    IllegalSuggestion(String),
}

#[async_trait]
pub trait MoveOracle: Send {
    /// Apply search parameters to all following queries.
    async fn configure(&mut self, params: SearchParams) -> Result<(), OracleError>;

    /// Ask for the best move in `fen`, giving up after `timeout`.
    async fn best_move(&mut self, fen: &str, timeout: Duration) -> Result<Move, OracleError>;

    /// Release the underlying engine. Later queries fail with `Unreachable`.
    async fn shutdown(&mut self);
}

#[async_trait]
pub trait OracleLauncher: Send + Sync {
    /// Start a fresh oracle; `label` tags its log output.
    async fn launch(&self, label: &str) -> Result<Box<dyn MoveOracle>, OracleError>;
}

/// Oracle backed by a UCI engine process.
pub struct StockfishOracle {
    engine: Option<StockfishEngine>,
    params: SearchParams,
    label: String,
}

impl StockfishOracle {
    pub fn new(engine: StockfishEngine, label: impl Into<String>) -> Self {
        Self {
            engine: Some(engine),
            params: SearchParams::default(),
            label: label.into(),
        }
    }

    fn engine(&mut self) -> Result<&mut StockfishEngine, OracleError> {
        self.engine
            .as_mut()
            .ok_or_else(|| OracleError::Unreachable("engine was shut down".to_string()))
    }

    /// Send a command, dropping the engine if it can no longer take input.
    async fn send(&mut self, cmd: EngineCommand) -> Result<(), OracleError> {
        let result = self.engine()?.send_command(cmd).await;
        if let Err(e) = result {
            tracing::warn!(label = %self.label, "Engine stopped accepting commands: {}", e);
            self.engine = None;
            return Err(closed(e));
        }
        Ok(())
    }

    async fn discard_engine(&mut self) {
        if let Some(engine) = self.engine.take() {
            tracing::warn!(label = %self.label, "Shutting down unresponsive engine");
            engine.shutdown().await;
        }
    }

    /// Stop a search that overran its deadline. The engine is kept only if it
    /// answers the stop in time.
    async fn abandon_search(&mut self) {
        let recovered = match self.engine.as_mut() {
            Some(engine) => {
                let _ = engine.send_command(EngineCommand::Stop).await;
                matches!(
                    tokio::time::timeout(STOP_GRACE, await_best_move(engine)).await,
                    Ok(Ok(_)) | Ok(Err(OracleError::NoMove))
                )
            }
            None => false,
        };
        if !recovered {
            self.discard_engine().await;
        }
    }
}

#[async_trait]
impl MoveOracle for StockfishOracle {
    async fn configure(&mut self, params: SearchParams) -> Result<(), OracleError> {
        tracing::debug!(label = %self.label, ?params, "Configuring oracle");
        if params.below_engine_floor() {
            tracing::warn!(
                label = %self.label,
                elo = ?params.target_elo,
                "Target Elo below the engine minimum of {}, engine keeps its previous strength",
                STOCKFISH_MIN_ELO
            );
        }
        self.params = params;

        self.send(EngineCommand::SetOption {
            name: "UCI_LimitStrength".to_string(),
            value: params.target_elo.is_some().to_string(),
        })
        .await?;
        if let Some(elo) = params.target_elo {
            self.send(EngineCommand::SetOption {
                name: "UCI_Elo".to_string(),
                value: elo.to_string(),
            })
            .await?;
        }
        self.send(EngineCommand::IsReady).await?;

        let engine = self.engine()?;
        match tokio::time::timeout(CONFIGURE_TIMEOUT, await_ready(engine)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.engine = None;
                Err(e)
            }
            Err(_) => {
                self.discard_engine().await;
                Err(OracleError::TimedOut(CONFIGURE_TIMEOUT))
            }
        }
    }

    async fn best_move(&mut self, fen: &str, timeout: Duration) -> Result<Move, OracleError> {
        tracing::debug!(label = %self.label, fen, "Querying engine");
        let deadline = Instant::now() + timeout;
        let depth = self.params.depth;

        // Make sure nothing from an earlier search is still in flight
        self.send(EngineCommand::IsReady).await?;
        let engine = self.engine()?;
        match tokio::time::timeout_at(deadline, await_ready(engine)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.engine = None;
                return Err(e);
            }
            Err(_) => {
                self.discard_engine().await;
                return Err(OracleError::TimedOut(timeout));
            }
        }

        self.send(EngineCommand::SetPosition {
            fen: fen.to_string(),
        })
        .await?;
        self.send(EngineCommand::Go { depth }).await?;

        let engine = self.engine()?;
        match tokio::time::timeout_at(deadline, await_best_move(engine)).await {
            Ok(Ok(mv)) => Ok(mv),
            Ok(Err(OracleError::Unreachable(reason))) => {
                self.engine = None;
                Err(OracleError::Unreachable(reason))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(label = %self.label, "Search exceeded {:?}, stopping engine", timeout);
                self.abandon_search().await;
                Err(OracleError::TimedOut(timeout))
            }
        }
    }

    async fn shutdown(&mut self) {
        if let Some(engine) = self.engine.take() {
            tracing::debug!(label = %self.label, "Shutting down engine");
            engine.shutdown().await;
        }
    }
}

fn closed(e: crate::EngineError) -> OracleError {
    OracleError::Unreachable(e.to_string())
}

fn engine_exited() -> OracleError {
    OracleError::Unreachable("engine exited".to_string())
}

/// Wait for `readyok`, dropping any stale search output on the way.
async fn await_ready(engine: &mut StockfishEngine) -> Result<(), OracleError> {
    loop {
        match engine.recv_event().await {
            Some(EngineEvent::Ready) => return Ok(()),
            Some(EngineEvent::BestMove(mv)) => {
                tracing::debug!("Discarding stale bestmove {:?}", mv);
            }
            Some(EngineEvent::Info(_)) => {}
            None => return Err(engine_exited()),
        }
    }
}

async fn await_best_move(engine: &mut StockfishEngine) -> Result<Move, OracleError> {
    let mut last_info: Option<EngineInfo> = None;
    loop {
        match engine.recv_event().await {
            Some(EngineEvent::Info(info)) => {
                if info.depth.is_some() {
                    last_info = Some(info);
                }
            }
            Some(EngineEvent::BestMove(mv)) => {
                if let Some(info) = &last_info {
                    tracing::debug!(
                        depth = ?info.depth,
                        score = ?info.score,
                        nodes = ?info.nodes,
                        "Search finished"
                    );
                }
                return mv.ok_or(OracleError::NoMove);
            }
            Some(EngineEvent::Ready) => {}
            None => return Err(engine_exited()),
        }
    }
}

/// Spawns one [`StockfishOracle`] per launch.
#[derive(Debug, Clone, Default)]
pub struct StockfishLauncher {
    path: Option<PathBuf>,
    config: EngineConfig,
}

impl StockfishLauncher {
    pub fn new(path: PathBuf, config: EngineConfig) -> Self {
        Self {
            path: Some(path),
            config,
        }
    }

    /// A launcher for when no engine binary could be found.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[async_trait]
impl OracleLauncher for StockfishLauncher {
    async fn launch(&self, label: &str) -> Result<Box<dyn MoveOracle>, OracleError> {
        let path = self.path.as_deref().ok_or(OracleError::Unavailable)?;
        let config = EngineConfig {
            label: Some(label.to_string()),
            ..self.config.clone()
        };

        let engine = StockfishEngine::spawn(path, config).await.map_err(|e| {
            tracing::warn!(label, "Engine failed to start: {}", e);
            OracleError::Unreachable(e.to_string())
        })?;
        Ok(Box::new(StockfishOracle::new(engine, label)))
    }
}

/// Resolve an engine command to an executable path.
///
/// A command containing a path separator must name an existing file; a bare
/// name is looked up on `PATH`.
pub fn locate_engine(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(command))
        .find(|path| path.is_file())
}
