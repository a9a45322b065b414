pub mod oracle;
pub mod stockfish;
pub mod uci;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use oracle::{
    locate_engine, MoveOracle, OracleError, OracleLauncher, SearchParams, StockfishLauncher,
    StockfishOracle, STOCKFISH_MIN_ELO,
};
pub use stockfish::{EngineConfig, EngineError, StockfishEngine};
pub use uci::{UciError, UciMessage};

use cozy_chess::Move;

/// Commands sent to the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    SetPosition { fen: String },
    SetOption { name: String, value: String },
    /// Search to a fixed depth
    Go { depth: u8 },
    IsReady,
    Stop,
    Quit,
}

/// Events received from the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// `uciok` or `readyok`
    Ready,
    /// `bestmove`; `None` when the engine reports no legal move
    BestMove(Option<Move>),
    Info(EngineInfo),
}

/// Engine analysis information
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i8), // Negative for being mated
}
