use crate::uci::{parse_uci_message, UciMessage};
use crate::{EngineCommand, EngineEvent};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

/// How long a freshly spawned engine gets to answer `uciok` / `readyok`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// A running UCI engine process.
///
/// Three background tasks service the process: a stdout reader that turns
/// lines into [`EngineEvent`]s, a stdin writer, and a command processor that
/// renders [`EngineCommand`]s as UCI text. The process is killed when the
/// engine is dropped.
pub struct StockfishEngine {
    process: Child,
    command_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

/// Configuration for engine performance tuning.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// Tag used in log output, typically the owning session id
    pub label: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to spawn engine {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Engine has no stdin")]
    NoStdin,
    #[error("Engine has no stdout")]
    NoStdout,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Timeout waiting for engine to respond")]
    HandshakeTimeout,
    #[error("Engine closed")]
    Closed,
}

impl StockfishEngine {
    /// Spawn the engine at `path`, complete the UCI handshake and apply `config`.
    #[tracing::instrument(level = "info", skip(config), fields(label = ?config.label))]
    pub async fn spawn(path: &Path, config: EngineConfig) -> Result<Self, EngineError> {
        tracing::info!("Starting engine spawn (config: {:?})", config);

        let mut process = tokio::process::Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                tracing::error!("Failed to spawn engine: {}", source);
                EngineError::Spawn {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        let mut stdin = process.stdin.take().ok_or(EngineError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(EngineError::NoStdout)?;

        tracing::debug!("Sending 'uci' command");
        stdin.write_all(b"uci\n").await?;
        stdin.flush().await?;

        let (command_tx, mut command_rx) = mpsc::channel::<EngineCommand>(32);
        let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(32);

        // Spawn output reader task
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Engine stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!("UCI << {}", trimmed);

                        let event = match parse_uci_message(trimmed) {
                            Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
                            Ok(UciMessage::BestMove { mv, .. }) => {
                                tracing::debug!("Received bestmove: {:?}", mv);
                                EngineEvent::BestMove(mv)
                            }
                            Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                            Ok(UciMessage::Id { name, value }) => {
                                tracing::debug!("Engine {}: {}", name, value);
                                continue;
                            }
                            Err(e) => {
                                tracing::trace!("Ignoring UCI line: {}", e);
                                continue;
                            }
                        };

                        if event_tx.send(event).await.is_err() {
                            tracing::debug!("Event receiver dropped");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from engine stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Output reader task exiting");
        });

        tracing::debug!("Waiting for uciok from engine");
        wait_for_ready(&mut event_rx).await?;

        if let Some(threads) = config.threads {
            let threads = threads.clamp(1, 16);
            tracing::info!("Setting Threads to {}", threads);
            stdin
                .write_all(format!("setoption name Threads value {}\n", threads).as_bytes())
                .await?;
        }

        if let Some(hash_mb) = config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 2048);
            tracing::info!("Setting Hash to {} MB", hash_mb);
            stdin
                .write_all(format!("setoption name Hash value {}\n", hash_mb).as_bytes())
                .await?;
        }
        stdin.write_all(b"isready\n").await?;
        stdin.flush().await?;
        wait_for_ready(&mut event_rx).await?;

        // Spawn stdin writer task
        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(32);
        tokio::spawn(async move {
            while let Some(cmd) = stdin_rx.recv().await {
                tracing::trace!("UCI >> {}", cmd.trim());

                if let Err(e) = stdin.write_all(cmd.as_bytes()).await {
                    tracing::error!("Failed to write to stdin: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush stdin: {}", e);
                    break;
                }
            }
            tracing::debug!("Stdin writer task exiting");
        });

        // Spawn command processor task
        tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                let quit = matches!(cmd, EngineCommand::Quit);
                if stdin_tx.send(render_command(cmd)).await.is_err() {
                    tracing::error!("Stdin writer gone, dropping engine command");
                    break;
                }
                if quit {
                    break;
                }
            }
            tracing::debug!("Command processor task exiting");
        });

        tracing::info!("Engine spawned and initialized successfully");
        Ok(Self {
            process,
            command_tx,
            event_rx,
        })
    }

    /// Send a command to the engine
    pub async fn send_command(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        tracing::debug!("Queueing command: {:?}", cmd);
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| EngineError::Closed)
    }

    /// Close the command channel as if the writer side had died.
    #[cfg(test)]
    pub(crate) fn close_input(&mut self) {
        let (closed_tx, _) = mpsc::channel(1);
        self.command_tx = closed_tx;
    }

    /// Receive an event from the engine; `None` once the engine has exited.
    pub async fn recv_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }

    /// Shutdown the engine
    pub async fn shutdown(mut self) {
        let _ = self.send_command(EngineCommand::Quit).await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

async fn wait_for_ready(event_rx: &mut mpsc::Receiver<EngineEvent>) -> Result<(), EngineError> {
    let wait = tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
        while let Some(event) = event_rx.recv().await {
            if matches!(event, EngineEvent::Ready) {
                return Ok(());
            }
        }
        Err(EngineError::Closed)
    })
    .await;

    match wait {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Timeout waiting for engine handshake");
            Err(EngineError::HandshakeTimeout)
        }
    }
}

/// Render a command as a UCI line.
fn render_command(cmd: EngineCommand) -> String {
    match cmd {
        EngineCommand::SetPosition { fen } => format!("position fen {}\n", fen),
        EngineCommand::SetOption { name, value } => {
            format!("setoption name {} value {}\n", name, value)
        }
        EngineCommand::Go { depth } => format!("go depth {}\n", depth),
        EngineCommand::IsReady => "isready\n".to_string(),
        EngineCommand::Stop => "stop\n".to_string(),
        EngineCommand::Quit => "quit\n".to_string(),
    }
}
