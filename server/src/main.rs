use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chessweb_server::{api, Config, SessionStore};
use clap::Parser;
use engine::{locate_engine, EngineConfig, OracleLauncher, StockfishLauncher};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Play chess against a UCI engine over a JSON API.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Address to listen on [env: CHESSWEB_ADDR]
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Engine command or path [env: CHESSWEB_ENGINE]
    #[arg(long)]
    engine: Option<String>,

    /// Time limit per engine query in milliseconds [env: CHESSWEB_ORACLE_TIMEOUT_MS]
    #[arg(long)]
    oracle_timeout_ms: Option<u64>,

    /// Directory for daily rolling log files [env: CHESSWEB_LOG_DIR]
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(addr) = self.addr {
            config.addr = addr;
        }
        if let Some(engine) = self.engine {
            config.engine = engine;
        }
        if let Some(ms) = self.oracle_timeout_ms {
            config.oracle_timeout = std::time::Duration::from_millis(ms);
        }
        if let Some(dir) = self.log_dir {
            config.log_dir = Some(dir);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().apply(Config::from_env());
    let _guard = init_tracing(&config)?;

    tracing::info!("Starting chessweb server");

    let launcher: Arc<dyn OracleLauncher> = match locate_engine(&config.engine) {
        Some(path) => {
            tracing::info!("Using engine at {}", path.display());
            Arc::new(StockfishLauncher::new(
                path,
                EngineConfig {
                    threads: config.engine_threads,
                    hash_mb: config.engine_hash_mb,
                    label: None,
                },
            ))
        }
        None => {
            tracing::warn!(
                "Engine {:?} not found; games will have no automated opponent",
                config.engine
            );
            Arc::new(StockfishLauncher::unavailable())
        }
    };

    let sessions = Arc::new(SessionStore::new(launcher, config.oracle_timeout));
    let app = api::router(sessions);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Log to stdout, and to daily rolling files when a log directory is set.
fn init_tracing(
    config: &Config,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout = fmt::layer().with_span_events(FmtSpan::CLOSE);

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "chessweb-server");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stdout).init();
            Ok(None)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
