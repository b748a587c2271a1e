//! Agent State - A durable key-value store shared between agent sessions
//!
//! `serve` runs the HTTP API; `invoke` performs a single tool call and prints
//! its JSON response, for hosts that spawn one process per call.

use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_state::api::create_router;
use agent_state::{spawn_purge_task, AppState, Config, StateTool, StoreHandle};

#[derive(Parser, Debug)]
#[command(name = "agent_state", version, about = "Persistent key-value state shared by agents")]
struct Cli {
    /// Database file (overrides STATE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Port to listen on (overrides SERVER_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one state tool call and print the JSON response
    Invoke {
        /// Writer label recorded on set
        #[arg(long)]
        agent: Option<String>,
        /// Tool arguments as JSON; read from stdin when omitted
        arguments: Option<String>,
    },
    /// Print the tool's name, description and argument schema
    Spec,
}

/// Main entry point for the state store.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging (stderr)
/// 2. Load configuration from environment variables, then CLI overrides
/// 3. Dispatch to the selected subcommand
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var.
    // Logs go to stderr so `invoke` output stays machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_state=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            serve(config).await
        }
        Command::Invoke { agent, arguments } => invoke(config, agent, arguments).await,
        Command::Spec => {
            println!("{}", serde_json::to_string_pretty(&StateTool::spec())?);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Starting Agent State Server");
    info!(
        "Configuration loaded: db={}, busy_timeout={}ms, port={}, purge_interval={}s",
        config.db_path.display(),
        config.busy_timeout_ms,
        config.server_port,
        config.purge_interval
    );

    let state = AppState::from_config(&config);

    // Open eagerly so a bad path fails at startup rather than on the first request
    state
        .handle
        .store()
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    let purge_handle = if config.purge_interval > 0 {
        Some(spawn_purge_task(state.handle.clone(), config.purge_interval))
    } else {
        info!("Purge task disabled; expired entries are hidden until deleted");
        None
    };

    let handle = state.handle.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(purge_handle))
        .await
        .context("server error")?;

    handle.close().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn invoke(
    config: Config,
    agent: Option<String>,
    arguments: Option<String>,
) -> anyhow::Result<()> {
    let arguments = match arguments {
        Some(arguments) => arguments,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading tool arguments from stdin")?;
            buf
        }
    };

    let handle = StoreHandle::new(config);
    let tool = StateTool::new(handle.clone());
    let response = tool.invoke_json(&arguments, agent.as_deref()).await;
    handle.close().await;

    println!("{}", response);
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the purge task and allows graceful shutdown.
async fn shutdown_signal(purge_handle: Option<tokio::task::JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(purge_handle) = purge_handle {
        purge_handle.abort();
        warn!("Purge task aborted");
    }
}
