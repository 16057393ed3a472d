//! `toolhost` binary: terminal chat, HTTP endpoint and tool listing over
//! the servers named in a config file.

mod cli;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use toolhost_core::config::{FileConfigProvider, LlmSettings, DEFAULT_CONFIG_FILE};
use toolhost_core::llm::create_provider;
use toolhost_core::{CancellationToken, Logger, OrchestrationSession, ProviderRegistry, TracingLogger};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; settings fall back to the process environment.
    let _ = dotenvy::dotenv();
    init_tracing("toolhost=info,toolhost_core=info");

    let cli = Cli::parse();
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new());

    match cli.command {
        Commands::Chat { config } => cmd_chat(config_source(config), logger).await,
        Commands::Serve { config, bind, port } => {
            cmd_serve(config_source(config), &bind, port, logger).await
        }
        Commands::Tools { config } => cmd_tools(config_source(config), logger).await,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_chat(config: FileConfigProvider, logger: Arc<dyn Logger>) -> Result<()> {
    let mut session = start_session(config, logger).await?;
    let cancel = spawn_ctrl_c_handler();

    session
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), &cancel)
        .await
        .context("chat session failed")
}

async fn cmd_serve(config: FileConfigProvider, bind: &str, port: u16, logger: Arc<dyn Logger>) -> Result<()> {
    let session = start_session(config, logger).await?;
    let cancel = spawn_ctrl_c_handler();

    server::serve(session, &format!("{bind}:{port}"), cancel).await
}

async fn cmd_tools(config: FileConfigProvider, logger: Arc<dyn Logger>) -> Result<()> {
    let registry = load_registry(config, logger).await?;

    registry
        .initialize_all()
        .await
        .context("failed to initialize servers")?;

    let description = registry.describe_tools().await;
    if description.is_empty() {
        println!("No tools available.");
    } else {
        println!("{description}");
    }

    registry.cleanup_all().await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `--config` if given, else `servers_config.json` in the working directory,
/// else the user-level file.
fn config_source(explicit: Option<PathBuf>) -> FileConfigProvider {
    if let Some(path) = explicit {
        return FileConfigProvider::new(path);
    }
    let local = FileConfigProvider::new(DEFAULT_CONFIG_FILE);
    if local.exists() {
        local
    } else {
        FileConfigProvider::user()
    }
}

async fn load_registry(config: FileConfigProvider, logger: Arc<dyn Logger>) -> Result<ProviderRegistry> {
    ProviderRegistry::from_config_provider(&config, logger)
        .await
        .with_context(|| format!("failed to load {}", config.path().display()))
}

/// Build and start a session; startup failures leave nothing connected.
async fn start_session(config: FileConfigProvider, logger: Arc<dyn Logger>) -> Result<OrchestrationSession> {
    let registry = load_registry(config, Arc::clone(&logger)).await?;
    let settings = LlmSettings::from_env();
    tracing::info!(provider = %settings.provider, model = %settings.model, "using LLM");

    let llm = create_provider(settings, Arc::clone(&logger)).context("failed to create LLM provider")?;

    let mut session = OrchestrationSession::new(registry, llm, logger);
    session.start().await.context("failed to start session")?;
    Ok(session)
}

/// Cancel the returned token on the first Ctrl-C.
fn spawn_ctrl_c_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            token.cancel();
        }
    });
    cancel
}

/// Initialize the tracing subscriber with the given default filter.
///
/// Logs go to stderr so the chat transcript on stdout stays clean.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
