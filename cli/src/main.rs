//! CLI entrypoint for Multiturn Chat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use multiturn_application::ChatSession;
use multiturn_domain::Model;
use multiturn_infrastructure::{ConfigLoader, FileConfig, GeminiLlmGateway, JsonlConversationLogger};
use multiturn_presentation::{ChatRepl, Cli, ReplConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(&cli)?;

    info!("Starting Multiturn Chat");

    // === Configuration ===
    if let Some(path) = &cli.config
        && !cli.no_config
        && !path.exists()
    {
        bail!("Config file not found: {}", path.display());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?
    };
    apply_overrides(&mut config, &cli)?;
    config.validate()?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        println!();
        println!("{}", config.to_redacted_toml()?);
        return Ok(());
    }

    let Some(api_key) = config.provider.resolve_api_key() else {
        bail!(
            "No API key found. Set {} or `api_key` under [provider] in your config.",
            config.provider.api_key_env
        );
    };

    // === Dependency Injection ===
    let gateway = Arc::new(
        GeminiLlmGateway::new(config.provider.to_gemini_config(api_key))
            .context("Failed to create Gemini client")?,
    );

    let mut session = ChatSession::new(gateway, config.to_session_config());
    if let Some(path) = &config.logging.conversation_log {
        match JsonlConversationLogger::new(expand_home(path)) {
            Some(logger) => {
                info!("Logging conversation to {}", logger.path().display());
                session = session.with_conversation_logger(Arc::new(logger));
            }
            None => warn!("Conversation log disabled"),
        }
    }

    let repl_config = ReplConfig::default()
        .with_progress(config.repl.show_progress)
        .with_timeout_secs(config.session.timeout_seconds)
        .with_history_file(config.repl.history_file.as_deref().map(expand_home));

    let repl = ChatRepl::new(Arc::new(session)).with_config(repl_config);

    // Single question mode
    if let Some(question) = &cli.question {
        repl.send(question).await?;
        return Ok(());
    }

    repl.run().await?;
    Ok(())
}

/// Initialize logging based on verbosity level.
///
/// Diagnostics go to stderr unless `--log-file` is given; the returned guard
/// must live until exit so buffered lines reach the file.
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = &cli.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();

    Ok(Some(guard))
}

/// Command-line flags win over every config source.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) -> Result<()> {
    if let Some(model) = &cli.model {
        config.provider.model = model.parse::<Model>()?;
    }
    if let Some(system) = &cli.system {
        config.session.system_instruction = Some(system.clone());
    }
    if cli.timeout.is_some() {
        config.session.timeout_seconds = cli.timeout;
    }
    if cli.quiet {
        config.repl.show_progress = false;
    }
    if let Some(path) = &cli.conversation_log {
        config.logging.conversation_log = Some(path.to_string_lossy().into_owned());
    }
    Ok(())
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
