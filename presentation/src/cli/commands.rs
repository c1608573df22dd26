//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for multiturn-chat
#[derive(Parser, Debug)]
#[command(name = "multiturn-chat")]
#[command(author, version, about = "Multi-turn chat with Gemini models in your terminal")]
#[command(long_about = r#"
Multiturn Chat keeps a conversation with a Gemini model. Every message you
send carries the whole conversation so far, so the model remembers context.

Without a question an interactive session starts. Inside it:
  /new       start a new conversation
  /history   show the conversation so far
  Ctrl-C     cancel a reply that is still streaming

Configuration files are loaded from (in priority order):
1. MULTITURN_<SECTION>__<KEY>   Environment variables
2. --config <path>              Explicit config file
3. ./multiturn.toml             Project-level config
4. ~/.config/multiturn-chat/config.toml   Global config

Example:
  multiturn-chat
  multiturn-chat -m gemini-2.5-flash "Explain ownership in Rust"
  multiturn-chat --system "Answer like a pirate" --timeout 60
"#)]
pub struct Cli {
    /// Ask a single question and exit instead of starting a session
    pub question: Option<String>,

    /// Model to converse with
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// System instruction sent ahead of the conversation
    #[arg(long, value_name = "TEXT")]
    pub system: Option<String>,

    /// Cancel a reply still pending after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the loading indicator
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and the effective settings, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append conversation events as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,
}
