//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the discussion result
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every speech, question and summary, then the outcome
    Transcript,
    /// Only the final summary and outcome
    Summary,
    /// Outcome and full event log as JSON
    Json,
}

impl From<OutputFormat> for agora_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Transcript => agora_domain::OutputFormat::Transcript,
            OutputFormat::Summary => agora_domain::OutputFormat::Summary,
            OutputFormat::Json => agora_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for agora
#[derive(Parser, Debug)]
#[command(name = "agora")]
#[command(author, version, about = "Moderated multi-agent discussions between LLM personas")]
#[command(long_about = r#"
Agora runs a moderated discussion between LLM-driven personas.

Each round every participant privately states whether it wants to speak.
A moderator arbitrates, grants the floor, asks guiding questions when the
discussion stalls, summarizes phases and decides when the discussion ends.
Everything that happens is recorded in an append-only event log.

Participants and phases come from configuration files, loaded from
(in priority order):
1. AGORA_* environment variables (AGORA_DISCUSSION__DEFAULT_MODEL=...)
2. --config <path>      Explicit config file
3. ./agora.toml         Project-level config
4. ~/.config/agora/config.toml   Global config

Example:
  agora "Should the city ban cars downtown?"
  agora --dry-run -o summary "Four-day work week"
  agora --events-dir ./events --session-id tax-01 "Flat tax?"
"#)]
pub struct Cli {
    /// Discussion topic (overrides `[discussion] topic` and `[scenario] topic`)
    pub topic: Option<String>,

    /// Default model for participants without their own model
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Model used by the moderator
    #[arg(long, value_name = "MODEL")]
    pub moderator: Option<String>,

    /// Global round ceiling for the whole discussion
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Persist the event log as JSONL files in this directory
    #[arg(long, value_name = "DIR")]
    pub events_dir: Option<PathBuf>,

    /// Session id to use instead of a generated one
    #[arg(long, value_name = "ID")]
    pub session_id: Option<String>,

    /// Run against the offline scripted client instead of a real provider
    #[arg(long)]
    pub dry_run: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
