//! CLI entrypoint for agora
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use agora_application::{
    DiscussionLauncher, DiscussionProgressNotifier, EventLog, LlmClient, NoProgress,
    RunDiscussionInput, RunDiscussionUseCase, SessionLauncher,
};
use agora_domain::{OutputFormat, SessionId};
use agora_infrastructure::{
    ConfigLoader, FileConfig, FileLoggingConfig, InMemoryEventLog, JsonlEventLog, ProviderKind,
    ScriptedLlmClient,
};
use agora_presentation::{Cli, ConsoleFormatter, ProgressReporter};
use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("failed to load configuration: {e}"))?
    };
    apply_overrides(&cli, &mut config);
    config.validate().context("invalid configuration")?;

    // keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(cli.verbose, &config.logging)?;
    info!("Starting agora");

    if cli.no_color || !config.output.color {
        ConsoleFormatter::set_color(false);
    }

    let participants = config.participants();
    if participants.is_empty() {
        bail!("No participants configured. Add [[agents]] entries to agora.toml.");
    }
    let scenario = config.scenario();
    let topic = cli.topic.clone().unwrap_or_else(|| scenario.topic.clone());
    if topic.trim().is_empty() {
        bail!("A topic is required: pass it as an argument or set [discussion] topic.");
    }

    // === Dependency Injection ===
    let client = build_client(&cli, &config)?;
    let event_log = build_event_log(&cli, &config)?;
    info!(client = client.name(), "LLM client ready");

    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();
    let stream_transcript = format == OutputFormat::Transcript && !cli.quiet;
    let progress: Arc<dyn DiscussionProgressNotifier> =
        if cli.quiet || format == OutputFormat::Json {
            Arc::new(NoProgress)
        } else {
            Arc::new(ProgressReporter::new().with_transcript(stream_transcript))
        };

    let use_case = Arc::new(
        RunDiscussionUseCase::new(client, Arc::clone(&event_log))
            .with_params(config.discussion_params()),
    );
    let launcher = SessionLauncher::new(use_case).with_progress(progress);

    let mut input = RunDiscussionInput::new(topic.clone(), scenario, participants);
    if let Some(id) = &cli.session_id {
        input = input.with_session_id(SessionId::new(id.clone()));
    }
    let session_id = launcher.register(input).await?;
    launcher.start(&session_id).await?;

    let interrupted = tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.is_ok(),
        finished = launcher.finished(&session_id) => {
            finished?;
            false
        }
    };
    if interrupted {
        warn!(session_id = %session_id, "Interrupted, stopping discussion");
        launcher.stop(&session_id).await?;
    }

    let outcome = launcher.wait(&session_id).await??;
    let events = event_log.get_events(&session_id).await?;

    let output = if stream_transcript {
        ConsoleFormatter::format_outcome(&outcome)
    } else {
        ConsoleFormatter::render(format, &topic, &events, &outcome)
    };
    println!("{}", output);

    Ok(())
}

fn apply_overrides(cli: &Cli, config: &mut FileConfig) {
    if let Some(model) = &cli.model {
        config.discussion.default_model = model.clone();
    }
    if let Some(model) = &cli.moderator {
        config.discussion.moderator_model = Some(model.clone());
    }
    if let Some(max_rounds) = cli.max_rounds {
        config.scenario.max_total_rounds = max_rounds;
    }
    if cli.dry_run {
        config.provider.kind = ProviderKind::Scripted;
    }
}

/// stderr logging filtered by `-v`, plus an optional daily log file.
fn init_logging(verbose: u8, logging: &FileLoggingConfig) -> Result<Option<WorkerGuard>> {
    let directive = match verbose {
        0 => logging.filter.clone().unwrap_or_else(|| "warn".to_string()),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(), // -vvv or more
    };
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter '{directive}'"))?;

    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    match &logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr_layer).init();
            Ok(None)
        }
    }
}

fn build_client(cli: &Cli, config: &FileConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider.kind {
        ProviderKind::Scripted => {
            if !cli.quiet {
                eprintln!("Dry run: using the offline scripted client");
            }
            Ok(Arc::new(ScriptedLlmClient::new()))
        }
        #[cfg(feature = "http-provider")]
        ProviderKind::Openai => {
            if config.provider.resolve_api_key().is_none() {
                warn!(
                    env = %config.provider.api_key_env,
                    "No API key found, sending unauthenticated requests"
                );
            }
            let client = agora_infrastructure::OpenAiCompatibleClient::new(&config.provider)?;
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "http-provider"))]
        ProviderKind::Openai => bail!(
            "This build has no HTTP provider. Rebuild with --features http-provider or use --dry-run."
        ),
    }
}

fn build_event_log(cli: &Cli, config: &FileConfig) -> Result<Arc<dyn EventLog>> {
    match cli.events_dir.as_ref().or(config.output.events_dir.as_ref()) {
        Some(dir) => {
            let log = JsonlEventLog::open(dir)
                .with_context(|| format!("cannot open event log in {}", dir.display()))?;
            Ok(Arc::new(log))
        }
        None => Ok(Arc::new(InMemoryEventLog::new())),
    }
}
