//! ollama-subs - SRT subtitle translation with a local LLM
//!
//! Reads an SRT file from stdin, translates it in batches through Ollama
//! and writes the translated SRT to stdout. Logs and progress go to stderr.

use std::io::IsTerminal;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use ollama_subs::cli::Args;
use ollama_subs::config::{Config, LoggingConfig};
use ollama_subs::translate::OllamaClient;
use ollama_subs::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "ollama-subs.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration, then let flags override it
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };
    args.apply_to(&mut config);

    let _log_guard = setup_logging(args.verbose, &config.logging)?;
    config.validate()?;

    let input = read_input(&args).await?;

    let client = OllamaClient::new(&config.translate)?;
    if let Err(e) = client.check_availability().await {
        warn!("{}", e);
    }

    let workflow = Workflow::new(config, Box::new(client))?;
    let (output, report) = workflow.translate_srt(&input).await?;

    write_output(&args, &output).await?;

    if report.unrecovered.is_empty() {
        info!("Done: {} entries, {} model calls", report.entries.len(), report.model_calls);
    } else {
        warn!(
            "Done with {} untranslated entries out of {} ({} model calls)",
            report.unrecovered.len(),
            report.entries.len(),
            report.model_calls
        );
    }

    Ok(())
}

async fn read_input(args: &Args) -> Result<String> {
    if let Some(path) = &args.input {
        return Ok(tokio::fs::read_to_string(path).await?);
    }

    if std::io::stdin().is_terminal() {
        anyhow::bail!(
            "No input: pipe an SRT file into ollama-subs, e.g.\n  \
             cat subs.srt | ollama-subs --lang Spanish > subs_es.srt"
        );
    }

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    Ok(input)
}

async fn write_output(args: &Args, output: &str) -> Result<()> {
    match &args.output {
        Some(path) => tokio::fs::write(path, output).await?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(output.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

/// Log to stderr, and to a daily rolling file when a log directory is configured
fn setup_logging(verbose: bool, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // stdout carries the subtitles
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match &logging.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let (writer, guard) = non_blocking(rolling::daily(log_dir, "ollama-subs.log"));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}
