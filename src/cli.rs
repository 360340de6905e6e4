use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Translate SRT subtitles with a local Ollama model.
///
/// Reads SRT from stdin and writes the translation to stdout, e.g.
/// `cat movie.srt | ollama-subs --lang Spanish > movie.es.srt`
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
pub struct Args {
    /// Target language (e.g. "Spanish", "French" or "ja")
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Ollama model to use [default: llama3]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Number of subtitles per batch [default: 20]
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Retries for a single failing subtitle once its batch is split down [default: 2]
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Ollama endpoint URL [default: http://localhost:11434]
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Read SRT from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write SRT to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Args {
    /// Command-line values take precedence over the configuration file
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(lang) = &self.lang {
            config.translate.target_language = Some(lang.clone());
        }
        if let Some(model) = &self.model {
            config.translate.model = model.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.translate.batch_size = batch_size;
        }
        if let Some(retries) = self.retries {
            config.translate.max_retries = retries;
        }
        if let Some(endpoint) = &self.endpoint {
            config.translate.endpoint = endpoint.clone();
        }
        if self.no_progress {
            config.logging.progress = false;
        }
    }
}
