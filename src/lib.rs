//! ollama-subs - SRT subtitle translation with a local LLM
//!
//! Subtitle entries are translated in batches so the model sees surrounding
//! lines. A batch whose answer is malformed or does not match its entries is
//! split and retried until every entry is translated or explicitly kept.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod translate;
pub mod subtitle;
pub mod error;
