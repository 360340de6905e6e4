// Batched subtitle translation with recursive recovery
//
// - batch: groups entries into contiguous batches and splits them on failure
// - prompt: builds the `ID >>> text` chat prompt
// - response: parses and validates the model's answer
// - backoff: the split/retry recursion
// - ollama: the HTTP model client

pub mod backoff;
pub mod batch;
pub mod ollama;
pub mod prompt;
pub mod response;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use backoff::{BackoffTranslator, EntryTranslation, TranslationStatus};
pub use batch::{Batch, make_batches};
pub use ollama::OllamaClient;
pub use prompt::{Prompt, build_prompt, language_code_to_name};
pub use response::TranslationResult;
use crate::error::Result;

/// A language model that answers a chat prompt with text
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one prompt; transport and server failures come back as errors
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
}
