use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::Result;
use crate::subtitle::SubtitleEntry;
use super::{Batch, ModelClient, TranslationResult, build_prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationStatus {
    Translated,
    /// Retries exhausted; the text is the original, possibly marked
    Fallback,
}

/// Outcome for one subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTranslation {
    pub index: u32,
    pub text: Vec<String>,
    pub status: TranslationStatus,
}

impl EntryTranslation {
    pub fn is_fallback(&self) -> bool {
        self.status == TranslationStatus::Fallback
    }
}

/// Translates batches and recovers from bad model output by splitting
///
/// On a failed attempt a batch with budget left is halved and both halves
/// are retried with the same budget. A single entry is retried with the
/// budget decremented. At budget zero every entry of the batch falls back.
/// A batch of N entries with budget R therefore costs at most
/// `(2N - 1) + N * R` model calls.
pub struct BackoffTranslator {
    client: Box<dyn ModelClient>,
    target_language: String,
    retry_delay: Duration,
    fallback_marker: Option<String>,
    calls: AtomicUsize,
}

impl BackoffTranslator {
    pub fn new(client: Box<dyn ModelClient>, target_language: impl Into<String>) -> Self {
        Self {
            client,
            target_language: target_language.into(),
            retry_delay: Duration::ZERO,
            fallback_marker: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn from_config(client: Box<dyn ModelClient>, config: &TranslateConfig) -> Result<Self> {
        Ok(Self::new(client, config.target_language()?)
            .with_retry_delay(Duration::from_millis(config.retry_delay_ms))
            .with_fallback_marker(config.fallback_marker.clone()))
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_fallback_marker(mut self, marker: Option<String>) -> Self {
        self.fallback_marker = marker.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Model calls made so far
    pub fn model_calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Translate one batch; always returns one result per entry, in order
    pub async fn translate(&self, batch: Batch<'_>) -> Vec<EntryTranslation> {
        self.translate_at_depth(batch, 0).await
    }

    async fn translate_at_depth(&self, batch: Batch<'_>, depth: usize) -> Vec<EntryTranslation> {
        let indent = "  ".repeat(depth);

        let error = match self.attempt(batch.entries()).await {
            Ok(result) => return Self::collect(batch.entries(), result),
            Err(e) => e,
        };

        warn!(
            "{}Batch {}-{} ({} entries, {} retries left) failed: {}",
            indent,
            batch.first_index(),
            batch.last_index(),
            batch.len(),
            batch.retries(),
            error
        );

        if batch.retries() == 0 {
            for entry in batch.entries() {
                warn!("{}Giving up on entry {}, keeping original text", indent, entry.index);
            }
            return batch.entries().iter().map(|entry| self.fallback(entry)).collect();
        }

        if error.is_invocation() && !self.retry_delay.is_zero() {
            tokio::time::sleep(self.retry_delay).await;
        }

        match batch.split() {
            Some((left, right)) => {
                info!(
                    "{}Splitting batch: {} -> {} + {}",
                    indent,
                    batch.len(),
                    left.len(),
                    right.len()
                );
                let mut results = Box::pin(self.translate_at_depth(left, depth + 1)).await;
                results.extend(Box::pin(self.translate_at_depth(right, depth + 1)).await);
                results
            }
            None => {
                let retry = batch.with_retries(batch.retries() - 1);
                Box::pin(self.translate_at_depth(retry, depth + 1)).await
            }
        }
    }

    /// One model call plus validation
    async fn attempt(&self, entries: &[SubtitleEntry]) -> Result<TranslationResult> {
        let prompt = build_prompt(entries, &self.target_language);
        debug!("Prompt for {} entries:\n{}", entries.len(), prompt.user);

        self.calls.fetch_add(1, Ordering::Relaxed);
        let response = self.client.complete(&prompt).await?;

        let result = TranslationResult::parse(&response)?;
        result.validate(entries)?;
        Ok(result)
    }

    fn collect(entries: &[SubtitleEntry], mut result: TranslationResult) -> Vec<EntryTranslation> {
        entries
            .iter()
            .map(|entry| EntryTranslation {
                index: entry.index,
                // validate() guarantees every index is present
                text: result.take(entry.index).unwrap_or_else(|| entry.text.clone()),
                status: TranslationStatus::Translated,
            })
            .collect()
    }

    fn fallback(&self, entry: &SubtitleEntry) -> EntryTranslation {
        let mut text = entry.text.clone();
        if let Some(marker) = &self.fallback_marker {
            match text.first_mut() {
                Some(first) => *first = format!("{} {}", marker, first),
                None => text.push(marker.clone()),
            }
        }

        EntryTranslation {
            index: entry.index,
            text,
            status: TranslationStatus::Fallback,
        }
    }
}
