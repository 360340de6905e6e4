use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::subtitle::{SubtitleEntry, parse_srt, to_srt_string};
use crate::translate::{BackoffTranslator, EntryTranslation, ModelClient, make_batches};

/// What a translation run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationReport {
    /// Output entries, same indices and timing as the input, in input order
    pub entries: Vec<SubtitleEntry>,
    /// Indices that kept their original text
    pub unrecovered: Vec<u32>,
    /// Model calls made, including retries
    pub model_calls: usize,
}

pub struct Workflow {
    config: Config,
    translator: BackoffTranslator,
}

impl Workflow {
    pub fn new(config: Config, client: Box<dyn ModelClient>) -> Result<Self> {
        config.validate()?;
        let translator = BackoffTranslator::from_config(client, &config.translate)?;

        Ok(Self { config, translator })
    }

    /// Parse SRT text, translate it and render the result as SRT
    ///
    /// A parse error is returned before the model is called.
    pub async fn translate_srt(&self, input: &str) -> Result<(String, TranslationReport)> {
        let entries = parse_srt(input)?;
        let report = self.translate_entries(&entries).await?;
        let output = to_srt_string(&report.entries);
        Ok((output, report))
    }

    /// Translate entries batch by batch
    ///
    /// Entries without text are passed through and never sent to the model.
    pub async fn translate_entries(&self, entries: &[SubtitleEntry]) -> Result<TranslationReport> {
        let settings = &self.config.translate;
        let calls_before = self.translator.model_calls();

        let translatable: Vec<SubtitleEntry> = entries.iter().filter(|e| !e.is_blank()).cloned().collect();
        let batches = make_batches(&translatable, settings.batch_size, settings.max_retries)?;

        info!(
            "Translating {} entries to {} using {} ({} batches)",
            translatable.len(),
            self.translator.target_language(),
            settings.model,
            batches.len()
        );

        let progress = self.progress_bar(batches.len() as u64);
        let mut translated: HashMap<u32, EntryTranslation> = HashMap::with_capacity(translatable.len());

        for batch in batches {
            progress.set_message(format!("entries {}-{}", batch.first_index(), batch.last_index()));
            for result in self.translator.translate(batch).await {
                translated.insert(result.index, result);
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        let mut unrecovered = Vec::new();
        let output = entries
            .iter()
            .map(|entry| {
                if entry.is_blank() {
                    return entry.clone();
                }
                match translated.remove(&entry.index) {
                    Some(result) => {
                        if result.is_fallback() {
                            unrecovered.push(entry.index);
                        }
                        entry.with_text(result.text)
                    }
                    None => {
                        unrecovered.push(entry.index);
                        entry.clone()
                    }
                }
            })
            .collect();

        let model_calls = self.translator.model_calls() - calls_before;
        if unrecovered.is_empty() {
            info!("Translated all {} entries with {} model calls", translatable.len(), model_calls);
        } else {
            warn!(
                "{} of {} entries could not be translated and kept their original text: {:?}",
                unrecovered.len(),
                translatable.len(),
                unrecovered
            );
        }

        Ok(TranslationReport {
            entries: output,
            unrecovered,
            model_calls,
        })
    }

    fn progress_bar(&self, batches: u64) -> ProgressBar {
        if !self.config.logging.progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::with_draw_target(Some(batches), ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} Translating [{bar:40.cyan/blue}] {pos}/{len} batches {msg} ({eta})")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubsError;
    use crate::translate::{Prompt, TranslationResult};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FIVE: &str = "\
1
00:00:01,000 --> 00:00:02,000
Good morning.

2
00:00:02,500 --> 00:00:04,000
<i>How are you?</i>

3
00:00:04,100 --> 00:00:06,000
Fine, thanks.
And you?

4
00:00:06,200 --> 00:00:07,000
Not bad.

5
00:00:07,500 --> 00:00:09,999
See you later.
";

    /// Prefixes every line with the target marker
    struct UpperModel {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModelClient for UpperModel {
        async fn complete(&self, prompt: &Prompt) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let source = TranslationResult::parse(&prompt.user)?;
            Ok(source
                .indices()
                .map(|i| {
                    let text = source.get(i).unwrap_or_default().join("\n");
                    format!("{} >>> {}", i, text.to_uppercase())
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    struct DownModel;

    #[async_trait]
    impl ModelClient for DownModel {
        async fn complete(&self, _prompt: &Prompt) -> Result<String> {
            Err(SubsError::ModelInvocation("connection refused".to_string()))
        }
    }

    fn config(batch_size: usize) -> Config {
        let mut config = Config::default();
        config.translate.target_language = Some("Spanish".to_string());
        config.translate.batch_size = batch_size;
        config.translate.retry_delay_ms = 0;
        config.logging.progress = false;
        config
    }

    fn upper(batch_size: usize) -> (Workflow, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = UpperModel { calls: calls.clone() };
        (Workflow::new(config(batch_size), Box::new(model)).unwrap(), calls)
    }

    #[tokio::test]
    async fn test_end_to_end_five_entries_batch_two() {
        let (workflow, calls) = upper(2);

        let (output, report) = workflow.translate_srt(FIVE).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.model_calls, 3);
        assert!(report.unrecovered.is_empty());

        let input = parse_srt(FIVE).unwrap();
        let translated = parse_srt(&output).unwrap();
        assert_eq!(translated.len(), 5);
        for (before, after) in input.iter().zip(&translated) {
            assert_eq!(before.index, after.index);
            assert_eq!(before.start, after.start);
            assert_eq!(before.end, after.end);
            let expected: Vec<String> = before.text.iter().map(|l| l.to_uppercase()).collect();
            assert_eq!(after.text, expected);
        }
        assert_eq!(translated[2].text, vec!["FINE, THANKS.", "AND YOU?"]);
        assert!(output.starts_with("1\n00:00:01,000 --> 00:00:02,000\nGOOD MORNING.\n\n2\n"));
    }

    #[tokio::test]
    async fn test_result_independent_of_batch_size() {
        let (reference, _) = upper(1);
        let (expected, _) = reference.translate_srt(FIVE).await.unwrap();

        for batch_size in [2, 3, 4, 5, 20] {
            let (workflow, _) = upper(batch_size);
            let (output, _) = workflow.translate_srt(FIVE).await.unwrap();
            assert_eq!(output, expected, "batch size {}", batch_size);
        }
    }

    #[tokio::test]
    async fn test_unreachable_model_keeps_every_entry() {
        let workflow = Workflow::new(config(2), Box::new(DownModel)).unwrap();

        let (output, report) = workflow.translate_srt(FIVE).await.unwrap();

        assert_eq!(report.unrecovered, vec![1, 2, 3, 4, 5]);
        assert_eq!(output, FIVE.to_string() + "\n");
    }

    #[tokio::test]
    async fn test_blank_entries_pass_through() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\n\n3\n00:00:05,000 --> 00:00:06,000\nBye\n";
        let (workflow, calls) = upper(20);

        let report = workflow.translate_entries(&parse_srt(input).unwrap()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.entries[0].text, vec!["HELLO"]);
        assert!(report.entries[1].text.is_empty());
        assert_eq!(report.entries[1].index, 2);
        assert_eq!(report.entries[2].text, vec!["BYE"]);
    }

    #[tokio::test]
    async fn test_parse_error_stops_before_model_call() {
        let (workflow, calls) = upper(2);

        let err = workflow.translate_srt("1\nnot a timecode\nHi\n").await.unwrap_err();

        assert!(matches!(err, SubsError::Parse { line: 2, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_input_translates_to_empty_output() {
        let (workflow, calls) = upper(2);
        let (output, report) = workflow.translate_srt("").await.unwrap();
        assert!(output.is_empty());
        assert!(report.entries.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut bad = config(0);
        assert!(matches!(Workflow::new(bad.clone(), Box::new(DownModel)), Err(SubsError::Config(_))));

        bad.translate.batch_size = 5;
        bad.translate.target_language = None;
        assert!(matches!(Workflow::new(bad, Box::new(DownModel)), Err(SubsError::Config(_))));
    }
}
