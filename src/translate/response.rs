use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SubsError};
use crate::subtitle::SubtitleEntry;

static ENTRY_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*>>>\s?(.*)$").expect("entry line pattern is valid"));

/// Translated lines keyed by subtitle index, as returned by the model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationResult {
    lines: BTreeMap<u32, Vec<String>>,
}

impl TranslationResult {
    /// Parse `ID >>> text` blocks
    ///
    /// Lines that do not start a block belong to the block above them. Text
    /// before the first block (preambles) and markdown fences are dropped.
    /// An index that appears twice makes the whole response invalid.
    pub fn parse(response: &str) -> Result<Self> {
        let mut lines: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        let mut current: Option<u32> = None;

        for raw in response.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with("```") {
                continue;
            }

            if let Some(caps) = ENTRY_LINE_RE.captures(line) {
                let index: u32 = caps[1]
                    .parse()
                    .map_err(|_| SubsError::Validation(format!("index out of range: {}", &caps[1])))?;
                if lines.contains_key(&index) {
                    return Err(SubsError::Validation(format!("index {} returned twice", index)));
                }

                let first = caps[2].trim();
                let text = if first.is_empty() { Vec::new() } else { vec![first.to_string()] };
                lines.insert(index, text);
                current = Some(index);
            } else if let Some(index) = current {
                lines.entry(index).or_default().push(line.to_string());
            }
        }

        if lines.is_empty() {
            return Err(SubsError::Validation(
                "no 'ID >>> text' lines in response".to_string(),
            ));
        }

        Ok(Self { lines })
    }

    /// Check that this result answers exactly the given batch
    pub fn validate(&self, batch: &[SubtitleEntry]) -> Result<()> {
        let expected: BTreeSet<u32> = batch.iter().map(|entry| entry.index).collect();
        let returned: BTreeSet<u32> = self.lines.keys().copied().collect();

        let missing: Vec<u32> = expected.difference(&returned).copied().collect();
        let extra: Vec<u32> = returned.difference(&expected).copied().collect();
        if !missing.is_empty() || !extra.is_empty() {
            return Err(SubsError::Validation(format!(
                "index mismatch (missing {:?}, unexpected {:?})",
                missing, extra
            )));
        }

        for entry in batch {
            let translated_blank = self.lines[&entry.index].iter().all(|line| line.trim().is_empty());
            if translated_blank && !entry.is_blank() {
                return Err(SubsError::Validation(format!(
                    "empty translation for index {}",
                    entry.index
                )));
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returned indices in ascending order
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines.keys().copied()
    }

    pub fn get(&self, index: u32) -> Option<&[String]> {
        self.lines.get(&index).map(Vec::as_slice)
    }

    /// Take the translated lines for one index
    pub fn take(&mut self, index: u32) -> Option<Vec<String>> {
        self.lines.remove(&index)
    }
}
