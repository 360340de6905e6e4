use crate::error::{Result, SubsError};
use crate::subtitle::SubtitleEntry;

/// A contiguous, non-empty run of entries translated in one request,
/// tagged with the retry budget it has left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    entries: &'a [SubtitleEntry],
    retries: u32,
}

impl<'a> Batch<'a> {
    /// Returns `None` for an empty slice
    pub fn new(entries: &'a [SubtitleEntry], retries: u32) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Self { entries, retries })
        }
    }

    pub fn entries(&self) -> &'a [SubtitleEntry] {
        self.entries
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_index(&self) -> u32 {
        self.entries[0].index
    }

    pub fn last_index(&self) -> u32 {
        self.entries[self.entries.len() - 1].index
    }

    /// Same entries with a different budget
    pub fn with_retries(self, retries: u32) -> Self {
        Self { retries, ..self }
    }

    /// Split into two halves keeping the budget; the first half gets the extra
    /// entry when the length is odd. Returns `None` for a single entry.
    pub fn split(self) -> Option<(Self, Self)> {
        if self.entries.len() < 2 {
            return None;
        }
        let (left, right) = self.entries.split_at(self.entries.len().div_ceil(2));
        Some((
            Self { entries: left, retries: self.retries },
            Self { entries: right, retries: self.retries },
        ))
    }
}

/// Group entries into batches of at most `batch_size`, in order
///
/// The last batch may be shorter. Every entry lands in exactly one batch.
pub fn make_batches(entries: &[SubtitleEntry], batch_size: usize, retries: u32) -> Result<Vec<Batch<'_>>> {
    if batch_size == 0 {
        return Err(SubsError::Config("Batch size must be at least 1".to_string()));
    }

    Ok(entries
        .chunks(batch_size)
        .map(|chunk| Batch { entries: chunk, retries })
        .collect())
}
