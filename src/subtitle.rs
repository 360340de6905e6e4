use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SubsError};

static TIMECODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})$").expect("timecode pattern is valid")
});

/// Millisecond-precision subtitle time, rendered as `HH:MM:SS,mmm`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode {
    millis: u64,
}

impl Timecode {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }
}

impl FromStr for Timecode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let caps = TIMECODE_RE
            .captures(s)
            .ok_or_else(|| format!("invalid timecode '{}'", s))?;

        let field = |i: usize| caps[i].parse::<u64>().map_err(|e| format!("invalid timecode '{}': {}", s, e));
        let (hours, minutes, seconds, millis) = (field(1)?, field(2)?, field(3)?, field(4)?);

        if minutes >= 60 || seconds >= 60 {
            return Err(format!("invalid timecode '{}': minutes and seconds must be below 60", s));
        }

        Ok(Self::from_millis(
            hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis,
        ))
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.millis / 3_600_000;
        let minutes = (self.millis % 3_600_000) / 60_000;
        let secs = (self.millis % 60_000) / 1_000;
        let millis = self.millis % 1_000;

        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }
}

/// One numbered block of an SRT file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    /// Entry index as written in the file (1-based)
    pub index: u32,
    pub start: Timecode,
    pub end: Timecode,
    /// Text lines in display order
    pub text: Vec<String>,
}

impl SubtitleEntry {
    pub fn new(index: u32, start: Timecode, end: Timecode, text: Vec<String>) -> Self {
        Self { index, start, end, text }
    }

    /// Derive an entry with the same index and timing but different text
    pub fn with_text(&self, text: Vec<String>) -> Self {
        Self {
            index: self.index,
            start: self.start,
            end: self.end,
            text,
        }
    }

    /// True when the entry carries no visible text
    pub fn is_blank(&self) -> bool {
        self.text.iter().all(|line| line.trim().is_empty())
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.start, self.end)?;
        for line in &self.text {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> SubsError {
    SubsError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_timing(line: &str) -> std::result::Result<(Timecode, Timecode), String> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| format!("expected 'start --> end', found '{}'", line.trim()))?;

    // Some files carry position hints after the end time (e.g. "X1:40 X2:600")
    let end = rest.split_whitespace().next().unwrap_or_default();

    Ok((start.parse()?, end.parse()?))
}

/// Parse SRT content into entries
///
/// Accepts a leading UTF-8 BOM and CRLF line endings. Indices must be unique.
/// A block may have no text lines at all.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>> {
    let content = content.trim_start_matches('\u{feff}');
    let mut lines = content.lines().enumerate().peekable();
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    loop {
        while lines.next_if(|(_, line)| line.trim().is_empty()).is_some() {}

        let Some((offset, index_line)) = lines.next() else {
            break;
        };
        let line_no = offset + 1;

        let index: u32 = index_line.trim().parse().map_err(|_| {
            parse_error(line_no, format!("expected subtitle index, found '{}'", index_line.trim()))
        })?;
        if !seen.insert(index) {
            return Err(parse_error(line_no, format!("duplicate subtitle index {}", index)));
        }

        let (timing_offset, timing_line) = lines
            .next()
            .ok_or_else(|| parse_error(line_no + 1, "unexpected end of input, expected timecode line"))?;
        let (start, end) = parse_timing(timing_line).map_err(|e| parse_error(timing_offset + 1, e))?;

        let mut text = Vec::new();
        while let Some((_, line)) = lines.next_if(|(_, line)| !line.trim().is_empty()) {
            text.push(line.trim_end().to_string());
        }

        entries.push(SubtitleEntry::new(index, start, end, text));
    }

    Ok(entries)
}

/// Write entries as SRT, one blank line after each block
pub fn write_srt<W: Write>(entries: &[SubtitleEntry], writer: &mut W) -> Result<()> {
    for entry in entries {
        writeln!(writer, "{}", entry)?;
    }
    Ok(())
}

/// Render entries as an SRT string
pub fn to_srt_string(entries: &[SubtitleEntry]) -> String {
    entries.iter().map(|entry| format!("{}\n", entry)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello there.\n\n2\n00:00:03,000 --> 00:00:05,000\n<i>Two</i>\nlines\n\n";

    #[test]
    fn test_timecode_display() {
        assert_eq!(Timecode::from_millis(0).to_string(), "00:00:00,000");
        assert_eq!(Timecode::from_millis(65_123).to_string(), "00:01:05,123");
        assert_eq!(Timecode::from_millis(3_661_500).to_string(), "01:01:01,500");
    }

    #[test]
    fn test_timecode_parse() {
        assert_eq!("01:01:01,500".parse::<Timecode>().unwrap().as_millis(), 3_661_500);
        assert_eq!("00:00:01.250".parse::<Timecode>().unwrap().as_millis(), 1_250);
        assert!("00:61:00,000".parse::<Timecode>().is_err());
        assert!("00:00:00".parse::<Timecode>().is_err());
        assert!("aa:00:00,000".parse::<Timecode>().is_err());
    }

    #[test]
    fn test_parse_srt() {
        let entries = parse_srt(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].index, 1);
        assert_eq!(entries[0].start.as_millis(), 1_000);
        assert_eq!(entries[0].end.as_millis(), 2_500);
        assert_eq!(entries[0].text, vec!["Hello there."]);
        assert_eq!(entries[1].text, vec!["<i>Two</i>", "lines"]);
    }

    #[test]
    fn test_parse_srt_bom_crlf_and_missing_trailing_blank() {
        let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n\r\n\r\n2\r\n00:00:02,000 --> 00:00:03,000\r\nBye";
        let entries = parse_srt(content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, vec!["Hi"]);
        assert_eq!(entries[1].text, vec!["Bye"]);
    }

    #[test]
    fn test_parse_srt_blank_entry_and_position_hints() {
        let content = "7\n00:00:01,000 --> 00:00:02,000 X1:40 X2:600\n\n8\n00:00:02,000 --> 00:00:03,000\nText\n";
        let entries = parse_srt(content).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_blank());
        assert_eq!(entries[0].end.as_millis(), 2_000);
        assert_eq!(entries[1].index, 8);
    }

    #[test]
    fn test_parse_srt_empty_input() {
        assert!(parse_srt("").unwrap().is_empty());
        assert!(parse_srt("\n\n  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_srt_rejects_bad_index() {
        let err = parse_srt("one\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap_err();
        assert!(matches!(err, SubsError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_srt_rejects_bad_timing() {
        let err = parse_srt("1\n00:00:01,000 -> 00:00:02,000\nHi\n").unwrap_err();
        assert!(matches!(err, SubsError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_srt_rejects_truncated_block() {
        let err = parse_srt("1\n00:00:01,000 --> 00:00:02,000\nHi\n\n2\n").unwrap_err();
        assert!(matches!(err, SubsError::Parse { line: 6, .. }));
    }

    #[test]
    fn test_parse_srt_rejects_duplicate_index() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\nA\n\n1\n00:00:02,000 --> 00:00:03,000\nB\n";
        let err = parse_srt(content).unwrap_err();
        assert!(err.to_string().contains("duplicate subtitle index 1"));
    }

    #[test]
    fn test_write_srt_preserves_layout() {
        let entries = parse_srt(SAMPLE).unwrap();
        let mut buffer = Vec::new();
        write_srt(&entries, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), SAMPLE);
        assert_eq!(to_srt_string(&entries), SAMPLE);
    }

    #[test]
    fn test_with_text_keeps_index_and_timing() {
        let entry = parse_srt(SAMPLE).unwrap().remove(0);
        let translated = entry.with_text(vec!["Hola.".to_string()]);
        assert_eq!(translated.index, entry.index);
        assert_eq!(translated.start, entry.start);
        assert_eq!(translated.end, entry.end);
        assert_eq!(translated.text, vec!["Hola."]);
    }
}
