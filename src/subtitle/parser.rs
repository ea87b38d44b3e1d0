//! SRT / WebVTT cue parsing
//!
//! Best-effort: blocks that do not look like cues are dropped, never fatal.
//! Documents that match neither format come back as an empty cue list.

use regex::Regex;
use tracing::debug;

use crate::models::{SubFormat, SubtitleCue};

const SRT_TIMING: &str =
    r"^\s*(\d{1,2}):(\d{2}):(\d{2}),(\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2}),(\d{3})";
const VTT_TIMING: &str =
    r"^\s*((?:\d+:)?\d{1,2}:\d{2}\.\d{3})\s+-->\s+((?:\d+:)?\d{1,2}:\d{2}\.\d{3})";
const SRT_HINT: &str = r"\d{1,2}:\d{2}:\d{2},\d{3}\s*-->";

/// Parse a subtitle payload into cues sorted by start time
///
/// `hint` skips format detection when the caller already knows the format
/// (e.g. from the downloaded filename).
pub fn parse(content: &str, hint: Option<SubFormat>) -> Vec<SubtitleCue> {
    let content = normalize(content);
    let format = hint.unwrap_or_else(|| detect_format(&content));

    let mut cues = match format {
        SubFormat::Srt => parse_srt(&content),
        SubFormat::WebVtt => parse_vtt(&content),
    };
    cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    cues
}

/// Guess the format of a payload
///
/// A leading `WEBVTT` marker wins. Otherwise a `-->` line with a
/// comma-delimited millisecond field means SRT, and anything else is
/// treated as SRT too.
pub fn detect_format(content: &str) -> SubFormat {
    let head = content.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("WEBVTT") {
        return SubFormat::WebVtt;
    }

    let looks_srt = Regex::new(SRT_HINT)
        .map(|re| re.is_match(content))
        .unwrap_or(false);
    if !looks_srt {
        // Unrecognised payloads fall through the SRT parser and yield nothing
        debug!("no SRT timing line found, defaulting to SRT");
    }
    SubFormat::Srt
}

/// Parse SubRip: index line, timing line, then one or more text lines
pub fn parse_srt(content: &str) -> Vec<SubtitleCue> {
    let Ok(timing) = Regex::new(SRT_TIMING) else {
        return Vec::new();
    };
    let cleaner = TextCleaner::new();
    let content = normalize(content);

    let mut cues = Vec::new();
    for block in split_blocks(&content) {
        let lines: Vec<&str> = block.lines().collect();
        if lines.len() < 3 {
            continue;
        }

        let Some(caps) = timing.captures(lines[1]) else {
            continue;
        };
        let field = |i: usize| -> u64 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        let (Some(start), Some(end)) = (
            hms_to_seconds(field(1), field(2), field(3), field(4)),
            hms_to_seconds(field(5), field(6), field(7), field(8)),
        ) else {
            continue;
        };
        if end < start {
            continue;
        }

        let text = cleaner.clean(&lines[2..].join("\n"));
        if !text.is_empty() {
            cues.push(SubtitleCue::new(start, end, text));
        }
    }
    cues
}

/// Parse WebVTT line by line
///
/// A timing line opens a cue, a blank line closes it. The header, `NOTE`,
/// `STYLE` and `REGION` blocks and cue identifiers are skipped.
pub fn parse_vtt(content: &str) -> Vec<SubtitleCue> {
    let Ok(timing) = Regex::new(VTT_TIMING) else {
        return Vec::new();
    };
    let cleaner = TextCleaner::new();
    let content = normalize(content);

    let mut cues = Vec::new();
    let mut current: Option<(f64, f64)> = None;
    let mut text: Vec<&str> = Vec::new();
    let mut skipping_block = false;

    let mut flush = |range: Option<(f64, f64)>, text: &mut Vec<&str>| {
        if let Some((start, end)) = range {
            let cleaned = cleaner.clean(&text.join("\n"));
            if !cleaned.is_empty() && start <= end {
                cues.push(SubtitleCue::new(start, end, cleaned));
            }
        }
        text.clear();
    };

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush(current.take(), &mut text);
            skipping_block = false;
            continue;
        }
        if skipping_block {
            continue;
        }

        if let Some(caps) = timing.captures(trimmed) {
            // A timing line without a blank separator still starts a new cue
            flush(current.take(), &mut text);
            let start = caps.get(1).and_then(|m| parse_vtt_timestamp(m.as_str()));
            let end = caps.get(2).and_then(|m| parse_vtt_timestamp(m.as_str()));
            if let (Some(start), Some(end)) = (start, end) {
                current = Some((start, end));
            }
            continue;
        }

        if current.is_some() {
            text.push(trimmed);
        } else if trimmed.starts_with("WEBVTT")
            || trimmed.starts_with("NOTE")
            || trimmed.starts_with("STYLE")
            || trimmed.starts_with("REGION")
        {
            skipping_block = true;
        }
        // Anything else outside a cue is an identifier line
    }
    flush(current.take(), &mut text);

    cues
}

/// Parse `H:MM:SS.mmm` or `MM:SS.mmm` into seconds
fn parse_vtt_timestamp(stamp: &str) -> Option<f64> {
    let (clock, millis) = stamp.split_once('.')?;
    let millis: u64 = millis.parse().ok()?;
    let parts: Vec<u64> = clock
        .split(':')
        .map(|p| p.parse().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [h, m, s] => hms_to_seconds(*h, *m, *s, millis),
        [m, s] => hms_to_seconds(0, *m, *s, millis),
        _ => None,
    }
}

/// `None` when the fields overflow
fn hms_to_seconds(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<f64> {
    let whole = hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?;
    Some(whole as f64 + millis as f64 / 1000.0)
}

/// Strip BOM and normalise line endings
fn normalize(content: &str) -> String {
    content
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Split on blank lines (lines that are empty or whitespace only)
fn split_blocks(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

// =============================================================================
// Text cleanup
// =============================================================================

/// Removes markup and formatting artifacts from cue text
struct TextCleaner {
    tags: Option<Regex>,
    overrides: Option<Regex>,
    spaces: Option<Regex>,
}

impl TextCleaner {
    fn new() -> Self {
        Self {
            tags: Regex::new(r"<[^>]*>").ok(),
            overrides: Regex::new(r"\{[^}]*\}").ok(),
            spaces: Regex::new(r"[ \t\u{a0}]+").ok(),
        }
    }

    fn clean(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        if let Some(re) = &self.tags {
            text = re.replace_all(&text, "").into_owned();
        }
        if let Some(re) = &self.overrides {
            text = re.replace_all(&text, "").into_owned();
        }

        text = text
            .replace("\\N", "\n")
            .replace("\\n", "\n")
            .replace("\\h", " ")
            .replace("&nbsp;", " ");

        let lines: Vec<String> = text
            .lines()
            .map(|line| match &self.spaces {
                Some(re) => re.replace_all(line, " ").trim().to_string(),
                None => line.trim().to_string(),
            })
            .filter(|line| !line.is_empty())
            .collect();
        lines.join("\n")
    }
}

/// Strip markup, style overrides and redundant whitespace from cue text
pub fn clean_text(raw: &str) -> String {
    TextCleaner::new().clean(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_srt_single_cue() {
        let cues = parse("1\n00:00:01,000 --> 00:00:03,500\nHello <b>world</b>\n", None);
        assert_eq!(cues, vec![SubtitleCue::new(1.0, 3.5, "Hello world")]);
    }

    #[test]
    fn test_parse_vtt_single_cue() {
        let cues = parse("WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nHi\n", None);
        assert_eq!(cues, vec![SubtitleCue::new(0.0, 2.0, "Hi")]);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("WEBVTT\n\n"), SubFormat::WebVtt);
        assert_eq!(detect_format("\u{feff}WEBVTT - title\n"), SubFormat::WebVtt);
        assert_eq!(
            detect_format("1\n00:00:01,000 --> 00:00:02,000\nx"),
            SubFormat::Srt
        );
        assert_eq!(detect_format("random text"), SubFormat::Srt);
    }

    #[test]
    fn test_vtt_short_timestamps() {
        assert_eq!(parse_vtt_timestamp("01:02.500"), Some(62.5));
        assert_eq!(parse_vtt_timestamp("1:00:00.000"), Some(3600.0));
        assert_eq!(parse_vtt_timestamp("bogus"), None);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("{\\an8}<i>Hello</i>   there"), "Hello there");
        assert_eq!(clean_text("Line one\\NLine two"), "Line one\nLine two");
        assert_eq!(clean_text("  a\\hb  "), "a b");
        assert_eq!(clean_text("<font color=\"red\"></font>"), "");
    }

    #[test]
    fn test_srt_drops_malformed_blocks() {
        let srt = "1\nnot a timing line\nText\n\n\
                   2\n00:00:05,000 --> 00:00:06,000\n\n\
                   3\n00:00:07,000 --> 00:00:08,000\nKept\n";
        let cues = parse_srt(srt);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Kept");
    }

    #[test]
    fn test_srt_crlf() {
        let srt = "1\r\n00:00:01,000 --> 00:00:02,000\r\nWindows\r\n\r\n";
        let cues = parse(srt, None);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Windows");
    }
}
