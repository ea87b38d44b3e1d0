//! Subtitle Timeline Tests
//!
//! Parsing real-world SRT/WebVTT payloads and looking up the active cue.

use streamplay::models::{SubFormat, SubtitleCue};
use streamplay::subtitle::{active_text, clean_text, detect_format, parse, SubtitleTimeline};

const MOVIE_SRT: &str = "\u{feff}1\r\n\
00:00:01,000 --> 00:00:03,500\r\n\
<i>Previously...</i>\r\n\
\r\n\
2\r\n\
00:00:04,000 --> 00:00:06,000\r\n\
{\\an8}Where were you?\r\n\
I was <b>here</b>.\r\n\
\r\n\
3\r\n\
00:01:02,250 --> 00:01:05,000\r\n\
Line one\\NLine two\r\n";

const EPISODE_VTT: &str = "WEBVTT - episode 1\n\
\n\
NOTE translator credits\n\
made by hand\n\
\n\
STYLE\n\
::cue { color: yellow }\n\
\n\
intro\n\
00:01.000 --> 00:02.500 align:start\n\
<v Narrator>Hello&nbsp;there</v>\n\
\n\
1:00:00.000 --> 1:00:02.000\n\
An hour in\n";

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_srt_movie() {
    let cues = parse(MOVIE_SRT, None);
    assert_eq!(cues.len(), 3);

    assert_eq!(cues[0], SubtitleCue::new(1.0, 3.5, "Previously..."));
    assert_eq!(cues[1].text, "Where were you?\nI was here.");
    assert_eq!(cues[2].start, 62.25);
    assert_eq!(cues[2].text, "Line one\nLine two");
}

#[test]
fn test_parse_vtt_episode() {
    assert_eq!(detect_format(EPISODE_VTT), SubFormat::WebVtt);

    let cues = parse(EPISODE_VTT, None);
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0], SubtitleCue::new(1.0, 2.5, "Hello there"));
    assert_eq!(cues[1].start, 3600.0);
    assert_eq!(cues[1].text, "An hour in");
}

#[test]
fn test_cues_come_back_sorted() {
    let srt = "2\n00:00:10,000 --> 00:00:11,000\nlater\n\n1\n00:00:01,000 --> 00:00:02,000\nearlier\n";
    let cues = parse(srt, Some(SubFormat::Srt));
    let starts: Vec<f64> = cues.iter().map(|c| c.start).collect();
    assert_eq!(starts, vec![1.0, 10.0]);
}

#[test]
fn test_malformed_blocks_are_skipped() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nkept\n\n\
               2\nnot a timing line\nlost\n\n\
               3\n00:00:05,000 --> 00:00:04,000\nbackwards\n\n\
               4\n00:00:06,000 --> 00:00:07,000\n<i></i>\n";
    let cues = parse(srt, None);
    assert_eq!(cues, vec![SubtitleCue::new(1.0, 2.0, "kept")]);
}

#[test]
fn test_garbage_yields_nothing() {
    assert!(parse("", None).is_empty());
    assert!(parse("just some prose\nwith no timings", None).is_empty());
    assert!(parse("WEBVTT\n\n", None).is_empty());
}

#[test]
fn test_oversized_vtt_hours_are_skipped() {
    let vtt = "WEBVTT\n\n\
               99999999999999999:00:00.000 --> 99999999999999999:00:01.000\nhuge\n\n\
               00:01.000 --> 00:02.000\nkept\n";
    let cues = parse(vtt, None);
    assert_eq!(cues, vec![SubtitleCue::new(1.0, 2.0, "kept")]);
}

#[test]
fn test_format_hint_overrides_detection() {
    // A VTT body without the header only parses when the caller says so
    let body = "00:00:01.000 --> 00:00:02.000\nhinted\n";
    assert!(parse(body, None).is_empty());
    assert_eq!(parse(body, Some(SubFormat::WebVtt)).len(), 1);
}

#[test]
fn test_clean_text() {
    assert_eq!(clean_text("  <font color=\"red\">Hi</font>   there  "), "Hi there");
    assert_eq!(clean_text("{\\i1}a\\hb{\\i0}"), "a b");
    assert_eq!(clean_text("\n\n<br>\n"), "");
}

// =============================================================================
// Active text
// =============================================================================

#[test]
fn test_active_text_with_delay() {
    let cues = parse(MOVIE_SRT, None);

    assert_eq!(active_text(&cues, 2.0, 0), "Previously...");
    assert_eq!(active_text(&cues, 3.75, 0), "");
    // Effective time is position + delay
    assert_eq!(active_text(&cues, 3.75, 500), "Where were you?\nI was here.");
    assert_eq!(active_text(&cues, 4.5, -1000), "Previously...");
}

#[test]
fn test_active_text_boundaries_are_inclusive() {
    let cues = vec![SubtitleCue::new(1.0, 2.0, "a")];
    assert_eq!(active_text(&cues, 1.0, 0), "a");
    assert_eq!(active_text(&cues, 2.0, 0), "a");
    assert_eq!(active_text(&cues, 2.001, 0), "");
}

#[test]
fn test_overlapping_cues_first_wins() {
    let cues = vec![
        SubtitleCue::new(1.0, 5.0, "first"),
        SubtitleCue::new(2.0, 3.0, "second"),
    ];
    assert_eq!(active_text(&cues, 2.5, 0), "first");
}

#[test]
fn test_timeline_reports_changes_only() {
    let mut timeline = SubtitleTimeline::from_cues(parse(MOVIE_SRT, None));

    assert!(timeline.update(1.5, 0));
    assert_eq!(timeline.text(), "Previously...");
    assert!(!timeline.update(2.5, 0));
    assert!(timeline.update(3.8, 0));
    assert_eq!(timeline.text(), "");

    timeline.clear();
    assert!(timeline.is_empty());
    assert!(!timeline.update(1.5, 0));
}
