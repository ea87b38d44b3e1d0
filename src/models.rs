//! Data structures and types for streamplay
//!
//! Contains all shared models used across the engine organized by domain:
//! - **Subtitles**: parsed cues, sidecar formats, host-supplied sources
//! - **Tracks**: backend-reported tracks, selections, menu actions
//! - **Player**: transport snapshot, user playback settings
//! - **Backend**: which decoder is active for the current attempt

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Subtitle Models
// =============================================================================

/// A single timed subtitle entry, times in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SubtitleCue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Whether `time` falls inside `[start, end]`
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }
}

impl fmt::Display for SubtitleCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} --> {}] {}",
            format_timestamp(self.start),
            format_timestamp(self.end),
            self.text.replace('\n', " / ")
        )
    }
}

/// Sidecar subtitle text formats understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubFormat {
    Srt,
    #[serde(rename = "vtt")]
    WebVtt,
}

impl SubFormat {
    /// Parse format from a file extension ("srt", "vtt")
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "srt" => Some(SubFormat::Srt),
            "vtt" | "webvtt" => Some(SubFormat::WebVtt),
            _ => None,
        }
    }

    /// Guess the format from a filename or URL path
    pub fn from_filename(name: &str) -> Option<Self> {
        let path = name.split(['?', '#']).next().unwrap_or(name);
        path.rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SubFormat::Srt => "srt",
            SubFormat::WebVtt => "vtt",
        }
    }
}

impl fmt::Display for SubFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubFormat::Srt => write!(f, "SRT"),
            SubFormat::WebVtt => write!(f, "WebVTT"),
        }
    }
}

/// Externally fetched subtitle source supplied by the host
///
/// Its position in the host's list is its logical track index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSource {
    pub language: String,
    pub label: String,
    /// Direct download location, may be empty when `file_id` is set
    #[serde(default)]
    pub url: String,
    /// Provider file id, resolved through a `SubtitleFetcher`
    #[serde(default)]
    pub file_id: Option<String>,
}

impl SubtitleSource {
    pub fn new(language: impl Into<String>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            label: label.into(),
            url: url.into(),
            file_id: None,
        }
    }

    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }

    /// Stable key for caching the downloaded payload
    pub fn cache_key(&self) -> String {
        match &self.file_id {
            Some(id) => format!("{}_{}", self.language, id),
            None => format!("{}_{}", self.language, self.url),
        }
    }
}

impl fmt::Display for SubtitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.language)
        } else {
            write!(f, "{} ({})", self.label, self.language)
        }
    }
}

// =============================================================================
// Track Models
// =============================================================================

/// Kind of an embedded track reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Text,
}

/// Audio or text track reported by the active backend from the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedTrack {
    pub id: u32,
    pub kind: TrackKind,
    pub label: Option<String>,
    pub language: Option<String>,
}

impl EmbeddedTrack {
    pub fn audio(id: u32, label: Option<&str>, language: Option<&str>) -> Self {
        Self {
            id,
            kind: TrackKind::Audio,
            label: label.map(str::to_string),
            language: language.map(str::to_string),
        }
    }

    pub fn text(id: u32, label: Option<&str>, language: Option<&str>) -> Self {
        Self {
            id,
            kind: TrackKind::Text,
            label: label.map(str::to_string),
            language: language.map(str::to_string),
        }
    }

    /// Label for menus, falling back to language then to "Track N"
    pub fn display_label(&self) -> String {
        match (&self.label, &self.language) {
            (Some(label), Some(lang)) if !label.is_empty() && !lang.is_empty() => {
                format!("{} ({})", label, lang)
            }
            (Some(label), _) if !label.is_empty() => label.clone(),
            (_, Some(lang)) if !lang.is_empty() => lang.clone(),
            _ => format!("Track {}", self.id + 1),
        }
    }
}

/// Which subtitle mechanism is active; at most one by construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "index")]
pub enum SubtitleSelection {
    #[default]
    Off,
    /// Host-supplied source at this position, rendered by the timeline
    Custom(usize),
    /// Backend track id, rendered by the backend itself
    Embedded(u32),
}

/// Menu entry handed to the host UI, keyed by a stable id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuAction {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.selected { "●" } else { "○" };
        write!(f, "{} {}", mark, self.label)
    }
}

// =============================================================================
// Player Models
// =============================================================================

/// Backend-agnostic transport snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub is_ready: bool,
    pub is_playing: bool,
    pub is_paused: bool,
    pub is_buffering: bool,
    pub is_dragging: bool,
    pub is_seeking: bool,
    pub current_time: f64,
    pub duration: f64,
    pub drag_position: f64,
}

impl PlayerState {
    /// Time to show on the scrubber: the drag position wins while dragging
    pub fn displayed_time(&self) -> f64 {
        if self.is_dragging {
            self.drag_position
        } else {
            self.current_time
        }
    }

    /// Playback position as a fraction of duration (0 when unknown)
    pub fn progress_fraction(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn format_position(&self) -> String {
        format_clock(self.displayed_time())
    }

    pub fn format_duration(&self) -> String {
        format_clock(self.duration)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if !self.is_ready {
            "Loading..."
        } else if self.is_seeking {
            "Seeking"
        } else if self.is_buffering {
            "Buffering..."
        } else if self.is_playing {
            "▶ Playing"
        } else {
            "⏸ Paused"
        };
        write!(
            f,
            "{} {} / {}",
            state,
            self.format_position(),
            self.format_duration()
        )
    }
}

/// How video frames are fitted into the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFit {
    #[default]
    Contain,
    Cover,
    Fill,
}

impl ContentFit {
    pub fn next(self) -> Self {
        match self {
            ContentFit::Contain => ContentFit::Cover,
            ContentFit::Cover => ContentFit::Fill,
            ContentFit::Fill => ContentFit::Contain,
        }
    }
}

impl fmt::Display for ContentFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentFit::Contain => write!(f, "Contain"),
            ContentFit::Cover => write!(f, "Cover"),
            ContentFit::Fill => write!(f, "Fill"),
        }
    }
}

/// Vertical placement of rendered subtitle text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitlePosition {
    #[default]
    Bottom,
    Middle,
    Top,
}

impl SubtitlePosition {
    pub fn next(self) -> Self {
        match self {
            SubtitlePosition::Bottom => SubtitlePosition::Middle,
            SubtitlePosition::Middle => SubtitlePosition::Top,
            SubtitlePosition::Top => SubtitlePosition::Bottom,
        }
    }
}

/// User-adjustable settings, independent of the active backend
///
/// Survive a failover, reset when a new video is loaded. Track selections
/// live with the `TrackCatalogue`, which owns their routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub playback_speed: f32,
    pub is_muted: bool,
    pub subtitle_position: SubtitlePosition,
    pub subtitle_delay_ms: i64,
    pub content_fit: ContentFit,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            playback_speed: 1.0,
            is_muted: false,
            subtitle_position: SubtitlePosition::default(),
            subtitle_delay_ms: 0,
            content_fit: ContentFit::default(),
        }
    }
}

// =============================================================================
// Backend Models
// =============================================================================

/// The two decoding backends the engine can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Platform-preferred decoder
    Primary,
    /// Cross-platform fallback decoder
    Secondary,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Primary => write!(f, "primary"),
            BackendKind::Secondary => write!(f, "secondary"),
        }
    }
}

/// One playback attempt against a video url
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSession {
    pub id: Uuid,
    pub kind: BackendKind,
    pub failed_once: bool,
    pub video_url: String,
}

impl BackendSession {
    pub fn new(video_url: impl Into<String>, kind: BackendKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            failed_once: false,
            video_url: video_url.into(),
        }
    }
}

// =============================================================================
// Formatting helpers
// =============================================================================

/// Format seconds as HH:MM:SS or MM:SS
pub fn format_clock(seconds: f64) -> String {
    let total_secs = seconds.max(0.0) as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Format seconds as HH:MM:SS.mmm
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}
