//! CLI - Command Line Interface for streamplay
//!
//! Scriptable access to the subtitle timeline plus an interactive preview
//! of the playback engine. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Inspect a subtitle file
//! streamplay cues movie.en.srt --json
//!
//! # What is on screen at 1:02:03 with subtitles 500ms late
//! streamplay at movie.en.srt 3723 --delay-ms 500
//!
//! # Drive the engine in the terminal, forcing a failover
//! streamplay preview movie.en.srt movie.es.vtt --fail-primary
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::{SubFormat, SubtitleCue};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Subtitle file parsed to nothing
    NoCues = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// streamplay - adaptive playback engine
#[derive(Parser, Debug)]
#[command(
    name = "streamplay",
    version,
    author = "Gorka & Hermes",
    about = "Adaptive playback engine with subtitle timelines and backend failover",
    after_help = "EXAMPLES:\n\
                  streamplay cues movie.srt                Print parsed cues\n\
                  streamplay at movie.srt 95.5             Active text at 95.5s\n\
                  streamplay preview movie.srt             Interactive preview\n\
                  streamplay preview a.srt --fail-primary  Exercise failover"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a subtitle file and list its cues
    #[command(visible_alias = "c")]
    Cues(CuesCmd),

    /// Show the subtitle text active at a position
    At(AtCmd),

    /// Play through the engine in an interactive terminal overlay
    #[command(visible_alias = "p")]
    Preview(PreviewCmd),
}

/// Subtitle format override
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Srt,
    Vtt,
}

impl From<FormatArg> for SubFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Srt => SubFormat::Srt,
            FormatArg::Vtt => SubFormat::WebVtt,
        }
    }
}

#[derive(Args, Debug)]
pub struct CuesCmd {
    /// Subtitle file (.srt or .vtt)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Force a format instead of detecting it
    #[arg(long, short = 'f', value_enum)]
    pub format: Option<FormatArg>,

    /// Only print the first N cues
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct AtCmd {
    /// Subtitle file (.srt or .vtt)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Playback position in seconds, or HH:MM:SS / MM:SS
    #[arg(required = true, allow_hyphen_values = true)]
    pub position: String,

    /// Subtitle delay in milliseconds
    #[arg(long, short = 'd', default_value_t = 0, allow_hyphen_values = true)]
    pub delay_ms: i64,

    /// Force a format instead of detecting it
    #[arg(long, short = 'f', value_enum)]
    pub format: Option<FormatArg>,
}

impl AtCmd {
    /// Parse the position argument into seconds
    pub fn parse_position(&self) -> Option<f64> {
        parse_position(&self.position)
    }
}

#[derive(Args, Debug)]
pub struct PreviewCmd {
    /// Custom subtitle files offered in the subtitle menu
    pub files: Vec<PathBuf>,

    /// Simulated video duration in seconds
    #[arg(long, default_value_t = 600.0)]
    pub duration: f64,

    /// Resume position as a fraction (0.0 - 1.0)
    #[arg(long, short = 's')]
    pub start: Option<f64>,

    /// Make the primary backend reject the stream
    #[arg(long)]
    pub fail_primary: bool,

    /// Title shown in the overlay
    #[arg(long, short = 't', default_value = "Preview")]
    pub title: String,

    /// Video url handed to the backend
    #[arg(long, default_value = "clock://preview")]
    pub url: String,
}

impl PreviewCmd {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err("Duration must be a positive number of seconds");
        }
        if let Some(start) = self.start {
            if !(0.0..=1.0).contains(&start) {
                return Err("Start must be a fraction between 0 and 1");
            }
        }
        Ok(())
    }
}

/// Parse seconds (`95.5`) or a timestamp (`1:02:03`, `02:03.5`)
pub fn parse_position(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        return (secs.is_finite() && secs >= 0.0).then_some(secs);
    }

    let parts: Vec<&str> = s.split(':').collect();
    let seconds: f64 = parts.last()?.parse().ok()?;
    if !(0.0..60.0).contains(&seconds) {
        return None;
    }
    match parts.len() {
        2 => {
            let mins: u64 = parts[0].parse().ok()?;
            Some(mins as f64 * 60.0 + seconds)
        }
        3 => {
            let hours: u64 = parts[0].parse().ok()?;
            let mins: u64 = parts[1].parse().ok()?;
            Some(hours as f64 * 3600.0 + mins as f64 * 60.0 + seconds)
        }
        _ => None,
    }
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Parsed subtitle file
#[derive(Debug, Serialize, Deserialize)]
pub struct CuesResponse {
    pub file: String,
    pub format: SubFormat,
    pub count: usize,
    pub cues: Vec<SubtitleCue>,
}

/// Active text lookup
#[derive(Debug, Serialize, Deserialize)]
pub struct AtResponse {
    pub position: f64,
    pub delay_ms: i64,
    pub text: String,
}

/// Summary printed when the preview closes
#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewSummary {
    pub title: String,
    pub progress: f64,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
