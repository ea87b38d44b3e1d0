//! Error types for the playback engine
//!
//! Only backend errors that exhaust the failover budget leave the engine;
//! everything here is either absorbed and logged, or returned to a caller
//! that asked for something invalid.

use thiserror::Error;

/// Errors from fetching or decoding a custom subtitle source
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("Subtitle download failed: HTTP {0}")]
    Status(u16),
    #[error("Subtitle request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to read subtitle file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not resolve subtitle file {file_id}: {reason}")]
    Resolve { file_id: String, reason: String },
    #[error("Subtitle source has neither a url nor a file id")]
    NoLocation,
    #[error("Subtitle payload is empty")]
    Empty,
}

/// Errors from the engine's control surface
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Subtitle track {0} does not exist")]
    InvalidSubtitleTrack(i32),
    #[error("Audio track {0} does not exist")]
    InvalidAudioTrack(usize),
    #[error("Player has been torn down")]
    TornDown,
    #[error("No video url to play")]
    NoVideoUrl,
}
