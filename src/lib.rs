//! streamplay - adaptive playback engine
//!
//! Plays a remote video through one of two decoder backends, falling back
//! to the secondary once when the primary rejects the stream, and renders
//! sidecar SRT/WebVTT subtitles on a timeline the user can shift.
//!
//! # Modules
//!
//! - `models` - Cues, tracks, transport snapshot, settings
//! - `subtitle` - Parsing, timeline lookup, payload loading
//! - `player` - State model, failover, seek control, the engine
//! - `config` - Engine timing and subtitle provider settings
//! - `ui` - Terminal preview overlay

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod player;
pub mod subtitle;
pub mod ui;

// Re-export commonly used types
pub use models::{
    BackendKind, ContentFit, EmbeddedTrack, MenuAction, PlaybackSettings, PlayerState,
    SubFormat, SubtitleCue, SubtitlePosition, SubtitleSelection, SubtitleSource,
};

pub use config::{Config, EngineConfig};
pub use error::{EngineError, SubtitleError};
pub use player::{PlaybackEngine, PlaybackHost, PlayerOptions, PlayerSession};
