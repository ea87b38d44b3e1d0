//! Subtitle timeline engine
//!
//! - Parser: SRT / WebVTT payloads into sorted, cleaned cues
//! - Timeline: active-cue lookup with operator delay
//! - Loader: fetch custom sources over HTTP or from disk

pub mod loader;
pub mod parser;
pub mod timeline;

pub use loader::{HttpSubtitleFetcher, LoadedSubtitle, ResolvedSubtitle, SubtitleFetcher, SubtitleLoader};
pub use parser::{clean_text, detect_format, parse};
pub use timeline::{active_text, SubtitleTimeline};
