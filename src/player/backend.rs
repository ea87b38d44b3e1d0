//! Decoder backends behind one control surface
//!
//! The engine only ever talks to `ActiveBackend`: a kind tag plus the boxed
//! implementation the factory produced for it. Backends report back through
//! an `EventSink`, tagging every event with their kind so the engine can
//! drop late events from a backend it already replaced.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::models::{BackendKind, ContentFit, EmbeddedTrack};

/// Host platform; decides the preferred backend and whether failover exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Native decoder with a cross-platform fallback
    #[default]
    Native,
    /// Single embeddable player, no fallback path
    Web,
}

impl Platform {
    pub fn preferred_backend(&self) -> BackendKind {
        BackendKind::Primary
    }

    pub fn supports_failover(&self) -> bool {
        matches!(self, Platform::Native)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "native" => Some(Platform::Native),
            "web" => Some(Platform::Web),
            _ => None,
        }
    }
}

/// Events a backend reports about the stream it is playing
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Stream opened; duration and container tracks are known
    Loaded {
        duration: f64,
        audio_tracks: Vec<EmbeddedTrack>,
        text_tracks: Vec<EmbeddedTrack>,
    },
    Progress { current_time: f64 },
    Buffering(bool),
    Ended,
    /// Unrecoverable playback error (codec rejected, stream unreadable)
    Error(String),
}

/// Capability set every decoder backend provides
pub trait PlaybackBackend {
    fn kind(&self) -> BackendKind;

    /// Open a stream; completion is reported as `BackendEvent::Loaded`
    fn load(&mut self, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);

    fn set_audio_track(&mut self, id: Option<u32>);
    fn set_text_track(&mut self, id: Option<u32>);

    fn set_rate(&mut self, rate: f32);
    fn set_muted(&mut self, muted: bool);

    fn set_content_fit(&mut self, _fit: ContentFit) {}

    /// Release decoder resources before the backend is dropped
    fn unload(&mut self) {}
}

/// Builds a concrete backend for a kind
pub trait BackendFactory {
    fn create(&mut self, kind: BackendKind) -> Box<dyn PlaybackBackend>;
}

/// The backend currently driving playback
pub struct ActiveBackend {
    kind: BackendKind,
    inner: Box<dyn PlaybackBackend>,
}

impl ActiveBackend {
    pub fn new(kind: BackendKind, factory: &mut dyn BackendFactory) -> Self {
        Self {
            kind,
            inner: factory.create(kind),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn get_mut(&mut self) -> &mut dyn PlaybackBackend {
        self.inner.as_mut()
    }
}

impl Drop for ActiveBackend {
    fn drop(&mut self) {
        self.inner.unload();
    }
}

// =============================================================================
// Event channel
// =============================================================================

pub type TaggedEvent = (BackendKind, BackendEvent);

/// Sending half handed to backends
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl EventSink {
    /// Report an event; dropped silently once the session is gone
    pub fn emit(&self, kind: BackendKind, event: BackendEvent) {
        let _ = self.tx.send((kind, event));
    }
}

pub type EventReceiver = mpsc::UnboundedReceiver<TaggedEvent>;

pub fn event_channel() -> (EventSink, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_capabilities() {
        assert!(Platform::Native.supports_failover());
        assert!(!Platform::Web.supports_failover());
        assert_eq!(Platform::from_name(" WEB "), Some(Platform::Web));
        assert_eq!(Platform::from_name("tv"), None);
    }

    #[test]
    fn test_event_sink_survives_closed_receiver() {
        let (sink, rx) = event_channel();
        drop(rx);
        sink.emit(BackendKind::Primary, BackendEvent::Ended);
    }
}
