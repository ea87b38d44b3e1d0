//! Headless backend driven by the wall clock
//!
//! Stands in for a real decoder in the terminal preview: reports a fixed
//! duration, advances position in real time and emits progress through the
//! event sink. Can be told to reject streams to exercise failover.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::models::{BackendKind, EmbeddedTrack};
use crate::player::backend::{BackendEvent, BackendFactory, EventSink, PlaybackBackend};

const TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Default)]
struct Transport {
    playing: bool,
    /// Position when `started_at` was last set
    base: f64,
    started_at: Option<Instant>,
    rate: f32,
    ended: bool,
}

impl Transport {
    fn position(&self, duration: f64) -> f64 {
        let elapsed = match self.started_at {
            Some(at) if self.playing => at.elapsed().as_secs_f64() * self.rate as f64,
            _ => 0.0,
        };
        (self.base + elapsed).min(duration)
    }

    fn rebase(&mut self, duration: f64) {
        self.base = self.position(duration);
        self.started_at = self.playing.then(Instant::now);
    }
}

pub struct ClockBackend {
    kind: BackendKind,
    duration: f64,
    reject: bool,
    audio_tracks: Vec<EmbeddedTrack>,
    text_tracks: Vec<EmbeddedTrack>,
    sink: EventSink,
    transport: Arc<Mutex<Transport>>,
    ticker: Option<JoinHandle<()>>,
}

impl ClockBackend {
    pub fn new(kind: BackendKind, duration: f64, sink: EventSink) -> Self {
        Self {
            kind,
            duration,
            reject: false,
            audio_tracks: Vec::new(),
            text_tracks: Vec::new(),
            sink,
            transport: Arc::new(Mutex::new(Transport {
                rate: 1.0,
                ..Default::default()
            })),
            ticker: None,
        }
    }

    /// Fail every load with a decode error
    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    pub fn with_tracks(mut self, audio: Vec<EmbeddedTrack>, text: Vec<EmbeddedTrack>) -> Self {
        self.audio_tracks = audio;
        self.text_tracks = text;
        self
    }

    pub fn position(&self) -> f64 {
        self.transport
            .lock()
            .map(|t| t.position(self.duration))
            .unwrap_or(0.0)
    }

    fn update(&self, f: impl FnOnce(&mut Transport, f64)) {
        if let Ok(mut transport) = self.transport.lock() {
            f(&mut transport, self.duration);
        }
    }

    fn spawn_ticker(&mut self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime, clock backend will not report progress");
            return;
        };

        let kind = self.kind;
        let duration = self.duration;
        let sink = self.sink.clone();
        let transport = Arc::clone(&self.transport);

        self.ticker = Some(handle.spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            loop {
                interval.tick().await;
                let (position, just_ended) = {
                    let Ok(mut t) = transport.lock() else {
                        return;
                    };
                    if !t.playing {
                        continue;
                    }
                    let position = t.position(duration);
                    let just_ended = position >= duration && !t.ended;
                    if just_ended {
                        t.ended = true;
                        t.playing = false;
                        t.base = duration;
                        t.started_at = None;
                    }
                    (position, just_ended)
                };

                sink.emit(kind, BackendEvent::Progress { current_time: position });
                if just_ended {
                    sink.emit(kind, BackendEvent::Ended);
                }
            }
        }));
    }
}

impl PlaybackBackend for ClockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn load(&mut self, url: &str) {
        if self.reject {
            self.sink.emit(
                self.kind,
                BackendEvent::Error(format!("{} backend cannot decode {}", self.kind, url)),
            );
            return;
        }

        self.sink.emit(
            self.kind,
            BackendEvent::Loaded {
                duration: self.duration,
                audio_tracks: self.audio_tracks.clone(),
                text_tracks: self.text_tracks.clone(),
            },
        );
        self.spawn_ticker();
    }

    fn play(&mut self) {
        self.update(|t, _| {
            if !t.playing {
                t.playing = true;
                t.ended = false;
                t.started_at = Some(Instant::now());
            }
        });
    }

    fn pause(&mut self) {
        self.update(|t, duration| {
            t.rebase(duration);
            t.playing = false;
            t.started_at = None;
        });
    }

    fn seek(&mut self, seconds: f64) {
        self.update(|t, duration| {
            t.base = seconds.clamp(0.0, duration);
            t.ended = false;
            t.started_at = t.playing.then(Instant::now);
        });
    }

    fn set_audio_track(&mut self, _id: Option<u32>) {}

    fn set_text_track(&mut self, _id: Option<u32>) {}

    fn set_rate(&mut self, rate: f32) {
        self.update(|t, duration| {
            t.rebase(duration);
            t.rate = rate;
        });
    }

    fn set_muted(&mut self, _muted: bool) {}

    fn unload(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Builds clock backends for both kinds
pub struct ClockFactory {
    sink: EventSink,
    duration: f64,
    fail_primary: bool,
    audio_tracks: Vec<EmbeddedTrack>,
    text_tracks: Vec<EmbeddedTrack>,
}

impl ClockFactory {
    pub fn new(sink: EventSink, duration: f64) -> Self {
        Self {
            sink,
            duration,
            fail_primary: false,
            audio_tracks: Vec::new(),
            text_tracks: Vec::new(),
        }
    }

    /// Make the primary backend reject every stream
    pub fn fail_primary(mut self, fail: bool) -> Self {
        self.fail_primary = fail;
        self
    }

    pub fn with_tracks(mut self, audio: Vec<EmbeddedTrack>, text: Vec<EmbeddedTrack>) -> Self {
        self.audio_tracks = audio;
        self.text_tracks = text;
        self
    }
}

impl BackendFactory for ClockFactory {
    fn create(&mut self, kind: BackendKind) -> Box<dyn PlaybackBackend> {
        let backend = ClockBackend::new(kind, self.duration, self.sink.clone())
            .with_tracks(self.audio_tracks.clone(), self.text_tracks.clone());
        if self.fail_primary && kind == BackendKind::Primary {
            Box::new(backend.rejecting())
        } else {
            Box::new(backend)
        }
    }
}
