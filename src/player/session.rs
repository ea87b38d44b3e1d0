//! Async driver around a `PlaybackEngine`
//!
//! The engine itself never touches I/O. A session drains backend events,
//! runs custom subtitle fetches on the tokio runtime and feeds their results
//! back tagged with the generation they were requested under.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::error::SubtitleError;
use crate::player::backend::EventReceiver;
use crate::player::engine::PlaybackEngine;
use crate::subtitle::{LoadedSubtitle, SubtitleLoader};

/// A finished subtitle fetch
#[derive(Debug)]
pub struct SubtitleCompletion {
    pub generation: u64,
    pub result: Result<LoadedSubtitle, SubtitleError>,
}

pub struct PlayerSession {
    engine: PlaybackEngine,
    loader: SubtitleLoader,
    events: EventReceiver,
    completions_tx: mpsc::UnboundedSender<SubtitleCompletion>,
    completions_rx: mpsc::UnboundedReceiver<SubtitleCompletion>,
    fetch: Option<JoinHandle<()>>,
}

impl PlayerSession {
    pub fn new(engine: PlaybackEngine, loader: SubtitleLoader, events: EventReceiver) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            loader,
            events,
            completions_tx,
            completions_rx,
            fetch: None,
        }
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    /// Process everything that is ready and fire due timers.
    ///
    /// Returns the number of events and completions handled. Must run inside
    /// a tokio runtime when custom subtitles are in use.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut handled = 0;

        while let Ok((kind, event)) = self.events.try_recv() {
            self.engine.handle_backend_event(kind, event, now);
            handled += 1;
        }

        while let Ok(done) = self.completions_rx.try_recv() {
            self.engine.on_subtitle_loaded(done.generation, done.result);
            handled += 1;
        }

        self.dispatch_subtitle_request();
        self.engine.tick(now);
        handled
    }

    /// Wait for the in-flight subtitle fetch, then pump
    pub async fn wait_for_subtitles(&mut self, now: Instant) -> usize {
        self.dispatch_subtitle_request();
        if let Some(task) = self.fetch.take() {
            let _ = task.await;
        }
        self.pump(now)
    }

    /// Tear the engine down and stop background work
    pub fn shutdown(&mut self) {
        self.abort_fetch();
        self.engine.teardown();
    }

    fn dispatch_subtitle_request(&mut self) {
        let Some(request) = self.engine.take_subtitle_request() else {
            return;
        };
        // Only the newest selection matters
        self.abort_fetch();

        debug!(generation = request.generation, source = %request.source, "fetching subtitle");
        let loader = self.loader.clone();
        let tx = self.completions_tx.clone();
        self.fetch = Some(tokio::spawn(async move {
            let result = loader.load(&request.source).await;
            let _ = tx.send(SubtitleCompletion {
                generation: request.generation,
                result,
            });
        }));
    }

    fn abort_fetch(&mut self) {
        if let Some(task) = self.fetch.take() {
            task.abort();
        }
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.abort_fetch();
    }
}
