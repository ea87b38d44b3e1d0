//! Seek and drag choreography
//!
//! A seek pauses the backend, issues the native seek and opens a bounded
//! settle window. Some backends never confirm seek completion, so the
//! window closes on a timer and restores the pre-seek play state.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::player::backend::PlaybackBackend;
use crate::player::state::PlayerStateModel;
use crate::player::timers::{TimerKind, Timers};

#[derive(Debug, Clone)]
pub struct SeekController {
    settle: Duration,
    /// Play state to restore when the current seek settles
    resume_playing: Option<bool>,
}

impl SeekController {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            resume_playing: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.resume_playing.is_some()
    }

    /// Play state the pending seek will restore
    pub fn resume_intent(&self) -> Option<bool> {
        self.resume_playing
    }

    /// Change what happens when the pending seek settles
    pub fn set_resume(&mut self, playing: bool) {
        if let Some(resume) = self.resume_playing.as_mut() {
            *resume = playing;
        }
    }

    /// Seek to `target` seconds; a no-op until the duration is known
    pub fn seek_to(
        &mut self,
        target: f64,
        state: &mut PlayerStateModel,
        backend: &mut dyn PlaybackBackend,
        timers: &mut Timers,
        now: Instant,
    ) -> bool {
        let duration = state.get().duration;
        if duration <= 0.0 || !target.is_finite() {
            debug!(target, duration, "seek ignored, duration unknown");
            return false;
        }
        let target = target.clamp(0.0, duration);

        // Back-to-back seeks resume to the state before the first one
        let was_playing = *self
            .resume_playing
            .get_or_insert(state.get().is_playing);

        backend.pause();
        backend.seek(target);
        state.set_playing(false);
        state.begin_seek(target);
        timers.cancel(TimerKind::BufferingIndicator);
        timers.schedule(TimerKind::SeekSettle, now + self.settle);

        debug!(target, was_playing, "seek issued");
        true
    }

    /// Close the settle window and restore the pre-seek play state
    pub fn settle(&mut self, state: &mut PlayerStateModel, backend: &mut dyn PlaybackBackend) {
        state.end_seek();
        if self.resume_playing.take() == Some(true) {
            backend.play();
            state.set_playing(true);
        }
    }

    /// Slider moved: only the drag position changes, no backend call
    pub fn on_slider_change(&mut self, fraction: f64, state: &mut PlayerStateModel, timers: &mut Timers) {
        let duration = state.get().duration;
        if duration <= 0.0 {
            return;
        }
        // A drag takes over from a seek that has not settled yet
        timers.cancel(TimerKind::SeekSettle);
        state.drag_to(fraction.clamp(0.0, 1.0) * duration);
    }

    /// Slider released: seek to where the drag ended
    pub fn on_slider_release(
        &mut self,
        fraction: f64,
        state: &mut PlayerStateModel,
        backend: &mut dyn PlaybackBackend,
        timers: &mut Timers,
        now: Instant,
    ) -> bool {
        state.end_drag();
        let target = fraction.clamp(0.0, 1.0) * state.get().duration;
        self.seek_to(target, state, backend, timers, now)
    }

    /// Forget any pending resume (new backend, new video)
    pub fn reset(&mut self) {
        self.resume_playing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BackendKind;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl PlaybackBackend for Recorder {
        fn kind(&self) -> BackendKind {
            BackendKind::Primary
        }
        fn load(&mut self, url: &str) {
            self.calls.push(format!("load {}", url));
        }
        fn play(&mut self) {
            self.calls.push("play".into());
        }
        fn pause(&mut self) {
            self.calls.push("pause".into());
        }
        fn seek(&mut self, seconds: f64) {
            self.calls.push(format!("seek {}", seconds));
        }
        fn set_audio_track(&mut self, _id: Option<u32>) {}
        fn set_text_track(&mut self, _id: Option<u32>) {}
        fn set_rate(&mut self, _rate: f32) {}
        fn set_muted(&mut self, _muted: bool) {}
    }

    fn playing_state(duration: f64) -> PlayerStateModel {
        let mut state = PlayerStateModel::new();
        state.set_duration(duration);
        state.set_ready(true);
        state.set_playing(true);
        state
    }

    #[test]
    fn test_seek_pauses_then_resumes_on_settle() {
        let mut seek = SeekController::new(Duration::from_millis(300));
        let mut state = playing_state(100.0);
        let mut backend = Recorder::default();
        let mut timers = Timers::new();
        let now = Instant::now();

        assert!(seek.seek_to(40.0, &mut state, &mut backend, &mut timers, now));
        assert!(state.get().is_seeking);
        assert!(!state.get().is_playing);
        assert_eq!(state.get().current_time, 40.0);
        assert_eq!(backend.calls, vec!["pause", "seek 40"]);
        assert_eq!(
            timers.deadline(TimerKind::SeekSettle),
            Some(now + Duration::from_millis(300))
        );

        seek.settle(&mut state, &mut backend);
        assert!(!state.get().is_seeking);
        assert!(state.get().is_playing);
        assert_eq!(backend.calls.last().map(String::as_str), Some("play"));
        assert!(!seek.is_pending());
    }

    #[test]
    fn test_seek_ignored_without_duration() {
        let mut seek = SeekController::new(Duration::from_millis(300));
        let mut state = PlayerStateModel::new();
        let mut backend = Recorder::default();
        let mut timers = Timers::new();

        assert!(!seek.seek_to(10.0, &mut state, &mut backend, &mut timers, Instant::now()));
        assert!(backend.calls.is_empty());
        assert!(!timers.is_scheduled(TimerKind::SeekSettle));
    }

    #[test]
    fn test_back_to_back_seeks_keep_first_play_state() {
        let mut seek = SeekController::new(Duration::from_millis(300));
        let mut state = playing_state(100.0);
        let mut backend = Recorder::default();
        let mut timers = Timers::new();
        let now = Instant::now();

        seek.seek_to(30.0, &mut state, &mut backend, &mut timers, now);
        seek.seek_to(60.0, &mut state, &mut backend, &mut timers, now);
        assert_eq!(state.get().current_time, 60.0);

        seek.settle(&mut state, &mut backend);
        assert!(state.get().is_playing);
    }

    #[test]
    fn test_paused_seek_stays_paused() {
        let mut seek = SeekController::new(Duration::from_millis(300));
        let mut state = playing_state(100.0);
        state.set_playing(false);
        let mut backend = Recorder::default();
        let mut timers = Timers::new();

        seek.seek_to(500.0, &mut state, &mut backend, &mut timers, Instant::now());
        assert_eq!(state.get().current_time, 100.0);

        seek.settle(&mut state, &mut backend);
        assert!(!state.get().is_playing);
        assert!(!backend.calls.contains(&"play".to_string()));
    }

    #[test]
    fn test_drag_then_release() {
        let mut seek = SeekController::new(Duration::from_millis(300));
        let mut state = playing_state(200.0);
        let mut backend = Recorder::default();
        let mut timers = Timers::new();

        seek.on_slider_change(0.25, &mut state, &mut timers);
        assert!(state.get().is_dragging);
        assert_eq!(state.get().displayed_time(), 50.0);
        assert!(backend.calls.is_empty());

        assert!(seek.on_slider_release(0.5, &mut state, &mut backend, &mut timers, Instant::now()));
        assert!(!state.get().is_dragging);
        assert!(state.get().is_seeking);
        assert_eq!(state.get().current_time, 100.0);
    }

    #[test]
    fn test_set_resume_flips_pending_intent() {
        let mut seek = SeekController::new(Duration::from_millis(300));
        let mut state = playing_state(100.0);
        let mut backend = Recorder::default();
        let mut timers = Timers::new();

        seek.set_resume(true);
        assert!(!seek.is_pending());

        seek.seek_to(10.0, &mut state, &mut backend, &mut timers, Instant::now());
        seek.set_resume(false);
        seek.settle(&mut state, &mut backend);
        assert!(!state.get().is_playing);
    }
}
