//! Player state model
//!
//! Single source of truth for transport state, written by whichever backend
//! is active and by the seek controller. Guards the two ordering rules:
//! backend progress never overrides a drag or a seek in flight, and
//! buffering reports are swallowed while a seek settles.

use tracing::trace;

use crate::models::PlayerState;

#[derive(Debug, Default, Clone)]
pub struct PlayerStateModel {
    state: PlayerState,
}

impl PlayerStateModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> PlayerState {
        self.state.clone()
    }

    pub fn get(&self) -> &PlayerState {
        &self.state
    }

    /// Back to a fresh, not-yet-loaded state
    pub fn reset(&mut self) {
        self.state = PlayerState::default();
    }

    // -------------------------------------------------------------------------
    // Backend-driven writes
    // -------------------------------------------------------------------------

    pub fn set_ready(&mut self, ready: bool) {
        self.state.is_ready = ready;
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.state.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.state.current_time = self.clamp(self.state.current_time);
        self.state.drag_position = self.clamp(self.state.drag_position);
    }

    /// Progress from the backend; ignored while dragging or seeking
    pub fn apply_progress(&mut self, current_time: f64) -> bool {
        if self.state.is_dragging || self.state.is_seeking {
            trace!(current_time, "progress superseded by drag/seek");
            return false;
        }
        self.state.current_time = self.clamp(current_time);
        true
    }

    /// Buffering report; suppressed during the seek window
    pub fn set_buffering(&mut self, buffering: bool) -> bool {
        if self.state.is_seeking {
            return false;
        }
        self.state.is_buffering = buffering;
        true
    }

    // -------------------------------------------------------------------------
    // UI / controller-driven writes
    // -------------------------------------------------------------------------

    pub fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
        self.state.is_paused = !playing;
    }

    /// Position set by a seek; bypasses the progress guard
    pub fn set_current_time(&mut self, time: f64) {
        self.state.current_time = self.clamp(time);
    }

    /// Start or continue a drag at `position` seconds
    pub fn drag_to(&mut self, position: f64) {
        self.state.is_seeking = false;
        self.state.is_dragging = true;
        self.state.drag_position = self.clamp(position);
    }

    /// End the drag phase, returning where it stopped
    pub fn end_drag(&mut self) -> f64 {
        self.state.is_dragging = false;
        self.state.drag_position
    }

    pub fn begin_seek(&mut self, target: f64) {
        self.state.is_dragging = false;
        self.state.is_seeking = true;
        self.state.is_buffering = false;
        self.state.current_time = self.clamp(target);
    }

    pub fn end_seek(&mut self) {
        self.state.is_seeking = false;
    }

    pub fn clamp(&self, time: f64) -> f64 {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        if self.state.duration > 0.0 {
            time.min(self.state.duration)
        } else {
            time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(duration: f64) -> PlayerStateModel {
        let mut model = PlayerStateModel::new();
        model.set_ready(true);
        model.set_duration(duration);
        model
    }

    #[test]
    fn test_progress_clamped_to_duration() {
        let mut model = loaded(100.0);
        model.apply_progress(150.0);
        assert_eq!(model.get().current_time, 100.0);
        model.apply_progress(-3.0);
        assert_eq!(model.get().current_time, 0.0);
    }

    #[test]
    fn test_progress_ignored_while_dragging() {
        let mut model = loaded(100.0);
        model.apply_progress(10.0);
        model.drag_to(60.0);

        assert!(!model.apply_progress(12.0));
        assert_eq!(model.get().displayed_time(), 60.0);
        assert_eq!(model.get().current_time, 10.0);
    }

    #[test]
    fn test_drag_and_seek_are_exclusive() {
        let mut model = loaded(100.0);
        model.drag_to(30.0);
        assert!(model.get().is_dragging);
        model.begin_seek(30.0);
        assert!(!model.get().is_dragging);
        assert!(model.get().is_seeking);
        model.drag_to(40.0);
        assert!(model.get().is_dragging);
        assert!(!model.get().is_seeking);
    }

    #[test]
    fn test_buffering_suppressed_during_seek() {
        let mut model = loaded(100.0);
        model.begin_seek(50.0);
        assert!(!model.set_buffering(true));
        assert!(!model.get().is_buffering);
        model.end_seek();
        assert!(model.set_buffering(true));
        assert!(model.get().is_buffering);
    }

    #[test]
    fn test_duration_unknown_does_not_clamp_upper() {
        let mut model = PlayerStateModel::new();
        model.set_current_time(42.0);
        assert_eq!(model.get().current_time, 42.0);
        model.set_duration(30.0);
        assert_eq!(model.get().current_time, 30.0);
    }
}
