//! Playback engine: the control surface the host renders against
//!
//! Owns the state model, track catalogue, subtitle timeline, timers and the
//! failover machine, and routes every intent to whichever backend is active.
//! Single-threaded: the driver feeds backend events, subtitle completions
//! and clock ticks in one at a time.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, SubtitleError};
use crate::models::{
    BackendKind, BackendSession, ContentFit, EmbeddedTrack, MenuAction, PlaybackSettings,
    PlayerState, SubtitlePosition, SubtitleSelection, SubtitleSource,
};
use crate::player::backend::{ActiveBackend, BackendEvent, BackendFactory};
use crate::player::failover::{FailoverMachine, FailoverOutcome, MachineState};
use crate::player::seek::SeekController;
use crate::player::state::PlayerStateModel;
use crate::player::timers::{TimerKind, Timers};
use crate::player::tracks::{SubtitleRoute, TrackCatalogue};
use crate::subtitle::{self, LoadedSubtitle, SubtitleTimeline};

const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;

/// Callbacks into the host application
pub trait PlaybackHost {
    /// Periodic progress snapshot
    fn on_progress(&mut self, _fraction: f64) {}
    /// Final progress when the player goes away; fires once per session
    fn on_exit_with_progress(&mut self, fraction: f64);
    /// Playback failed on every backend available
    fn on_unrecoverable_error(&mut self, message: &str);
}

/// What the host hands over when opening the player
#[derive(Debug, Clone, Default)]
pub struct PlayerOptions {
    pub video_url: String,
    pub title: String,
    /// Resume position as a fraction of the duration
    pub initial_progress: Option<f64>,
    pub subtitle_sources: Vec<SubtitleSource>,
}

impl PlayerOptions {
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn initial_progress(mut self, fraction: f64) -> Self {
        self.initial_progress = Some(fraction);
        self
    }

    pub fn subtitles(mut self, sources: Vec<SubtitleSource>) -> Self {
        self.subtitle_sources = sources;
        self
    }
}

/// A custom subtitle fetch the driver must perform
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleRequest {
    /// Must be echoed back; results for an older generation are dropped
    pub generation: u64,
    pub index: usize,
    pub source: SubtitleSource,
}

/// Position to apply once the next backend reports it is loaded
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingSeek {
    Fraction(f64),
    Seconds(f64),
}

pub struct PlaybackEngine {
    config: EngineConfig,
    title: String,
    initial_progress: Option<f64>,
    machine: FailoverMachine,
    backend: ActiveBackend,
    factory: Box<dyn BackendFactory>,
    host: Box<dyn PlaybackHost>,
    state: PlayerStateModel,
    tracks: TrackCatalogue,
    settings: PlaybackSettings,
    seek: SeekController,
    timers: Timers,
    timeline: SubtitleTimeline,
    subtitle_generation: u64,
    subtitle_request: Option<SubtitleRequest>,
    pending_seek: Option<PendingSeek>,
    /// Duration of the current video as last reported by any backend
    known_duration: f64,
    controls_visible: bool,
    buffering_visible: bool,
    error: Option<String>,
    torn_down: bool,
}

impl PlaybackEngine {
    pub fn new(
        options: PlayerOptions,
        config: EngineConfig,
        mut factory: Box<dyn BackendFactory>,
        host: Box<dyn PlaybackHost>,
        now: Instant,
    ) -> Self {
        let machine = FailoverMachine::new(options.video_url.as_str(), config.platform);
        let backend = ActiveBackend::new(machine.session().kind, factory.as_mut());
        let initial_progress = sanitize_fraction(options.initial_progress);

        let mut engine = Self {
            seek: SeekController::new(config.seek_settle()),
            config,
            title: options.title,
            initial_progress,
            machine,
            backend,
            factory,
            host,
            state: PlayerStateModel::new(),
            tracks: TrackCatalogue::new(options.subtitle_sources),
            settings: PlaybackSettings::default(),
            timers: Timers::new(),
            timeline: SubtitleTimeline::new(),
            subtitle_generation: 0,
            subtitle_request: None,
            pending_seek: initial_progress.map(PendingSeek::Fraction),
            known_duration: 0.0,
            controls_visible: true,
            buffering_visible: false,
            error: None,
            torn_down: false,
        };
        engine.start_backend();
        engine.schedule_progress(now);
        engine
    }

    // =========================================================================
    // Snapshot accessors
    // =========================================================================

    pub fn state(&self) -> &PlayerState {
        self.state.get()
    }

    pub fn snapshot(&self) -> PlayerState {
        self.state.snapshot()
    }

    pub fn machine_state(&self) -> MachineState {
        self.machine.state()
    }

    pub fn session(&self) -> &BackendSession {
        self.machine.session()
    }

    pub fn active_backend(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn tracks(&self) -> &TrackCatalogue {
        &self.tracks
    }

    pub fn subtitle_selection(&self) -> SubtitleSelection {
        self.tracks.selection()
    }

    pub fn subtitle_actions(&self) -> Vec<MenuAction> {
        self.tracks.subtitle_actions()
    }

    pub fn audio_actions(&self) -> Vec<MenuAction> {
        self.tracks.audio_actions()
    }

    pub fn timeline(&self) -> &SubtitleTimeline {
        &self.timeline
    }

    /// Custom subtitle text to draw right now
    pub fn subtitle_text(&self) -> &str {
        self.timeline.text()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn buffering_visible(&self) -> bool {
        self.buffering_visible
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn subtitle_generation(&self) -> u64 {
        self.subtitle_generation
    }

    /// When the driver should call `tick` next
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn timer_scheduled(&self, kind: TimerKind) -> bool {
        self.timers.is_scheduled(kind)
    }

    // =========================================================================
    // Backend events
    // =========================================================================

    pub fn handle_backend_event(&mut self, kind: BackendKind, event: BackendEvent, now: Instant) {
        if self.torn_down {
            return;
        }
        if !self.machine.accepts(kind) {
            debug!(backend = %kind, ?event, "dropping event from inactive backend");
            return;
        }

        match event {
            BackendEvent::Loaded {
                duration,
                audio_tracks,
                text_tracks,
            } => self.on_loaded(duration, audio_tracks, text_tracks, now),
            BackendEvent::Progress { current_time } => {
                if self.state.apply_progress(current_time) {
                    self.refresh_subtitle();
                }
            }
            BackendEvent::Buffering(buffering) => self.on_buffering(buffering, now),
            BackendEvent::Ended => {
                info!("playback ended");
                self.state.set_playing(false);
                self.timers.cancel(TimerKind::ControlsHide);
                self.controls_visible = true;
                self.emit_progress();
            }
            BackendEvent::Error(message) => self.on_backend_error(&message),
        }
    }

    fn on_loaded(
        &mut self,
        duration: f64,
        audio_tracks: Vec<EmbeddedTrack>,
        text_tracks: Vec<EmbeddedTrack>,
        now: Instant,
    ) {
        let previous = (self.tracks.selected_audio(), self.tracks.selected_text_track());
        self.tracks.set_embedded(audio_tracks, text_tracks);
        if !self.machine.on_loaded() {
            // Track list refresh from an already playing backend
            let audio = self.tracks.selected_audio();
            let text = self.tracks.selected_text_track();
            let backend = self.backend.get_mut();
            if audio != previous.0 {
                backend.set_audio_track(audio);
            }
            if text != previous.1 {
                backend.set_text_track(text);
            }
            return;
        }

        self.state.set_duration(duration);
        if duration > 0.0 {
            self.known_duration = duration;
        }
        self.state.set_ready(true);

        let audio = self.tracks.selected_audio();
        let text = self.tracks.selected_text_track();
        let backend = self.backend.get_mut();
        backend.set_audio_track(audio);
        backend.set_text_track(text);
        backend.play();
        self.state.set_playing(true);

        if let Some(pending) = self.pending_seek.take() {
            let target = match pending {
                PendingSeek::Fraction(fraction) => fraction * self.state.get().duration,
                PendingSeek::Seconds(seconds) => seconds,
            };
            info!(target, "resuming position");
            self.seek.seek_to(
                target,
                &mut self.state,
                self.backend.get_mut(),
                &mut self.timers,
                now,
            );
        }

        self.enter_playing(now);
    }

    fn on_buffering(&mut self, buffering: bool, now: Instant) {
        if !self.state.set_buffering(buffering) {
            return;
        }
        if !self.machine.on_buffering(buffering) {
            return;
        }

        if buffering {
            self.timers.schedule(
                TimerKind::BufferingIndicator,
                now + self.config.buffering_debounce(),
            );
        } else {
            self.timers.cancel(TimerKind::BufferingIndicator);
            self.buffering_visible = false;
            self.enter_playing(now);
        }
    }

    fn on_backend_error(&mut self, message: &str) {
        match self.machine.on_error(message) {
            FailoverOutcome::Switch { to } => {
                let resume = self.resume_point();
                self.fail_over(to, resume);
            }
            FailoverOutcome::Terminal { message } => {
                self.stop_transient_timers();
                self.seek.reset();
                self.state.end_seek();
                self.state.set_buffering(false);
                self.state.set_playing(false);
                self.controls_visible = true;
                self.buffering_visible = false;
                self.host.on_unrecoverable_error(&message);
                self.error = Some(message);
            }
            FailoverOutcome::Ignored => {}
        }
    }

    /// Rebuild playback on `to` with the same url and user settings
    fn fail_over(&mut self, to: BackendKind, resume: Option<PendingSeek>) {
        let last_time = self.state.get().current_time;

        self.stop_transient_timers();
        self.seek.reset();
        self.tracks.clear_embedded();
        self.backend = ActiveBackend::new(to, self.factory.as_mut());
        self.pending_seek = resume;

        self.start_backend();
        self.state.set_current_time(last_time);
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Fire due timers and refresh the subtitle text
    pub fn tick(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }

        for kind in self.timers.take_due(now) {
            match kind {
                TimerKind::SeekSettle => {
                    self.seek.settle(&mut self.state, self.backend.get_mut());
                    if !self.state.get().is_buffering && self.machine.on_buffering(false) {
                        self.enter_playing(now);
                    }
                }
                TimerKind::BufferingIndicator => {
                    let state = self.state.get();
                    self.buffering_visible = state.is_buffering && !state.is_seeking;
                }
                TimerKind::ControlsHide => {
                    if self.state.get().is_playing {
                        self.controls_visible = false;
                    }
                }
                TimerKind::ProgressReport => {
                    if self.state.get().duration > 0.0 {
                        self.emit_progress();
                    }
                    self.schedule_progress(now);
                }
            }
        }

        self.refresh_subtitle();
    }

    /// Forward the current progress fraction to the host's sink
    pub fn emit_progress(&mut self) -> f64 {
        let fraction = self.state.get().progress_fraction();
        debug!(fraction, "progress");
        self.host.on_progress(fraction);
        fraction
    }

    fn schedule_progress(&mut self, now: Instant) {
        self.timers
            .schedule(TimerKind::ProgressReport, now + self.config.progress_interval());
    }

    fn enter_playing(&mut self, now: Instant) {
        self.controls_visible = true;
        self.timers
            .schedule(TimerKind::ControlsHide, now + self.config.controls_hide());
    }

    fn stop_transient_timers(&mut self) {
        self.timers.cancel(TimerKind::SeekSettle);
        self.timers.cancel(TimerKind::BufferingIndicator);
        self.timers.cancel(TimerKind::ControlsHide);
    }

    // =========================================================================
    // Transport intents
    // =========================================================================

    pub fn toggle_play_pause(&mut self, now: Instant) {
        // Mid-seek the transport is paused; toggle what the settle restores
        let playing = self
            .seek
            .resume_intent()
            .unwrap_or(self.state.get().is_playing);
        if playing {
            self.pause();
        } else {
            self.play(now);
        }
    }

    pub fn play(&mut self, now: Instant) {
        if !self.can_control() {
            return;
        }
        if self.seek.is_pending() {
            self.seek.set_resume(true);
            return;
        }
        self.backend.get_mut().play();
        self.state.set_playing(true);
        self.enter_playing(now);
    }

    pub fn pause(&mut self) {
        if !self.can_control() {
            return;
        }
        if self.seek.is_pending() {
            self.seek.set_resume(false);
            return;
        }
        self.backend.get_mut().pause();
        self.state.set_playing(false);
        self.timers.cancel(TimerKind::ControlsHide);
        self.controls_visible = true;
    }

    /// Seek to an absolute position; ignored until the duration is known
    pub fn seek_to(&mut self, seconds: f64, now: Instant) -> bool {
        if !self.can_control() {
            return false;
        }
        let issued = self.seek.seek_to(
            seconds,
            &mut self.state,
            self.backend.get_mut(),
            &mut self.timers,
            now,
        );
        if issued {
            self.refresh_subtitle();
            self.show_controls(now);
        }
        issued
    }

    pub fn skip(&mut self, delta: f64, now: Instant) -> bool {
        let target = self.state.get().current_time + delta;
        self.seek_to(target, now)
    }

    pub fn skip_forward(&mut self, now: Instant) -> bool {
        self.skip(self.config.skip_forward_secs, now)
    }

    pub fn skip_back(&mut self, now: Instant) -> bool {
        self.skip(-self.config.skip_back_secs, now)
    }

    pub fn on_slider_change(&mut self, fraction: f64) {
        if !self.can_control() {
            return;
        }
        self.seek
            .on_slider_change(fraction, &mut self.state, &mut self.timers);
        self.refresh_subtitle();
    }

    pub fn on_slider_release(&mut self, fraction: f64, now: Instant) -> bool {
        if !self.can_control() {
            return false;
        }
        let issued = self.seek.on_slider_release(
            fraction,
            &mut self.state,
            self.backend.get_mut(),
            &mut self.timers,
            now,
        );
        self.refresh_subtitle();
        issued
    }

    /// Reveal the controls and restart the auto-hide countdown
    pub fn show_controls(&mut self, now: Instant) {
        self.controls_visible = true;
        if self.state.get().is_playing || self.seek.is_pending() {
            self.timers
                .schedule(TimerKind::ControlsHide, now + self.config.controls_hide());
        }
    }

    fn can_control(&self) -> bool {
        !self.torn_down && !self.machine.is_terminal() && self.state.get().is_ready
    }

    // =========================================================================
    // Tracks
    // =========================================================================

    /// Select a subtitle by logical index (`-1` turns subtitles off)
    pub fn select_subtitle_track(&mut self, logical_index: i32) -> Result<(), EngineError> {
        if self.torn_down {
            return Err(EngineError::TornDown);
        }
        let route = self.tracks.select_subtitle(logical_index)?;

        // Any fetch still in flight belongs to the previous selection
        self.subtitle_generation += 1;
        self.subtitle_request = None;
        self.timeline.clear();

        match route {
            SubtitleRoute::Off => self.backend.get_mut().set_text_track(None),
            SubtitleRoute::Custom { index, source } => {
                self.backend.get_mut().set_text_track(None);
                info!(index, source = %source, generation = self.subtitle_generation, "custom subtitle selected");
                self.subtitle_request = Some(SubtitleRequest {
                    generation: self.subtitle_generation,
                    index,
                    source,
                });
            }
            SubtitleRoute::Embedded { id } => self.backend.get_mut().set_text_track(Some(id)),
        }
        Ok(())
    }

    /// Select an audio track by its position in the backend's list
    pub fn select_audio_track(&mut self, index: usize) -> Result<(), EngineError> {
        if self.torn_down {
            return Err(EngineError::TornDown);
        }
        let id = self.tracks.select_audio(index)?;
        self.backend.get_mut().set_audio_track(Some(id));
        Ok(())
    }

    /// Pending custom subtitle fetch, handed out once
    pub fn take_subtitle_request(&mut self) -> Option<SubtitleRequest> {
        self.subtitle_request.take()
    }

    /// Result of a custom subtitle fetch; `false` when it was stale
    pub fn on_subtitle_loaded(
        &mut self,
        generation: u64,
        result: Result<LoadedSubtitle, SubtitleError>,
    ) -> bool {
        if self.torn_down || generation != self.subtitle_generation {
            debug!(generation, current = self.subtitle_generation, "discarding stale subtitle result");
            return false;
        }

        match result {
            Ok(loaded) => {
                let cues = subtitle::parse(&loaded.content, loaded.format);
                info!(cues = cues.len(), "custom subtitle parsed");
                self.timeline.replace(cues);
                self.refresh_subtitle();
            }
            Err(e) => {
                warn!(error = %e, "custom subtitle unavailable");
                self.timeline.clear();
            }
        }
        true
    }

    fn refresh_subtitle(&mut self) {
        let time = self.state.get().displayed_time();
        self.timeline.update(time, self.settings.subtitle_delay_ms);
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn set_playback_speed(&mut self, speed: f32) {
        let speed = if speed.is_finite() {
            speed.clamp(MIN_SPEED, MAX_SPEED)
        } else {
            1.0
        };
        self.settings.playback_speed = speed;
        self.backend.get_mut().set_rate(speed);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.settings.is_muted = muted;
        self.backend.get_mut().set_muted(muted);
    }

    pub fn cycle_content_fit(&mut self) -> ContentFit {
        let fit = self.settings.content_fit.next();
        self.settings.content_fit = fit;
        self.backend.get_mut().set_content_fit(fit);
        fit
    }

    pub fn set_subtitle_delay_ms(&mut self, delay_ms: i64) {
        self.settings.subtitle_delay_ms = delay_ms;
        self.refresh_subtitle();
    }

    pub fn set_subtitle_position(&mut self, position: SubtitlePosition) {
        self.settings.subtitle_position = position;
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Host-initiated retry: back to the preferred backend, failover budget
    /// restored, user settings kept
    pub fn retry(&mut self) {
        if self.torn_down {
            return;
        }
        let resume = self.resume_point();
        let url = self.machine.session().video_url.clone();
        info!(url = %url, "retrying playback");

        self.machine.reset(url);
        self.stop_transient_timers();
        self.seek.reset();
        self.tracks.clear_embedded();
        self.error = None;
        self.pending_seek = resume;
        self.backend = ActiveBackend::new(self.machine.session().kind, self.factory.as_mut());
        self.start_backend();
    }

    /// Switch to a different video; settings and selections start fresh
    pub fn load(&mut self, options: PlayerOptions, now: Instant) -> Result<(), EngineError> {
        if self.torn_down {
            return Err(EngineError::TornDown);
        }
        if options.video_url.trim().is_empty() {
            return Err(EngineError::NoVideoUrl);
        }
        // The previous video is being navigated away from
        let fraction = self.exit_fraction();
        self.host.on_exit_with_progress(fraction);

        self.timers.cancel_all();
        self.seek.reset();
        self.subtitle_generation += 1;
        self.subtitle_request = None;
        self.timeline.clear();
        self.settings = PlaybackSettings::default();
        self.tracks = TrackCatalogue::new(options.subtitle_sources);
        self.title = options.title;
        self.initial_progress = sanitize_fraction(options.initial_progress);
        self.pending_seek = self.initial_progress.map(PendingSeek::Fraction);
        self.known_duration = 0.0;
        self.error = None;

        self.machine.reset(options.video_url);
        self.backend = ActiveBackend::new(self.machine.session().kind, self.factory.as_mut());
        self.start_backend();
        self.schedule_progress(now);
        Ok(())
    }

    /// Stop everything and report the exit progress; idempotent
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.timers.cancel_all();
        self.subtitle_generation += 1;
        self.subtitle_request = None;
        self.backend.get_mut().pause();

        let fraction = self.exit_fraction();
        info!(fraction, session = %self.machine.session().id, "player torn down");
        self.host.on_exit_with_progress(fraction);
    }

    /// Configure and load the active backend from a clean transport state
    fn start_backend(&mut self) {
        let url = self.machine.session().video_url.clone();
        info!(backend = %self.backend.kind(), url = %url, "starting backend");

        self.state.reset();
        self.controls_visible = true;
        self.buffering_visible = false;

        let settings = self.settings.clone();
        let backend = self.backend.get_mut();
        backend.set_rate(settings.playback_speed);
        backend.set_muted(settings.is_muted);
        backend.set_content_fit(settings.content_fit);
        backend.set_text_track(None);
        backend.load(&url);
    }

    /// Where a replacement backend should resume
    fn resume_point(&mut self) -> Option<PendingSeek> {
        let state = self.state.get();
        if state.duration > 0.0 {
            (state.current_time > 0.0).then_some(PendingSeek::Seconds(state.current_time))
        } else {
            // Never loaded: keep whatever was still waiting to be applied
            self.pending_seek.take()
        }
    }

    /// Progress to report on exit, including while a replacement backend
    /// is still loading
    fn exit_fraction(&self) -> f64 {
        let state = self.state.get();
        if state.duration > 0.0 {
            return state.progress_fraction();
        }
        match self.pending_seek {
            Some(PendingSeek::Seconds(seconds)) if self.known_duration > 0.0 => {
                (seconds / self.known_duration).clamp(0.0, 1.0)
            }
            Some(PendingSeek::Fraction(fraction)) => fraction,
            _ => self.initial_progress.unwrap_or(0.0),
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn sanitize_fraction(fraction: Option<f64>) -> Option<f64> {
    fraction
        .filter(|f| f.is_finite() && *f > 0.0)
        .map(|f| f.min(1.0))
}
