//! Interactive preview
//!
//! Runs a `PlayerSession` against the headless clock backend and maps
//! keystrokes onto engine intents.

use std::cell::RefCell;
use std::io::{stdout, Stdout};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::time::Instant;
use tracing::info;

use crate::cli::{PreviewCmd, PreviewSummary};
use crate::config::Config;
use crate::models::{EmbeddedTrack, SubtitleSource};
use crate::player::{
    event_channel, ClockFactory, PlaybackEngine, PlaybackHost, PlayerOptions, PlayerSession,
    SUBTITLES_OFF,
};
use crate::subtitle::{HttpSubtitleFetcher, SubtitleLoader};
use crate::ui::player::PlayerView;

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

const TICK_RATE: Duration = Duration::from_millis(100);
const DELAY_STEP_MS: i64 = 100;
const SPEED_STEP: f32 = 0.25;

// =============================================================================
// Host
// =============================================================================

/// What the engine reported back to the preview
#[derive(Debug, Default, Clone)]
pub struct HostLog {
    pub last_progress: Option<f64>,
    pub exit_progress: Option<f64>,
    pub error: Option<String>,
}

/// Host callbacks recorded into a shared log
#[derive(Debug, Clone, Default)]
pub struct PreviewHost {
    log: Rc<RefCell<HostLog>>,
}

impl PreviewHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> HostLog {
        self.log.borrow().clone()
    }
}

impl PlaybackHost for PreviewHost {
    fn on_progress(&mut self, fraction: f64) {
        self.log.borrow_mut().last_progress = Some(fraction);
    }

    fn on_exit_with_progress(&mut self, fraction: f64) {
        self.log.borrow_mut().exit_progress = Some(fraction);
    }

    fn on_unrecoverable_error(&mut self, message: &str) {
        self.log.borrow_mut().error = Some(message.to_string());
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Guess a language code from names like `movie.en.srt`
pub fn language_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| Path::new(stem).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| (2..=3).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| "und".to_string())
}

pub fn subtitle_sources(files: &[impl AsRef<Path>]) -> Vec<SubtitleSource> {
    files
        .iter()
        .map(|file| {
            let path = file.as_ref();
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            SubtitleSource::new(language_from_path(path), label, path.to_string_lossy())
        })
        .collect()
}

fn loader_from_config(config: &Config) -> SubtitleLoader {
    let mut loader = SubtitleLoader::new();
    if let Some(base) = &config.subtitles.api_base {
        let mut fetcher = HttpSubtitleFetcher::new(base.clone());
        if let Some(key) = &config.subtitles.api_key {
            fetcher = fetcher.with_api_key(key.clone());
        }
        loader = loader.with_fetcher(Arc::new(fetcher));
    }
    if config.subtitles.no_cache {
        loader = loader.without_cache();
    }
    loader
}

/// Tracks the clock backend pretends the container carries
fn demo_tracks() -> (Vec<EmbeddedTrack>, Vec<EmbeddedTrack>) {
    (
        vec![
            EmbeddedTrack::audio(1, Some("Stereo"), Some("en")),
            EmbeddedTrack::audio(2, Some("Commentary"), Some("en")),
        ],
        vec![EmbeddedTrack::text(3, Some("Forced"), Some("en"))],
    )
}

// =============================================================================
// Key handling
// =============================================================================

/// Apply one keystroke; returns `false` when the preview should close
pub fn handle_key(engine: &mut PlaybackEngine, view: &mut PlayerView, key: KeyEvent, now: Instant) -> bool {
    engine.show_controls(now);

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Char(' ') => engine.toggle_play_pause(now),
        KeyCode::Left => {
            engine.skip_back(now);
        }
        KeyCode::Right => {
            engine.skip_forward(now);
        }
        KeyCode::Char(',') => {
            let delay = engine.settings().subtitle_delay_ms - DELAY_STEP_MS;
            engine.set_subtitle_delay_ms(delay);
        }
        KeyCode::Char('.') => {
            let delay = engine.settings().subtitle_delay_ms + DELAY_STEP_MS;
            engine.set_subtitle_delay_ms(delay);
        }
        KeyCode::Char('s') => {
            let tracks = engine.tracks();
            let total = (tracks.custom_count() + tracks.embedded_count()) as i32;
            let next = tracks.selected_logical_index() + 1;
            let next = if next >= total { SUBTITLES_OFF } else { next };
            if let Err(e) = engine.select_subtitle_track(next) {
                view.set_flash(e.to_string());
            }
        }
        KeyCode::Char('a') => {
            let tracks = engine.tracks();
            let count = tracks.audio_tracks().len();
            if count > 0 {
                let current = tracks
                    .audio_tracks()
                    .iter()
                    .position(|t| Some(t.id) == tracks.selected_audio())
                    .unwrap_or(0);
                if let Err(e) = engine.select_audio_track((current + 1) % count) {
                    view.set_flash(e.to_string());
                }
            }
        }
        KeyCode::Char('m') => {
            let muted = !engine.settings().is_muted;
            engine.set_muted(muted);
        }
        KeyCode::Char('[') => {
            let speed = engine.settings().playback_speed - SPEED_STEP;
            engine.set_playback_speed(speed);
        }
        KeyCode::Char(']') => {
            let speed = engine.settings().playback_speed + SPEED_STEP;
            engine.set_playback_speed(speed);
        }
        KeyCode::Char('f') => {
            let fit = engine.cycle_content_fit();
            view.set_flash(format!("fit: {}", fit));
        }
        KeyCode::Char('p') => {
            let position = engine.settings().subtitle_position.next();
            engine.set_subtitle_position(position);
        }
        KeyCode::Char('t') => view.show_tracks = !view.show_tracks,
        KeyCode::Char('r') => {
            if engine.error().is_some() {
                engine.retry();
                view.flash = None;
            }
        }
        _ => {}
    }
    true
}

// =============================================================================
// TUI
// =============================================================================

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the preview until the user quits
pub async fn run(cmd: &PreviewCmd, config: Config) -> Result<PreviewSummary> {
    let (sink, events) = event_channel();
    let (audio, text) = demo_tracks();
    let factory = ClockFactory::new(sink, cmd.duration)
        .fail_primary(cmd.fail_primary)
        .with_tracks(audio, text);

    let host = PreviewHost::new();
    let mut options = PlayerOptions::new(cmd.url.clone())
        .title(cmd.title.clone())
        .subtitles(subtitle_sources(&cmd.files));
    if let Some(start) = cmd.start {
        options = options.initial_progress(start);
    }

    let loader = loader_from_config(&config);
    let engine = PlaybackEngine::new(
        options,
        config.engine,
        Box::new(factory),
        Box::new(host.clone()),
        Instant::now(),
    );
    let mut session = PlayerSession::new(engine, loader, events);

    let mut terminal = init_terminal()?;
    let result = run_event_loop(&mut terminal, &mut session);
    restore_terminal(&mut terminal)?;
    result?;

    session.shutdown();
    let log = host.log();
    let engine = session.engine();
    info!(progress = ?log.exit_progress, "preview closed");

    Ok(PreviewSummary {
        title: engine.title().to_string(),
        progress: log.exit_progress.unwrap_or(0.0),
        backend: engine.active_backend().to_string(),
        error: log.error,
    })
}

fn run_event_loop(terminal: &mut Tui, session: &mut PlayerSession) -> Result<()> {
    let mut view = PlayerView::new();

    loop {
        session.pump(Instant::now());
        terminal.draw(|frame| view.render(frame, frame.area(), session.engine()))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press
                    && !handle_key(session.engine_mut(), &mut view, key, Instant::now())
                {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_language_from_path() {
        assert_eq!(language_from_path(Path::new("movie.en.srt")), "en");
        assert_eq!(language_from_path(Path::new("/subs/Movie.SPA.vtt")), "spa");
        assert_eq!(language_from_path(Path::new("movie.srt")), "und");
        assert_eq!(language_from_path(Path::new("movie.2024.srt")), "und");
    }

    #[test]
    fn test_subtitle_sources_use_file_names() {
        let sources = subtitle_sources(&["/tmp/a.fr.srt"]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].language, "fr");
        assert_eq!(sources[0].label, "a.fr.srt");
        assert_eq!(sources[0].url, "/tmp/a.fr.srt");
    }

    #[tokio::test]
    async fn test_keys_drive_engine() {
        let (sink, mut events) = event_channel();
        let (audio, text) = demo_tracks();
        let factory = ClockFactory::new(sink, 120.0).with_tracks(audio, text);
        let host = PreviewHost::new();
        let now = Instant::now();
        let mut engine = PlaybackEngine::new(
            PlayerOptions::new("clock://test"),
            Default::default(),
            Box::new(factory),
            Box::new(host.clone()),
            now,
        );
        let (kind, event) = events.try_recv().unwrap();
        engine.handle_backend_event(kind, event, now);

        let mut view = PlayerView::new();
        let press = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);

        assert!(handle_key(&mut engine, &mut view, press('.'), now));
        assert_eq!(engine.settings().subtitle_delay_ms, 100);

        handle_key(&mut engine, &mut view, press('s'), now);
        assert_eq!(engine.tracks().selected_text_track(), Some(3));
        handle_key(&mut engine, &mut view, press('s'), now);
        assert_eq!(engine.tracks().selected_logical_index(), SUBTITLES_OFF);

        handle_key(&mut engine, &mut view, press('a'), now);
        assert_eq!(engine.tracks().selected_audio(), Some(2));

        handle_key(&mut engine, &mut view, press(']'), now);
        assert_eq!(engine.settings().playback_speed, 1.25);

        assert!(!handle_key(&mut engine, &mut view, press('q'), now));
        drop(engine);
        assert_eq!(host.log().exit_progress, Some(0.0));
    }
}
