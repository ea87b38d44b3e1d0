//! Now Playing overlay
//!
//! Renders the engine snapshot: video area with subtitle text, buffering
//! and error states, the track panel and the auto-hiding control bar.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::models::{MenuAction, SubtitlePosition};
use crate::player::PlaybackEngine;
use crate::ui::Theme;

const TRACK_PANEL_WIDTH: u16 = 34;

/// Player overlay state
#[derive(Debug, Default)]
pub struct PlayerView {
    /// Track panel visibility
    pub show_tracks: bool,
    /// Transient message in the status bar
    pub flash: Option<String>,
}

impl PlayerView {
    pub fn new() -> Self {
        Self {
            show_tracks: true,
            flash: None,
        }
    }

    pub fn set_flash(&mut self, msg: impl Into<String>) {
        self.flash = Some(msg.into());
    }

    /// Text progress bar, `width` cells wide
    pub fn progress_bar(fraction: f64, width: usize) -> String {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        let filled = ((fraction * width as f64).round() as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }

    /// Render the player overlay
    pub fn render(&self, frame: &mut Frame, area: Rect, engine: &PlaybackEngine) {
        let controls_height = if engine.controls_visible() { 4 } else { 0 };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(controls_height),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(frame, rows[0], engine);

        let body = if self.show_tracks && rows[1].width > TRACK_PANEL_WIDTH * 2 {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(10), Constraint::Length(TRACK_PANEL_WIDTH)])
                .split(rows[1]);
            render_tracks(frame, cols[1], engine);
            cols[0]
        } else {
            rows[1]
        };
        render_video(frame, body, engine);

        if engine.controls_visible() {
            render_controls(frame, rows[2], engine);
        }
        self.render_status_bar(frame, rows[3], engine);

        if let Some(error) = engine.error() {
            render_error_popup(frame, body, error);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, engine: &PlaybackEngine) {
        let kind = engine.active_backend();
        let line = Line::from(vec![
            Span::styled(format!(" {} ", engine.title()), Theme::title()),
            Span::raw(" "),
            Span::styled(format!("[{}]", kind), Theme::backend(kind)),
            Span::raw(" "),
            Span::styled(engine.machine_state().to_string(), Theme::dimmed()),
        ]);
        frame.render_widget(Paragraph::new(line).style(Theme::status_bar()), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, engine: &PlaybackEngine) {
        let mut spans = vec![
            Span::styled(" SPACE ", Theme::keybind()),
            Span::styled("play  ", Theme::dimmed()),
            Span::styled(" ←→ ", Theme::keybind()),
            Span::styled("skip  ", Theme::dimmed()),
            Span::styled(" ,. ", Theme::keybind()),
            Span::styled("delay  ", Theme::dimmed()),
            Span::styled(" s/a ", Theme::keybind()),
            Span::styled("tracks  ", Theme::dimmed()),
            Span::styled(" q ", Theme::keybind()),
            Span::styled("quit", Theme::dimmed()),
        ];
        if engine.error().is_some() {
            spans.push(Span::styled("  r ", Theme::keybind()));
            spans.push(Span::styled("retry", Theme::dimmed()));
        }
        if let Some(flash) = &self.flash {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(flash.clone(), Theme::warning()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)).style(Theme::status_bar()), area);
    }
}

fn render_video(frame: &mut Frame, area: Rect, engine: &PlaybackEngine) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if engine.buffering_visible() {
        let center = centered_row(inner, inner.height / 2, 1);
        frame.render_widget(
            Paragraph::new(Span::styled("Buffering...", Theme::warning())).alignment(Alignment::Center),
            center,
        );
    } else if !engine.state().is_ready && engine.error().is_none() {
        let center = centered_row(inner, inner.height / 2, 1);
        frame.render_widget(
            Paragraph::new(Span::styled("Loading...", Theme::title())).alignment(Alignment::Center),
            center,
        );
    }

    let text = engine.subtitle_text();
    if text.is_empty() {
        return;
    }
    let lines: Vec<Line> = text
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), Theme::subtitle())))
        .collect();
    let height = (lines.len() as u16).min(inner.height);
    let y = match engine.settings().subtitle_position {
        SubtitlePosition::Top => 0,
        SubtitlePosition::Middle => inner.height.saturating_sub(height) / 2,
        SubtitlePosition::Bottom => inner.height.saturating_sub(height + 1),
    };
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        centered_row(inner, y, height),
    );
}

fn render_controls(frame: &mut Frame, area: Rect, engine: &PlaybackEngine) {
    let state = engine.state();
    let settings = engine.settings();
    let bar_width = area.width.saturating_sub(4) as usize;
    let bar_style = if state.is_dragging {
        Theme::progress_drag()
    } else {
        Theme::progress_bar()
    };

    let play_icon = if state.is_playing { "▶" } else { "⏸" };
    let mut flags = Vec::new();
    if state.is_seeking {
        flags.push("seeking");
    }
    if state.is_buffering {
        flags.push("buffering");
    }
    if settings.is_muted {
        flags.push("muted");
    }

    let lines = vec![
        Line::from(Span::styled(
            PlayerView::progress_bar(state.progress_fraction(), bar_width),
            bar_style,
        )),
        Line::from(vec![
            Span::styled(format!("{} ", play_icon), Theme::success()),
            Span::styled(
                format!("{} / {}", state.format_position(), state.format_duration()),
                Theme::text(),
            ),
            Span::raw("  "),
            Span::styled(flags.join(" · "), Theme::warning()),
        ]),
        Line::from(Span::styled(
            format!(
                "speed {:.2}x  delay {:+}ms  fit {}",
                settings.playback_speed, settings.subtitle_delay_ms, settings.content_fit
            ),
            Theme::dimmed(),
        )),
    ];

    let block = Block::default().borders(Borders::TOP).border_style(Theme::border());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_tracks(frame: &mut Frame, area: Rect, engine: &PlaybackEngine) {
    let mut lines = vec![Line::from(Span::styled("SUBTITLES", Theme::title()))];
    lines.extend(engine.subtitle_actions().iter().map(action_line));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("AUDIO", Theme::title())));
    let audio = engine.audio_actions();
    if audio.is_empty() {
        lines.push(Line::from(Span::styled("  (none reported)", Theme::dimmed())));
    }
    lines.extend(audio.iter().map(action_line));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(" TRACKS ", Theme::title()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn action_line(action: &MenuAction) -> Line<'static> {
    if action.selected {
        Line::from(Span::styled(format!("● {}", action.label), Theme::menu_selected()))
    } else {
        Line::from(Span::styled(format!("  {}", action.label), Theme::text()))
    }
}

fn render_error_popup(frame: &mut Frame, area: Rect, error: &str) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 6.min(area.height);

    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(popup_width)) / 2,
        y: area.y + (area.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let error_block = Paragraph::new(vec![
        Line::from(Span::styled(error.to_string(), Theme::error())),
        Line::from(""),
        Line::from(Span::styled("press r to retry", Theme::dimmed())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Theme::error())
            .title(Span::styled(" ✗ PLAYBACK ERROR ", Theme::error())),
    );

    frame.render_widget(error_block, popup_area);
}

fn centered_row(area: Rect, offset: u16, height: u16) -> Rect {
    let y = area.y + offset.min(area.height.saturating_sub(1));
    Rect {
        x: area.x,
        y,
        width: area.width,
        height: height.min(area.y + area.height - y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(PlayerView::progress_bar(0.0, 4), "░░░░");
        assert_eq!(PlayerView::progress_bar(0.5, 4), "██░░");
        assert_eq!(PlayerView::progress_bar(3.0, 4), "████");
        assert_eq!(PlayerView::progress_bar(f64::NAN, 2), "░░");
    }

    #[test]
    fn test_centered_row_stays_inside() {
        let area = Rect::new(0, 0, 10, 5);
        let row = centered_row(area, 9, 3);
        assert_eq!(row.y, 4);
        assert_eq!(row.height, 1);
    }
}
