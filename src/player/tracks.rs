//! Track catalogue and selection
//!
//! Custom subtitle sources and embedded text tracks share one logical index
//! space: custom sources occupy `[0, custom_count)`, embedded text tracks
//! follow. `-1` means subtitles off. Audio has no such duality.

use tracing::debug;

use crate::error::EngineError;
use crate::models::{EmbeddedTrack, MenuAction, SubtitleSelection, SubtitleSource};

/// Logical index meaning "subtitles off"
pub const SUBTITLES_OFF: i32 = -1;

/// Where a subtitle selection must be routed
#[derive(Debug, Clone, PartialEq)]
pub enum SubtitleRoute {
    Off,
    /// Fetch and parse this host source
    Custom { index: usize, source: SubtitleSource },
    /// Hand this track id to the active backend
    Embedded { id: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct TrackCatalogue {
    custom: Vec<SubtitleSource>,
    audio: Vec<EmbeddedTrack>,
    text: Vec<EmbeddedTrack>,
    selected_audio: Option<u32>,
    subtitle: SubtitleSelection,
}

impl TrackCatalogue {
    pub fn new(custom: Vec<SubtitleSource>) -> Self {
        Self {
            custom,
            ..Default::default()
        }
    }

    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    pub fn embedded_count(&self) -> usize {
        self.text.len()
    }

    pub fn custom_sources(&self) -> &[SubtitleSource] {
        &self.custom
    }

    pub fn audio_tracks(&self) -> &[EmbeddedTrack] {
        &self.audio
    }

    pub fn text_tracks(&self) -> &[EmbeddedTrack] {
        &self.text
    }

    pub fn selection(&self) -> SubtitleSelection {
        self.subtitle
    }

    pub fn selected_audio(&self) -> Option<u32> {
        self.selected_audio
    }

    /// Embedded text track the backend should render, if any
    pub fn selected_text_track(&self) -> Option<u32> {
        match self.subtitle {
            SubtitleSelection::Embedded(id) => Some(id),
            _ => None,
        }
    }

    /// Custom source the timeline should render, if any
    pub fn selected_custom(&self) -> Option<usize> {
        match self.subtitle {
            SubtitleSelection::Custom(index) => Some(index),
            _ => None,
        }
    }

    /// Logical index of the current selection (`-1` when off)
    pub fn selected_logical_index(&self) -> i32 {
        match self.subtitle {
            SubtitleSelection::Off => SUBTITLES_OFF,
            SubtitleSelection::Custom(index) => index as i32,
            SubtitleSelection::Embedded(id) => self
                .text
                .iter()
                .position(|t| t.id == id)
                .map(|pos| (self.custom.len() + pos) as i32)
                .unwrap_or(SUBTITLES_OFF),
        }
    }

    /// Take the backend's freshly reported track lists
    ///
    /// Audio defaults to the first reported track; an embedded subtitle
    /// selection that no longer exists falls back to off.
    pub fn set_embedded(&mut self, audio: Vec<EmbeddedTrack>, text: Vec<EmbeddedTrack>) {
        self.audio = audio;
        self.text = text;

        let audio_valid = self
            .selected_audio
            .map(|id| self.audio.iter().any(|t| t.id == id))
            .unwrap_or(false);
        if !audio_valid {
            self.selected_audio = self.audio.first().map(|t| t.id);
        }

        if let SubtitleSelection::Embedded(id) = self.subtitle {
            if !self.text.iter().any(|t| t.id == id) {
                self.subtitle = SubtitleSelection::Off;
            }
        }
    }

    /// Forget everything the previous backend reported
    ///
    /// A custom subtitle is backend-independent and survives.
    pub fn clear_embedded(&mut self) {
        self.audio.clear();
        self.text.clear();
        self.selected_audio = None;
        if matches!(self.subtitle, SubtitleSelection::Embedded(_)) {
            self.subtitle = SubtitleSelection::Off;
        }
    }

    /// Resolve a logical subtitle index and make it the active selection
    pub fn select_subtitle(&mut self, logical_index: i32) -> Result<SubtitleRoute, EngineError> {
        if logical_index == SUBTITLES_OFF {
            self.subtitle = SubtitleSelection::Off;
            return Ok(SubtitleRoute::Off);
        }
        if logical_index < 0 {
            return Err(EngineError::InvalidSubtitleTrack(logical_index));
        }

        let index = logical_index as usize;
        if let Some(source) = self.custom.get(index) {
            self.subtitle = SubtitleSelection::Custom(index);
            return Ok(SubtitleRoute::Custom {
                index,
                source: source.clone(),
            });
        }

        let ordinal = index - self.custom.len();
        let track = self
            .text
            .get(ordinal)
            .ok_or(EngineError::InvalidSubtitleTrack(logical_index))?;
        debug!(ordinal, id = track.id, "embedded subtitle selected");
        self.subtitle = SubtitleSelection::Embedded(track.id);
        Ok(SubtitleRoute::Embedded { id: track.id })
    }

    /// Select an audio track by its position in the reported list
    pub fn select_audio(&mut self, index: usize) -> Result<u32, EngineError> {
        let track = self
            .audio
            .get(index)
            .ok_or(EngineError::InvalidAudioTrack(index))?;
        self.selected_audio = Some(track.id);
        Ok(track.id)
    }

    /// Menu entries: off, custom sources, then embedded text tracks
    pub fn subtitle_actions(&self) -> Vec<MenuAction> {
        let mut actions = Vec::with_capacity(1 + self.custom.len() + self.text.len());
        actions.push(MenuAction {
            id: "subtitle:off".to_string(),
            label: "Off".to_string(),
            selected: self.subtitle == SubtitleSelection::Off,
        });

        actions.extend(self.custom.iter().enumerate().map(|(index, source)| MenuAction {
            id: format!("subtitle:custom:{}", index),
            label: source.to_string(),
            selected: self.subtitle == SubtitleSelection::Custom(index),
        }));

        actions.extend(self.text.iter().map(|track| MenuAction {
            id: format!("subtitle:embedded:{}", track.id),
            label: track.display_label(),
            selected: self.subtitle == SubtitleSelection::Embedded(track.id),
        }));

        actions
    }

    pub fn audio_actions(&self) -> Vec<MenuAction> {
        self.audio
            .iter()
            .map(|track| MenuAction {
                id: format!("audio:{}", track.id),
                label: track.display_label(),
                selected: self.selected_audio == Some(track.id),
            })
            .collect()
    }
}
