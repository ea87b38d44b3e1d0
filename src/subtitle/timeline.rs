//! Active-cue lookup with operator delay

use std::sync::Arc;

use crate::models::SubtitleCue;

/// Text of the first cue covering `current_time + delay_ms / 1000`
///
/// Linear scan; cue lists are a few hundred entries. Returns "" when no cue
/// covers the effective time.
pub fn active_text(cues: &[SubtitleCue], current_time: f64, delay_ms: i64) -> &str {
    let effective = current_time + delay_ms as f64 / 1000.0;
    cues.iter()
        .find(|cue| cue.contains(effective))
        .map(|cue| cue.text.as_str())
        .unwrap_or("")
}

/// Parsed cue list for the selected custom source plus the text currently
/// on screen
///
/// The cue list is replaced wholesale on every new selection and never
/// mutated in place; changing the delay only changes the lookup.
#[derive(Debug, Default, Clone)]
pub struct SubtitleTimeline {
    cues: Arc<Vec<SubtitleCue>>,
    displayed: String,
}

impl SubtitleTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cues(cues: Vec<SubtitleCue>) -> Self {
        Self {
            cues: Arc::new(cues),
            displayed: String::new(),
        }
    }

    /// Swap in a freshly parsed cue list
    pub fn replace(&mut self, cues: Vec<SubtitleCue>) {
        self.cues = Arc::new(cues);
        self.displayed.clear();
    }

    /// Drop all cues and blank the screen
    pub fn clear(&mut self) {
        if !self.cues.is_empty() {
            self.cues = Arc::new(Vec::new());
        }
        self.displayed.clear();
    }

    pub fn cues(&self) -> &Arc<Vec<SubtitleCue>> {
        &self.cues
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Text currently displayed
    pub fn text(&self) -> &str {
        &self.displayed
    }

    /// Recompute the active text; `true` only when it changed
    pub fn update(&mut self, current_time: f64, delay_ms: i64) -> bool {
        let next = active_text(&self.cues, current_time, delay_ms);
        if next == self.displayed {
            return false;
        }
        self.displayed = next.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cues() -> Vec<SubtitleCue> {
        vec![
            SubtitleCue::new(1.0, 2.0, "one"),
            SubtitleCue::new(3.0, 4.0, "two"),
        ]
    }

    #[test]
    fn test_active_text_bounds() {
        let cues = cues();
        assert_eq!(active_text(&cues, 0.5, 0), "");
        assert_eq!(active_text(&cues, 1.5, 0), "one");
        assert_eq!(active_text(&cues, 2.5, 0), "");
        assert_eq!(active_text(&cues, 4.5, 0), "");
    }

    #[test]
    fn test_delay_shifts_lookup() {
        let cues = cues();
        // 2.5s + 1s delay lands inside the second cue
        assert_eq!(active_text(&cues, 2.5, 1000), "two");
        assert_eq!(active_text(&cues, 3.5, -2000), "one");
    }

    #[test]
    fn test_first_overlapping_cue_wins() {
        let cues = vec![
            SubtitleCue::new(1.0, 5.0, "first"),
            SubtitleCue::new(2.0, 3.0, "second"),
        ];
        assert_eq!(active_text(&cues, 2.5, 0), "first");
    }

    #[test]
    fn test_update_reports_changes_only() {
        let mut timeline = SubtitleTimeline::from_cues(cues());
        assert!(!timeline.update(0.5, 0));
        assert!(timeline.update(1.5, 0));
        assert_eq!(timeline.text(), "one");
        assert!(!timeline.update(1.7, 0));
        assert!(timeline.update(2.5, 0));
        assert_eq!(timeline.text(), "");
    }

    #[test]
    fn test_delay_change_keeps_cue_list() {
        let mut timeline = SubtitleTimeline::from_cues(cues());
        let before = Arc::clone(timeline.cues());
        timeline.update(2.5, 0);
        timeline.update(2.5, 1000);
        assert!(Arc::ptr_eq(&before, timeline.cues()));
        assert_eq!(timeline.text(), "two");
    }
}
