//! Backend failover state machine
//!
//! ```text
//! Loading(P) -> Playing(P) <-> Buffering(P)
//!      \______________|______________/
//!                     | error, first time, platform has a fallback
//!                     v
//! Loading(S) -> Playing(S) <-> Buffering(S)
//!                     | error (or any error once failed_once is set)
//!                     v
//!                  Errored   (terminal until retry)
//! ```

use std::fmt;

use tracing::{error, info, warn};

use crate::models::{BackendKind, BackendSession};
use crate::player::backend::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Loading(BackendKind),
    Playing(BackendKind),
    Buffering(BackendKind),
    Errored,
}

impl MachineState {
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            MachineState::Loading(kind)
            | MachineState::Playing(kind)
            | MachineState::Buffering(kind) => Some(*kind),
            MachineState::Errored => None,
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineState::Loading(kind) => write!(f, "{}-loading", kind),
            MachineState::Playing(kind) => write!(f, "{}-playing", kind),
            MachineState::Buffering(kind) => write!(f, "{}-buffering", kind),
            MachineState::Errored => write!(f, "errored"),
        }
    }
}

/// What the engine must do after a backend error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailoverOutcome {
    /// Rebuild playback on this backend with the same url
    Switch { to: BackendKind },
    /// Give up and report this message to the host, once
    Terminal { message: String },
    /// Already terminal; nothing to do
    Ignored,
}

#[derive(Debug, Clone)]
pub struct FailoverMachine {
    platform: Platform,
    session: BackendSession,
    state: MachineState,
}

impl FailoverMachine {
    pub fn new(video_url: impl Into<String>, platform: Platform) -> Self {
        let kind = platform.preferred_backend();
        Self {
            platform,
            session: BackendSession::new(video_url, kind),
            state: MachineState::Loading(kind),
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn session(&self) -> &BackendSession {
        &self.session
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_terminal(&self) -> bool {
        self.state == MachineState::Errored
    }

    /// Whether events from `kind` should still be processed
    pub fn accepts(&self, kind: BackendKind) -> bool {
        self.state.backend() == Some(kind)
    }

    /// Successful load; returns `true` when this entered a playing state
    pub fn on_loaded(&mut self) -> bool {
        match self.state {
            MachineState::Loading(kind) => {
                info!(backend = %kind, session = %self.session.id, "backend loaded");
                self.state = MachineState::Playing(kind);
                true
            }
            _ => false,
        }
    }

    /// Buffering edge from the backend; returns `true` on a state change
    pub fn on_buffering(&mut self, buffering: bool) -> bool {
        let next = match (self.state, buffering) {
            (MachineState::Playing(kind), true) => MachineState::Buffering(kind),
            (MachineState::Buffering(kind), false) => MachineState::Playing(kind),
            _ => return false,
        };
        self.state = next;
        true
    }

    pub fn on_error(&mut self, message: &str) -> FailoverOutcome {
        let Some(kind) = self.state.backend() else {
            return FailoverOutcome::Ignored;
        };

        if kind == BackendKind::Primary
            && !self.session.failed_once
            && self.platform.supports_failover()
        {
            warn!(
                session = %self.session.id,
                error = message,
                "primary backend failed, switching to secondary"
            );
            self.session.failed_once = true;
            self.session.kind = BackendKind::Secondary;
            self.state = MachineState::Loading(BackendKind::Secondary);
            return FailoverOutcome::Switch {
                to: BackendKind::Secondary,
            };
        }

        let message = if self.session.failed_once {
            format!(
                "This video format is not supported by either player ({})",
                message
            )
        } else {
            format!("Playback failed: {}", message)
        };
        error!(session = %self.session.id, backend = %kind, error = %message, "playback failed");
        self.session.failed_once = true;
        self.state = MachineState::Errored;
        FailoverOutcome::Terminal { message }
    }

    /// Start over on the preferred backend with `failed_once` cleared
    pub fn reset(&mut self, video_url: impl Into<String>) {
        let kind = self.platform.preferred_backend();
        self.session = BackendSession::new(video_url, kind);
        self.state = MachineState::Loading(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut machine = FailoverMachine::new("http://x/video.mkv", Platform::Native);
        assert_eq!(machine.state(), MachineState::Loading(BackendKind::Primary));
        assert!(machine.on_loaded());
        assert!(!machine.on_loaded());
        assert!(machine.on_buffering(true));
        assert_eq!(machine.state(), MachineState::Buffering(BackendKind::Primary));
        assert!(machine.on_buffering(false));
        assert_eq!(machine.state(), MachineState::Playing(BackendKind::Primary));
    }

    #[test]
    fn test_single_failover_then_terminal() {
        let mut machine = FailoverMachine::new("http://x/video.mkv", Platform::Native);
        machine.on_loaded();

        assert_eq!(
            machine.on_error("codec rejected"),
            FailoverOutcome::Switch {
                to: BackendKind::Secondary
            }
        );
        assert!(machine.session().failed_once);
        assert_eq!(machine.state(), MachineState::Loading(BackendKind::Secondary));
        assert!(!machine.accepts(BackendKind::Primary));

        let outcome = machine.on_error("still broken");
        assert!(matches!(outcome, FailoverOutcome::Terminal { ref message } if message.contains("either player")));
        assert!(machine.is_terminal());
        assert_eq!(machine.on_error("again"), FailoverOutcome::Ignored);
        assert!(!machine.on_loaded());
    }

    #[test]
    fn test_web_platform_has_no_fallback() {
        let mut machine = FailoverMachine::new("http://x/video.mkv", Platform::Web);
        let outcome = machine.on_error("unsupported");
        assert_eq!(
            outcome,
            FailoverOutcome::Terminal {
                message: "Playback failed: unsupported".to_string()
            }
        );
        assert!(machine.is_terminal());
    }

    #[test]
    fn test_reset_clears_failed_once() {
        let mut machine = FailoverMachine::new("http://x/video.mkv", Platform::Native);
        machine.on_error("a");
        machine.on_error("b");
        let old_session = machine.session().id;

        machine.reset("http://x/video.mkv");
        assert!(!machine.session().failed_once);
        assert_ne!(machine.session().id, old_session);
        assert_eq!(machine.state(), MachineState::Loading(BackendKind::Primary));
    }
}
