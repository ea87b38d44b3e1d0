//! Playback engine and its collaborators
//!
//! - `state` - transport snapshot with drag/seek guards
//! - `tracks` - custom and embedded track catalogue
//! - `backend` - decoder capability trait and event channel
//! - `failover` - primary/secondary backend state machine
//! - `seek` - seek and drag choreography
//! - `timers` - deadline bookkeeping
//! - `engine` - the control surface
//! - `session` - async driver
//! - `clock` - headless wall-clock backend

pub mod backend;
pub mod clock;
pub mod engine;
pub mod failover;
pub mod seek;
pub mod session;
pub mod state;
pub mod timers;
pub mod tracks;

pub use backend::{
    event_channel, ActiveBackend, BackendEvent, BackendFactory, EventReceiver, EventSink,
    PlaybackBackend, Platform,
};
pub use clock::{ClockBackend, ClockFactory};
pub use engine::{PlaybackEngine, PlaybackHost, PlayerOptions, SubtitleRequest};
pub use failover::{FailoverMachine, FailoverOutcome, MachineState};
pub use session::PlayerSession;
pub use state::PlayerStateModel;
pub use timers::TimerKind;
pub use tracks::{TrackCatalogue, SUBTITLES_OFF};
