//! Terminal UI components
//!
//! Built with ratatui. Keyboard-first navigation throughout.

pub mod player;
pub mod preview;
pub mod theme;

pub use player::PlayerView;
pub use theme::Theme;
