//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Source code display with syntax highlighting and current line indicator
//! - [`structures`]: Arrays, dicts, linked lists and trees of the current step
//! - [`status`]: Status bar with keybindings and playback state
//!
//! Each pane module exports a primary `render_*` function plus whatever scroll
//! state it keeps between frames. Panes hold no session state of their own.

pub mod source;
pub mod status;
pub mod structures;

// Re-export render functions for convenience
pub use source::{render_source_pane, SourceScrollState};
pub use status::{render_status_bar, StatusInfo};
pub use structures::{render_structures_pane, structure_lines};
