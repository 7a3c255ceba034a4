//! # Introduction
//!
//! traceds plays back the execution of a traced program and shows how its data
//! structures change from step to step. An external tracer service runs the
//! program and answers with one frame per executed line; this crate decodes
//! those frames, carries structures forward across frames that omit them,
//! diffs each frame against the one before and drives playback through a
//! terminal UI built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Pipeline
//!
//! ```text
//! Source → Tracer → Frames → Carry-forward cache + Diff → StepView → TUI
//! ```
//!
//! 1. [`session`]: talks to the tracer (HTTP or a saved response) and owns
//!    the playback state of one run.
//! 2. [`snapshot`]: the frame wire format and the tree model.
//! 3. [`diff`]: the carry-forward cache, the per-kind diff rules and the
//!    render-ready [`diff::StepView`].
//! 4. [`playback`]: the play/pause/step/seek controller and its tick clock.
//! 5. [`config`]: command-line options.
//! 6. [`ui`]: ratatui-based TUI; not part of the stable library API.

pub mod config;
pub mod diff;
pub mod playback;
pub mod session;
pub mod snapshot;
pub mod ui;
