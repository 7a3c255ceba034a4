//! Main TUI application state and logic

use crate::config::adjust_speed;
use crate::session::{LoadOutcome, TraceSession};
use crate::ui::panes::{
    render_source_pane, render_status_bar, render_structures_pane, SourceScrollState, StatusInfo,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;

/// Longest wait for a key before re-checking the tracer reply channel
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Structures,
}

impl FocusedPane {
    /// Move focus to the other pane
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Structures,
            FocusedPane::Structures => FocusedPane::Source,
        }
    }
}

/// The main application state
pub struct App {
    /// The trace session being played back
    pub session: TraceSession,

    /// The source code that was traced
    pub source_code: String,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll state
    pub source_scroll: SourceScrollState,
    pub structures_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Create a new app around a session; call [`App::start`] or load a trace first
    pub fn new(session: TraceSession, source_code: String) -> Self {
        App {
            session,
            source_code,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::default(),
            structures_scroll: 0,
            should_quit: false,
            status_message: String::from("Ready!"),
        }
    }

    /// Ask the tracer for the current source
    pub fn start(&mut self) {
        self.session.load_trace(&self.source_code);
        self.status_message = "Tracing...".to_string();
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if let Some(outcome) = self.session.poll() {
                self.on_loaded(outcome);
            }

            // Handle auto-play mode
            if self.session.tick(Instant::now()) {
                self.status_message = "Playing...".to_string();
                self.structures_scroll = 0;
            }

            // Wake up in time for the next auto-play tick
            let timeout = self
                .session
                .controller()
                .time_until_tick(Instant::now())
                .map_or(IDLE_POLL, |due| due.min(IDLE_POLL));
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn on_loaded(&mut self, outcome: LoadOutcome) {
        self.structures_scroll = 0;
        self.source_scroll.target_line_row = None;
        self.status_message = match outcome {
            LoadOutcome::Loaded { frames } => format!("Loaded {} steps", frames),
            LoadOutcome::Empty => "The tracer returned no steps".to_string(),
            // The status bar shows the error itself
            LoadOutcome::Failed(_) => String::new(),
        };
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes on top, status bar at the bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let pane_area = main_chunks[0];
        let status_area = main_chunks[1];

        // Source (left) | Data structures (right)
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(pane_area);

        let view = self.session.current_view();
        let error_line = self.session.last_error().and_then(|e| e.line);

        render_source_pane(
            frame,
            columns[0],
            &self.source_code,
            view.as_ref().and_then(|v| v.line_number),
            error_line,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        let placeholder = if self.session.is_pending() {
            "Waiting for the tracer..."
        } else if self.session.last_error().is_some() {
            "No data: the program failed to trace"
        } else {
            "No steps to show"
        };
        render_structures_pane(
            frame,
            columns[1],
            view.as_ref(),
            placeholder,
            self.focused_pane == FocusedPane::Structures,
            &mut self.structures_scroll,
        );

        let controller = self.session.controller();
        let info = StatusInfo {
            message: &self.status_message,
            current_step: controller.current_index(),
            total_steps: controller.len(),
            is_playing: controller.is_playing(),
            speed: controller.speed(),
            complexity: self.session.complexity(),
            error: self.session.last_error(),
            is_pending: self.session.is_pending(),
        };
        render_status_bar(frame, status_area, &info);
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Left => self.step(-1),
            KeyCode::Right => self.step(1),
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Structures => {
                    self.structures_scroll = self.structures_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling down makes the current line move up visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Structures => {
                    self.structures_scroll = self.structures_scroll.saturating_add(1);
                }
            },
            KeyCode::Char(' ') => {
                self.session.toggle_play(Instant::now());
                self.status_message = if self.session.controller().is_playing() {
                    "Playing...".to_string()
                } else {
                    "Paused".to_string()
                };
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.change_speed(1),
            KeyCode::Char('-') | KeyCode::Char('_') => self.change_speed(-1),
            KeyCode::Enter | KeyCode::End => {
                self.session.seek_end();
                self.structures_scroll = 0;
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace | KeyCode::Home => {
                self.session.seek(0);
                self.structures_scroll = 0;
                self.status_message = "Jumped to start".to_string();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if !self.session.is_pending() {
                    self.start();
                }
            }
            _ => {}
        }
    }

    fn step(&mut self, delta: isize) {
        let controller = self.session.controller();
        if delta > 0 && controller.is_at_end() {
            self.status_message = "Already at the last step".to_string();
            return;
        }
        if delta < 0 && controller.is_at_start() {
            self.status_message = "Already at the first step".to_string();
            return;
        }

        self.session.step(delta);
        self.structures_scroll = 0;
        self.status_message = if delta > 0 {
            "Stepped forward".to_string()
        } else {
            "Stepped backward".to_string()
        };
    }

    fn change_speed(&mut self, steps: i32) {
        let speed = adjust_speed(self.session.controller().speed(), steps);
        match self.session.set_speed(speed, Instant::now()) {
            Ok(()) => self.status_message = format!("Speed {}x", speed),
            Err(e) => {
                debug!(error = %e, "speed change rejected");
                self.status_message = e.to_string();
            }
        }
    }
}
