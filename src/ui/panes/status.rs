//! Status bar rendering with keybindings and state indicators

use crate::session::SessionError;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Everything the status bar shows about the session
#[derive(Debug, Clone, Copy)]
pub struct StatusInfo<'a> {
    pub message: &'a str,
    pub current_step: usize,
    pub total_steps: usize,
    pub is_playing: bool,
    pub speed: f64,
    pub complexity: Option<&'a str>,
    pub error: Option<&'a SessionError>,
    pub is_pending: bool,
}

impl StatusInfo<'_> {
    /// ` Step 3/12 `, or a placeholder while there is nothing loaded
    pub fn step_text(&self) -> String {
        if self.is_pending {
            " Tracing… ".to_string()
        } else if self.total_steps == 0 {
            " Step -/- ".to_string()
        } else {
            format!(" Step {}/{} ", self.current_step + 1, self.total_steps)
        }
    }

    /// The message area: the error wins over everything else
    pub fn message_text(&self) -> String {
        match self.error {
            Some(err) => err.to_string(),
            None => match self.complexity {
                Some(complexity) => format!("{}  ·  {}", self.message, complexity),
                None => self.message.to_string(),
            },
        }
    }
}

/// Render the status bar at the bottom.
pub fn render_status_bar(frame: &mut Frame, area: Rect, info: &StatusInfo) {
    // Split status bar into left and right
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left_spans = vec![
        Span::styled(
            info.step_text(),
            Style::default()
                .bg(if info.error.is_some() {
                    DEFAULT_THEME.error
                } else if info.is_pending {
                    DEFAULT_THEME.secondary
                } else {
                    DEFAULT_THEME.primary
                })
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " | ",
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!(" {} ", info.message_text()),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(if info.error.is_some() {
                    DEFAULT_THEME.error
                } else {
                    DEFAULT_THEME.fg
                }),
        ),
    ];

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Left);

    frame.render_widget(left_paragraph, layout[0]);

    // Right side: Keybinds with visual grouping
    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let mut right_spans = vec![
        Span::styled(" ←/→ ", key_style),
        Span::styled(" step ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" ⎵ ", key_style),
        Span::styled(" play ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" +/- ", key_style),
        Span::styled(format!(" {}x ", info.speed), desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" ↵ / ⌫ ", key_style),
        Span::styled(" end/start ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" r ", key_style),
        Span::styled(" rerun ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled("q", key_style),
        Span::styled(" quit ", desc_style),
    ];

    // Show status indicators based on position and state
    let is_at_start = info.total_steps > 0 && info.current_step == 0;
    let is_at_end = info.total_steps > 0 && info.current_step + 1 >= info.total_steps;

    if info.is_playing {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(
            " ▶ PLAYING ",
            Style::default()
                .bg(DEFAULT_THEME.secondary)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    } else if is_at_end {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(
            " END ",
            Style::default()
                .bg(DEFAULT_THEME.error)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    } else if is_at_start {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(
            " START ",
            Style::default()
                .bg(DEFAULT_THEME.success)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Right);

    frame.render_widget(right_paragraph, layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> StatusInfo<'static> {
        StatusInfo {
            message: "Ready",
            current_step: 2,
            total_steps: 12,
            is_playing: false,
            speed: 1.0,
            complexity: None,
            error: None,
            is_pending: false,
        }
    }

    #[test]
    fn test_step_text() {
        assert_eq!(info().step_text(), " Step 3/12 ");
        let empty = StatusInfo {
            total_steps: 0,
            current_step: 0,
            ..info()
        };
        assert_eq!(empty.step_text(), " Step -/- ");
    }

    #[test]
    fn test_error_replaces_message() {
        let err = SessionError {
            message: "division by zero".to_string(),
            line: Some(4),
        };
        let status = StatusInfo {
            error: Some(&err),
            complexity: Some("O(n)"),
            ..info()
        };
        assert_eq!(status.message_text(), "Error on line 4: division by zero");
    }

    #[test]
    fn test_complexity_follows_message() {
        let status = StatusInfo {
            complexity: Some("O(n log n)"),
            ..info()
        };
        assert_eq!(status.message_text(), "Ready  ·  O(n log n)");
    }
}
