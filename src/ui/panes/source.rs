//! Source code pane rendering with syntax highlighting
//!
//! This module renders the source code pane, which displays the traced
//! program with basic syntax highlighting and execution indicators.
//!
//! # Features
//!
//! - Syntax highlighting for Python keywords, builtins, strings, numbers, and comments
//! - Current line highlighting
//! - Error line highlighting when the tracer reported a failing line
//! - Scroll state that keeps the current line at a fixed row while stepping
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without requiring a full lexer.

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn flush_word(spans: &mut Vec<Span<'static>>, word: &str, next: Option<char>) {
    if !word.is_empty() {
        spans.push(Span::styled(
            word.to_string(),
            get_keyword_style(word, next == Some('(')),
        ));
    }
}

/// Simple syntax highlighting for Python source
fn highlight_source_code(line: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut word_start: Option<usize> = None;
    let mut chars = line.char_indices();

    while let Some((i, c)) = chars.next() {
        // Handle comments
        if c == '#' {
            if let Some(start) = word_start.take() {
                flush_word(&mut spans, &line[start..i], Some(c));
            }
            spans.push(Span::styled(
                line[i..].to_string(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            return Line::from(spans);
        }

        // Handle strings
        if c == '"' || c == '\'' {
            if let Some(start) = word_start.take() {
                flush_word(&mut spans, &line[start..i], Some(c));
            }
            let mut end = line.len();
            while let Some((j, d)) = chars.next() {
                if d == '\\' {
                    chars.next();
                } else if d == c {
                    end = j + d.len_utf8();
                    break;
                }
            }
            spans.push(Span::styled(
                line[i..end].to_string(),
                Style::default().fg(DEFAULT_THEME.string), // Strings
            ));
            continue;
        }

        // Handle non-alphanumeric (delimiters)
        if !c.is_alphanumeric() && c != '_' {
            if let Some(start) = word_start.take() {
                flush_word(&mut spans, &line[start..i], Some(c));
            }

            // Color some operators/delimiters
            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary), // Brackets
                ':' | ',' | '.' => Style::default().fg(DEFAULT_THEME.fg),
                '+' | '-' | '*' | '/' | '=' | '%' | '!' | '<' | '>' => {
                    Style::default().fg(DEFAULT_THEME.fg)
                } // Operators
                _ => Style::default(),
            };

            spans.push(Span::styled(c.to_string(), style));
            continue;
        }

        if word_start.is_none() {
            word_start = Some(i);
        }
    }

    if let Some(start) = word_start {
        flush_word(&mut spans, &line[start..], None);
    }

    Line::from(spans)
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "def" | "class" | "return" | "if" | "elif" | "else" | "while" | "for" | "in" | "not"
        | "and" | "or" | "is" | "break" | "continue" | "pass" | "del" | "lambda" | "import"
        | "from" | "global" | "nonlocal" | "try" | "except" | "finally" | "raise" | "with"
        | "yield" => {
            Style::default()
                .fg(DEFAULT_THEME.keyword)
                .add_modifier(Modifier::BOLD) // Keywords
        }
        "None" | "True" | "False" => Style::default().fg(DEFAULT_THEME.number), // Constants
        "self" => Style::default().fg(DEFAULT_THEME.type_name),
        _ if word.chars().all(|c| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ => {
            if is_function {
                Style::default().fg(DEFAULT_THEME.function)
            } else {
                Style::default().fg(DEFAULT_THEME.fg) // Variables/Identifiers
            }
        }
    }
}

/// Scroll state for the source pane
#[derive(Debug, Default)]
pub struct SourceScrollState {
    pub offset: usize,
    pub target_line_row: Option<usize>,
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    current_line: Option<u32>,
    error_line: Option<u32>,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Source Code ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = source_code.lines().collect();
    let total_lines = lines.len();

    // Calculate visible range
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders (2), min 1

    // Keep the focus line at a fixed visual row, centered on first render
    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    let focus_line = error_line.or(current_line).map(|n| n as usize);
    if let Some(line) = focus_line.filter(|&n| n > 0 && n <= total_lines) {
        scroll_state.offset = (line - 1).saturating_sub(target_row);

        // Clamp scroll offset to valid range
        if total_lines > visible_height {
            let max_scroll = total_lines - visible_height;
            scroll_state.offset = scroll_state.offset.min(max_scroll);
        } else {
            scroll_state.offset = 0;
        }
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_error = error_line.is_some_and(|n| n as usize == line_num);
            let is_current = current_line.is_some_and(|n| n as usize == line_num);
            let line_num_str = format!("{:4} ", line_num);

            let (num_style, content_base_style) = if is_error {
                // ERROR LINE: Red background with bold line number
                (
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                    Style::default()
                        .bg(DEFAULT_THEME.error)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
            } else if is_current {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                    Style::default().bg(DEFAULT_THEME.current_line_bg),
                )
            } else {
                (
                    Style::default().fg(DEFAULT_THEME.comment), // Line numbers
                    Style::default(),
                )
            };

            let mut content_line = highlight_source_code(line);

            if is_error {
                for span in &mut content_line.spans {
                    span.style = content_base_style;
                }
            } else if is_current {
                for span in &mut content_line.spans {
                    span.style = span.style.patch(content_base_style);
                }
            }

            let mut final_spans = vec![Span::styled(line_num_str, num_style)];
            final_spans.extend(content_line.spans);

            Line::from(final_spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_highlight_preserves_text() {
        for src in [
            "def bubble_sort(arr):",
            "    arr[j], arr[j+1] = arr[j+1], arr[j]  # swap",
            "my_map[\"Alice\"] = 95",
            "name = 'héllo' # ünïcode",
            "s = \"unterminated",
        ] {
            assert_eq!(text(&highlight_source_code(src)), src);
        }
    }

    #[test]
    fn test_keywords_are_bold() {
        let line = highlight_source_code("def f(x):");
        assert_eq!(line.spans[0].content, "def");
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
    }
}
