//! Data structure pane rendering
//!
//! Lays out one [`StepView`] as text: primitives, arrays with their pointer
//! labels, dicts, linked lists, the main tree and any detached nodes. Inserted
//! cells and new tree nodes are drawn in the highlight colour; red-black nodes
//! keep their colour.
//!
//! Line building is separated from drawing ([`structure_lines`]) so it can be
//! tested without a terminal.

use crate::diff::{SequenceEntry, StepView};
use crate::snapshot::{NodeColor, Scalar, TreeNode};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Format a scalar the way the traced (Python) program would print it
pub fn format_scalar(value: &Scalar) -> String {
    match value {
        Scalar::Null => "None".to_string(),
        Scalar::Bool(true) => "True".to_string(),
        Scalar::Bool(false) => "False".to_string(),
        Scalar::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn header(kind: &str, name: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{} ", kind),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!("“{}”", name),
            Style::default()
                .fg(DEFAULT_THEME.type_name)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

fn cell_style(highlighted: bool) -> Style {
    if highlighted {
        Style::default()
            .bg(DEFAULT_THEME.highlight)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

/// `[ 64 | 25 | 12 ]` plus a row of pointer labels aligned under the cells
fn array_lines(entry: &SequenceEntry) -> Vec<Line<'static>> {
    let mut lines = vec![header("Array", &entry.name)];
    if entry.values.is_empty() {
        lines.push(Line::styled(
            "  (empty)",
            Style::default().fg(DEFAULT_THEME.comment),
        ));
        return lines;
    }

    let sep = Style::default().fg(DEFAULT_THEME.comment);
    let mut cells = vec![Span::styled("  [", sep)];
    let mut labels = vec![Span::raw("   ")];
    let mut has_labels = false;

    for (i, value) in entry.values.iter().enumerate() {
        let text = format_scalar(value);
        let label = entry.labels_at(i).unwrap_or_default();
        has_labels |= !label.is_empty();
        let width = text.chars().count().max(label.chars().count());

        if i > 0 {
            cells.push(Span::styled("|", sep));
            labels.push(Span::raw(" "));
        }
        cells.push(Span::styled(
            format!(" {:^width$} ", text, width = width),
            cell_style(entry.highlight_index == Some(i)),
        ));
        labels.push(Span::styled(
            format!(" {:^width$} ", label, width = width),
            Style::default().fg(DEFAULT_THEME.pointer),
        ));
    }
    cells.push(Span::styled("]", sep));

    lines.push(Line::from(cells));
    if has_labels {
        lines.push(Line::from(labels));
    }
    lines
}

fn linked_list_lines(entry: &SequenceEntry) -> Vec<Line<'static>> {
    let mut lines = vec![header("Linked List", &entry.name)];
    if entry.values.is_empty() {
        lines.push(Line::styled(
            "  (empty)",
            Style::default().fg(DEFAULT_THEME.comment),
        ));
        return lines;
    }

    let mut spans = vec![Span::raw("  ")];
    for (i, value) in entry.values.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(
                " ➔ ",
                Style::default().fg(DEFAULT_THEME.primary),
            ));
        }
        spans.push(Span::styled(
            format!(" {} ", format_scalar(value)),
            cell_style(entry.highlight_index == Some(i)),
        ));
    }
    lines.push(Line::from(spans));
    lines
}

fn node_style(node: &TreeNode, highlighted: bool) -> Style {
    if highlighted {
        return cell_style(true);
    }
    match node.color {
        Some(NodeColor::Red) => Style::default()
            .fg(DEFAULT_THEME.rb_red)
            .add_modifier(Modifier::BOLD),
        Some(NodeColor::Black) => Style::default()
            .fg(DEFAULT_THEME.rb_black)
            .add_modifier(Modifier::BOLD),
        None => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Draw a tree top-down with box-drawing guides:
///
/// ```text
/// 50
/// ├─L 30
/// │ └─R 40
/// └─R 70
/// ```
fn tree_lines(root: &TreeNode, is_highlighted: impl Fn(&TreeNode) -> bool) -> Vec<Line<'static>> {
    let guide = Style::default().fg(DEFAULT_THEME.comment);
    let mut lines = Vec::new();
    // (node, indent prefix, branch drawn before the node, side label)
    let mut stack: Vec<(&TreeNode, String, &'static str, &'static str)> =
        vec![(root, String::from("  "), "", "")];

    while let Some((node, prefix, branch, side)) = stack.pop() {
        lines.push(Line::from(vec![
            Span::styled(format!("{}{}{}", prefix, branch, side), guide),
            Span::styled(
                format!(" {} ", format_scalar(&node.value)),
                node_style(node, is_highlighted(node)),
            ),
        ]));

        let child_prefix = match branch {
            "" => prefix.clone(),
            "└─" => format!("{}  ", prefix),
            _ => format!("{}│ ", prefix),
        };
        let children: Vec<(&TreeNode, &'static str)> = [
            node.left.as_deref().map(|n| (n, "L")),
            node.right.as_deref().map(|n| (n, "R")),
        ]
        .into_iter()
        .flatten()
        .collect();

        // Push in reverse so the left child is drawn first
        for (i, &(child, side)) in children.iter().enumerate().rev() {
            let branch = if i + 1 == children.len() { "└─" } else { "├─" };
            stack.push((child, child_prefix.clone(), branch, side));
        }
    }
    lines
}

/// All lines of the structure pane for one step
pub fn structure_lines(view: &StepView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let blank = || Line::raw("");

    if !view.primitives.is_empty() {
        lines.push(Line::styled(
            "Variables",
            Style::default().fg(DEFAULT_THEME.comment),
        ));
        for (name, value) in &view.primitives {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {}", name),
                    Style::default()
                        .fg(DEFAULT_THEME.fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(
                    format_scalar(value),
                    Style::default().fg(DEFAULT_THEME.number),
                ),
            ]));
        }
        lines.push(blank());
    }

    for entry in &view.array_entries {
        lines.extend(array_lines(entry));
        lines.push(blank());
    }

    for dict in &view.dict_entries {
        lines.push(header("Dict", &dict.name));
        if dict.entries.is_empty() {
            lines.push(Line::styled(
                "  (empty)",
                Style::default().fg(DEFAULT_THEME.comment),
            ));
        }
        for (key, value) in &dict.entries {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {}", key),
                    Style::default().fg(DEFAULT_THEME.string),
                ),
                Span::styled(" : ", Style::default().fg(DEFAULT_THEME.comment)),
                // Nested values are shown as JSON, like the tracer sent them
                Span::styled(value.to_string(), Style::default().fg(DEFAULT_THEME.fg)),
            ]));
        }
        lines.push(blank());
    }

    for entry in &view.linked_list_entries {
        lines.extend(linked_list_lines(entry));
        lines.push(blank());
    }

    if let Some(root) = &view.main_tree {
        lines.push(header("Tree", crate::snapshot::MAIN_TREE));
        lines.extend(tree_lines(root, |node| view.is_highlighted(node.id)));
        lines.push(blank());
    }

    for detached in &view.detached_trees {
        lines.push(header("New Node", &detached.name));
        lines.extend(tree_lines(&detached.node, |_| true));
        lines.push(blank());
    }

    lines
}

/// Render the data structure pane
pub fn render_structures_pane(
    frame: &mut Frame,
    area: Rect,
    view: Option<&StepView>,
    placeholder: &str,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let title = match view.and_then(|v| v.line_number) {
        Some(line) => format!(" Data Structures (line {}) ", line),
        None => " Data Structures ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let all_lines = match view {
        Some(view) => structure_lines(view),
        None => Vec::new(),
    };

    if all_lines.is_empty() {
        let paragraph = Paragraph::new(placeholder.to_string())
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders, min 1
    let total = all_lines.len();
    if total > visible_height {
        *scroll_offset = (*scroll_offset).min(total - visible_height);
    } else {
        *scroll_offset = 0;
    }

    let visible: Vec<Line> = all_lines
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(Paragraph::new(visible).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{build_step_view, CarryForwardCache};
    use crate::snapshot::Frame;
    use serde_json::json;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn render_text(view: &StepView) -> Vec<String> {
        structure_lines(view).iter().map(text).collect()
    }

    #[test]
    fn test_format_scalar_python_style() {
        assert_eq!(format_scalar(&json!(null)), "None");
        assert_eq!(format_scalar(&json!(true)), "True");
        assert_eq!(format_scalar(&json!("Bob")), "Bob");
        assert_eq!(format_scalar(&json!(2.5)), "2.5");
    }

    #[test]
    fn test_array_with_pointer_labels() {
        let frame: Frame = serde_json::from_value(json!({
            "lists": { "arr": [64, 5] },
            "array_indices": { "arr": [["i", 0], ["j", 1]] }
        }))
        .unwrap();
        let view = build_step_view(0, &frame, None, &CarryForwardCache::new());
        let lines = render_text(&view);

        assert_eq!(lines[0], "Array “arr”");
        assert_eq!(lines[1], "  [ 64 | 5 ]");
        assert_eq!(lines[2], "    i    j ");
    }

    #[test]
    fn test_tree_layout() {
        let frame: Frame = serde_json::from_value(json!({
            "trees": { "root": {
                "id": 1, "val": 50,
                "left": { "id": 2, "val": 30, "right": { "id": 4, "val": 40 } },
                "right": { "id": 3, "val": 70 }
            } }
        }))
        .unwrap();
        let view = build_step_view(0, &frame, None, &CarryForwardCache::new());
        let lines = render_text(&view);

        assert_eq!(
            lines,
            vec![
                "Tree “root”",
                "   50 ",
                "  ├─L 30 ",
                "  │ └─R 40 ",
                "  └─R 70 ",
                "",
            ]
        );
    }

    #[test]
    fn test_linked_list_and_dict() {
        let frame: Frame = serde_json::from_value(json!({
            "dicts": { "m": { "Alice": 95 } },
            "linked": { "head": [3, 1] }
        }))
        .unwrap();
        let view = build_step_view(0, &frame, None, &CarryForwardCache::new());
        let lines = render_text(&view);

        assert!(lines.contains(&"  Alice : 95".to_string()));
        assert!(lines.contains(&"   3  ➔  1 ".to_string()));
    }
}
