//! Field rendering utilities for forms

use formwright::forms::{FieldDescriptor, FieldKind, FieldStatus, FieldValue, Snapshot};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Rows a field occupies
pub fn field_height(field: &FieldDescriptor) -> u16 {
    match field.kind {
        FieldKind::Divider => 1,
        FieldKind::Textarea => 6,
        _ => 3,
    }
}

/// Draw one field with its current value and validation status
pub fn draw_field(
    frame: &mut Frame,
    area: Rect,
    field: &FieldDescriptor,
    values: &Snapshot,
    status: Option<&FieldStatus>,
    is_active: bool,
    option_cursor: usize,
) {
    let value = values.get(&field.name);
    match &field.kind {
        FieldKind::Divider => {
            let rule = "─".repeat(area.width as usize);
            frame.render_widget(
                Paragraph::new(rule).style(Style::default().fg(Color::DarkGray)),
                area,
            );
            return;
        }
        FieldKind::SubmitButton { label }
        | FieldKind::ResetButton { label }
        | FieldKind::Button { label } => {
            render_button(frame, area, label, is_active, field.is_disabled(values));
            return;
        }
        _ => {}
    }

    let border_style = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let title = if field.required {
        format!(" {} * ", field.label)
    } else {
        format!(" {} ", field.label)
    };
    let mut block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    if let Some(line) = status.and_then(status_line) {
        block = block.title_bottom(line);
    }

    let content = match field.kind.options() {
        Some(_) => option_line(field, value, is_active, option_cursor),
        None => text_line(field, value, is_active),
    };

    frame.render_widget(
        Paragraph::new(content)
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn status_line(status: &FieldStatus) -> Option<Line<'static>> {
    match status {
        FieldStatus::Unvalidated => None,
        FieldStatus::Pending => Some(Line::from(Span::styled(
            " checking… ",
            Style::default().fg(Color::Yellow),
        ))),
        FieldStatus::Valid => Some(Line::from(Span::styled(
            " ✓ ",
            Style::default().fg(Color::Green),
        ))),
        FieldStatus::Invalid(messages) => Some(Line::from(Span::styled(
            format!(" {} ", messages.join("; ")),
            Style::default().fg(Color::Red),
        ))),
    }
}

fn text_line<'a>(field: &'a FieldDescriptor, value: Option<&FieldValue>, is_active: bool) -> Vec<Line<'a>> {
    let text = value.map(FieldValue::as_text).unwrap_or_default();
    let display = match field.kind {
        FieldKind::Password => "*".repeat(text.chars().count()),
        _ => text.to_string(),
    };

    if display.is_empty() && !is_active {
        let hint = field.placeholder.as_deref().unwrap_or("(empty)");
        return vec![Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let style = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let mut lines: Vec<Line> = display
        .split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect();
    if is_active {
        if let Some(last) = lines.last_mut() {
            last.spans
                .push(Span::styled("▌", Style::default().fg(Color::Cyan)));
        }
    }
    lines
}

fn option_line<'a>(
    field: &'a FieldDescriptor,
    value: Option<&FieldValue>,
    is_active: bool,
    option_cursor: usize,
) -> Vec<Line<'a>> {
    let options = field.kind.options().unwrap_or_default();
    let mut spans = vec![];
    for (idx, option) in options.iter().enumerate() {
        let selected = match value {
            Some(FieldValue::Multi(items)) => items.contains(&option.value),
            Some(FieldValue::Single(current)) => current == &option.value,
            None => false,
        };
        let marker = match (field.kind.is_multi(), selected) {
            (true, true) => "[x]",
            (true, false) => "[ ]",
            (false, true) => "(•)",
            (false, false) => "( )",
        };
        let style = if is_active && idx == option_cursor {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if selected {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if idx > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(format!("{marker} {}", option.label), style));
    }
    vec![Line::from(spans)]
}

/// Render a bordered button
fn render_button(frame: &mut Frame, area: Rect, label: &str, is_selected: bool, disabled: bool) {
    let border_style = if is_selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let text_style = if disabled {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    } else if is_selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let width = (label.chars().count() as u16 + 4).min(area.width);
    let area = Rect { width, ..area };
    let paragraph = Paragraph::new(format!(" {label} ")).style(text_style);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(paragraph.block(block), area);
}
