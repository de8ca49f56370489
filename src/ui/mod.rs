//! UI module for rendering the wizard

mod field_renderer;

use crate::app::App;
use field_renderer::{draw_field, field_height};
use formwright::forms::{FieldKind, WizardStatus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const HINTS: &str = "Tab:next  Space:select  Enter:continue  ^P:back  ^R:reset  Esc:cancel";

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Step header
            Constraint::Min(0),    // Current step's form
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_form(frame, chunks[1], app);
    draw_status_bar(frame, chunks[2], app);
}

/// Step markers with the current step highlighted
fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let current = match app.wizard.status() {
        WizardStatus::Active { step, .. } => Some(step),
        WizardStatus::Finished | WizardStatus::Cancelled => None,
    };

    let mut spans = vec![];
    for (idx, step) in app.wizard.steps().iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
        }
        let style = match current {
            Some(current) if current == idx => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            Some(current) if idx < current => Style::default().fg(Color::Green),
            _ => Style::default().fg(Color::DarkGray),
        };
        spans.push(Span::styled(format!("{}. {}", idx + 1, step.title), style));
    }

    let block = Block::default()
        .title(" Map external claim ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_form(frame: &mut Frame, area: Rect, app: &App) {
    let Some(step) = app.wizard.current_step() else {
        return;
    };
    let fields = step.form.fields();
    let values = step.form.snapshot();
    let report = step.form.validation();

    let block = Block::default()
        .title(format!(" {} ", step.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block, area);

    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|field| Constraint::Length(field_height(field)))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(area);

    let mut focus_index = 0;
    for (field, chunk) in fields.iter().zip(chunks.iter()) {
        let is_active = match field.kind {
            FieldKind::Divider => false,
            _ => {
                focus_index += 1;
                focus_index - 1 == app.active_field
            }
        };
        draw_field(
            frame,
            *chunk,
            field,
            &values,
            report.status(&field.name),
            is_active,
            app.option_cursor,
        );
    }
}

/// Draw the status bar
fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        format!(" {HINTS}"),
        Style::default().fg(Color::Gray),
    )];

    if let Some(msg) = &app.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Yellow)));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);
}
