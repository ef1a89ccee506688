use super::control_style;
use crate::model::{AppModel, FocusArea, TextInput};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Render the add-timer form: key field, interval field, add button
pub fn render_form(frame: &mut Frame, area: Rect, model: &AppModel) {
    let labels = &model.panel.labels;
    let controls = model.panel.controls;
    let add_label = format!("[ {} ]", labels.add);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Min(add_label.width() as u16 + 2),
        ])
        .split(area);

    render_input(
        frame,
        cols[0],
        &labels.key_field,
        &model.ui_state.key_input,
        model.ui_state.focus == FocusArea::KeyInput,
        controls.key_input,
    );
    render_input(
        frame,
        cols[1],
        &labels.interval_field,
        &model.ui_state.interval_input,
        model.ui_state.focus == FocusArea::IntervalInput,
        controls.interval_input,
    );

    let add = Paragraph::new(Line::from(Span::styled(
        add_label,
        control_style(controls.add, Color::Green),
    )))
    .block(Block::default().borders(Borders::NONE))
    .alignment(ratatui::layout::Alignment::Center);
    let button_area = Rect {
        y: cols[2].y + 1,
        height: 1,
        ..cols[2]
    };
    frame.render_widget(add, button_area);
}

fn render_input(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    input: &TextInput,
    is_focused: bool,
    enabled: bool,
) {
    let border_style = if !enabled {
        Style::default().fg(Color::DarkGray)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };

    let block = Block::default()
        .title(Span::styled(format!(" {} ", label), border_style))
        .borders(Borders::ALL)
        .border_style(border_style);

    let text_style = if enabled {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let inner = block.inner(area);
    let paragraph =
        Paragraph::new(Span::styled(input.value().to_string(), text_style)).block(block);
    frame.render_widget(paragraph, area);

    if is_focused && enabled && inner.width > 0 {
        let col = (input.cursor_column() as u16).min(inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(inner.x + col, inner.y));
    }
}
