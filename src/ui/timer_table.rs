use super::control_style;
use crate::model::{AppModel, FocusArea};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

/// Render the timer list exactly in the order the panel holds it
pub fn render_timer_table(frame: &mut Frame, area: Rect, model: &AppModel) {
    let is_focused = model.ui_state.focus == FocusArea::TimerTable;
    let labels = &model.panel.labels;
    let rows = &model.panel.table.rows;

    let block = Block::default()
        .title(Line::from(vec![
            Span::styled(
                " Timers ",
                if is_focused {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                },
            ),
            Span::styled(
                format!("({}) ", rows.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .borders(Borders::ALL)
        .border_style(if is_focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        });
    let inner = block.inner(area);

    let header_style = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from(labels.col_active.clone()),
        Cell::from(labels.col_key.clone()),
        Cell::from(labels.col_interval.clone()),
        Cell::from(labels.col_actions.clone()),
    ])
    .style(header_style);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let checkbox = if row.checked { "[x]" } else { "[ ]" };
            let check_color = if row.checked { Color::Green } else { Color::Gray };
            let text_style = if row.toggle_enabled {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Row::new(vec![
                Cell::from(Span::styled(
                    checkbox,
                    control_style(row.toggle_enabled, check_color),
                )),
                Cell::from(Span::styled(row.key.clone(), text_style)),
                Cell::from(Span::styled(row.interval.clone(), text_style)),
                Cell::from(Span::styled(
                    format!("[{}]", row.remove_label),
                    control_style(row.remove_enabled, Color::Red),
                )),
            ])
        })
        .collect();

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(8),
            Constraint::Percentage(35),
            Constraint::Percentage(30),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(if is_focused {
        Style::default().bg(Color::Blue)
    } else {
        Style::default()
    })
    .highlight_symbol("▶ ");

    let mut state = TableState::default().with_selected(model.ui_state.selected_row);
    frame.render_stateful_widget(table, area, &mut state);

    if model.timers.is_empty() && inner.height > 1 {
        let hint = if model.bridge_ready {
            "No timers yet"
        } else {
            "Waiting for host..."
        };
        let hint_area = Rect {
            y: inner.y + 1,
            height: 1,
            ..inner
        };
        let empty = Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray)));
        frame.render_widget(empty, hint_area);
    }
}
