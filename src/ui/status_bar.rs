use super::control_style;
use crate::model::{AppModel, StatusKind, UiMode};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the start/stop buttons and the current mode
pub fn render_controls_bar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let labels = &model.panel.labels;
    let controls = model.panel.controls;

    let buttons = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(format!("[F5 {}]", labels.start), control_style(controls.start, Color::Green)),
        Span::raw("  "),
        Span::styled(format!("[F6 {}]", labels.stop), control_style(controls.stop, Color::Red)),
    ]));
    frame.render_widget(buttons, area);

    let (mode_color, active) = match model.mode {
        UiMode::Editing => (Color::Cyan, model.timers.active_count()),
        UiMode::Running => (Color::Green, model.timers.active_count()),
    };
    let summary = Paragraph::new(Line::from(vec![
        Span::styled(
            model.mode.label(),
            Style::default().fg(mode_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}/{} {} ", active, model.timers.len(), labels.col_active),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .alignment(Alignment::Right);
    frame.render_widget(summary, area);
}

/// Render the status message, or key hints when there is none
pub fn render_status_bar(frame: &mut Frame, area: Rect, model: &AppModel) {
    if let Some(ref msg) = model.ui_state.status_message {
        let bg = match msg.kind {
            StatusKind::Info => Color::Blue,
            StatusKind::Error => Color::Red,
        };
        let status = Paragraph::new(Span::styled(
            format!(" {} ", msg.text),
            Style::default().fg(Color::White).bg(bg),
        ));
        frame.render_widget(status, area);
        return;
    }

    let hints = Line::from(vec![
        Span::styled(" Tab", Style::default().fg(Color::Cyan)),
        Span::raw(" focus  "),
        Span::styled("Space", Style::default().fg(Color::Cyan)),
        Span::raw(" toggle  "),
        Span::styled("d", Style::default().fg(Color::Cyan)),
        Span::raw(" remove  "),
        Span::styled("F1", Style::default().fg(Color::Cyan)),
        Span::raw(" help  "),
        Span::styled("^C", Style::default().fg(Color::Cyan)),
        Span::raw(" quit"),
    ]);
    let status = Paragraph::new(hints).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status, area);
}
