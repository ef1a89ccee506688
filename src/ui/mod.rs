mod form;
mod status_bar;
mod timer_table;

use crate::app::App;
use crate::model::AppModel;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub use form::render_form;
pub use status_bar::{render_controls_bar, render_status_bar};
pub use timer_table::render_timer_table;

/// Main view function - renders the entire panel
pub fn view(frame: &mut Frame, app: &App) {
    draw(frame, &app.model);
}

fn draw(frame: &mut Frame, model: &AppModel) {
    // Guard against extremely small terminals to prevent panics
    if frame.area().width < 30 || frame.area().height < 10 {
        let msg = Paragraph::new("Terminal too small").style(Style::default().fg(Color::Red));
        frame.render_widget(msg, frame.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header (title + language)
            Constraint::Length(3), // Add-timer form
            Constraint::Min(4),    // Timer table
            Constraint::Length(1), // Start/stop controls
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], model);
    render_form(frame, chunks[1], model);
    render_timer_table(frame, chunks[2], model);
    render_controls_bar(frame, chunks[3], model);
    render_status_bar(frame, chunks[4], model);

    if model.ui_state.show_help {
        render_help(frame);
    }
}

/// Title on the left, connection state and language on the right
fn render_header(frame: &mut Frame, area: Rect, model: &AppModel) {
    let labels = &model.panel.labels;
    let title = if labels.title.is_empty() {
        "timerdeck"
    } else {
        labels.title.as_str()
    };

    let left = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(
            title.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ]));
    frame.render_widget(left, area);

    let (dot, dot_style) = if model.bridge_ready {
        ("●", Style::default().fg(Color::Green))
    } else {
        ("○", Style::default().fg(Color::Yellow))
    };
    let language = model
        .current_language
        .as_deref()
        .map(str::to_uppercase)
        .unwrap_or_else(|| "--".to_string());

    let right = Paragraph::new(Line::from(vec![
        Span::styled(dot, dot_style),
        Span::raw("  "),
        Span::styled(
            format!("{}: ", labels.language),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(language, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled(" [F2] ", Style::default().fg(Color::DarkGray)),
    ]))
    .alignment(Alignment::Right);
    frame.render_widget(right, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());

    let section = |name: &'static str| {
        Line::from(Span::styled(name, Style::default().add_modifier(Modifier::UNDERLINED)))
    };

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Form"),
        Line::from("  Tab/S-Tab  Cycle focus: Key → Interval → Timers"),
        Line::from("  Enter      Add timer"),
        Line::from(""),
        section("Timers"),
        Line::from("  j/k        Move down/up"),
        Line::from("  Space      Toggle active"),
        Line::from("  d/Del      Remove timer"),
        Line::from("  a          New timer (jump to Key)"),
        Line::from(""),
        section("Host"),
        Line::from("  F5         Start timers"),
        Line::from("  F6         Stop timers"),
        Line::from("  F2         Next language"),
        Line::from("  Ctrl-R     Refresh from host"),
        Line::from(""),
        Line::from("  F1         Toggle this help"),
        Line::from("  Ctrl-C     Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    // Clear area first
    frame.render_widget(Clear, area);
    frame.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Style for a control that may be disabled
fn control_style(enabled: bool, color: Color) -> Style {
    if enabled {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    }
}
