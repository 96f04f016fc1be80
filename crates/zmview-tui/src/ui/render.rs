use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, Screen};

use super::styles;

/// Field width of the login form inputs
const LOGIN_FIELD_WIDTH: usize = 28;

pub fn render(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Login => render_login(frame, app),
        Screen::Monitors => render_monitors(frame, app),
        Screen::Stream => render_stream(frame, app),
    }

    if matches!(app.state, AppState::ConfirmingLogout) {
        render_logout_overlay(frame);
    }
}

// ============================================================================
// Login screen
// ============================================================================

fn render_login(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(50, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("  zmview", styles::title_style())),
        Line::from(Span::styled(
            "  ZoneMinder terminal viewer",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    lines.push(login_field(
        "Host",
        &app.login_host,
        app.login_focus == LoginFocus::Host,
    ));
    lines.push(login_field(
        "User",
        &app.login_user,
        app.login_focus == LoginFocus::User,
    ));
    let masked: String = "*".repeat(app.login_password.len().min(LOGIN_FIELD_WIDTH));
    lines.push(login_field(
        "Password",
        &masked,
        app.login_focus == LoginFocus::Password,
    ));

    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(""));
    let button_label = if button_focused {
        " ▶ Connect ◀ "
    } else {
        "   Connect   "
    };
    lines.push(Line::from(vec![
        Span::raw("               ["),
        Span::styled(button_label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Tab next · Enter submit · Esc quit",
        styles::muted_style(),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn login_field<'a>(label: &'a str, value: &str, focused: bool) -> Line<'a> {
    let field_style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let display = format!("{:<width$}", value, width = LOGIN_FIELD_WIDTH);
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:>8}: [", label), styles::muted_style()),
        Span::styled(format!("{}{}", display, cursor), field_style),
        Span::styled("]", styles::muted_style()),
    ])
}

// ============================================================================
// Monitors screen
// ============================================================================

fn render_monitors(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(5),    // Monitor table
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_monitor_table(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let host = app
        .client
        .credentials()
        .map(|c| c.host.as_str())
        .unwrap_or("-");
    let title = format!("  zmview · {}", host);
    let count = format!("{} monitors", app.monitors.len());

    let line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + count.len() as u16 + 4) as usize,
        )),
        Span::styled(count, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_monitor_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["", "Name", "Function", "Events Today", "Status"])
        .style(styles::muted_style())
        .bottom_margin(1);

    let rows: Vec<Row> = app
        .monitors
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let marker = if m.enabled { "●" } else { "○" };
            let row_style = if i == app.selected {
                styles::selected_style()
            } else if m.enabled {
                styles::list_item_style()
            } else {
                styles::muted_style()
            };
            Row::new(vec![
                Span::raw(marker.to_string()),
                Span::raw(m.name.clone()),
                Span::raw(m.function.clone()),
                Span::raw(m.day_events.to_string()),
                Span::styled(m.status.clone(), styles::monitor_status_style(&m.status)),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Percentage(35),
        Constraint::Percentage(20),
        Constraint::Length(14),
        Constraint::Percentage(20),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::NONE)
            .style(Style::default()),
    );
    frame.render_widget(table, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(ref status) = app.status {
        Line::from(Span::styled(format!("  {}", status), styles::error_style()))
    } else {
        let expiry = app
            .client
            .token()
            .map(|t| format!("token {}m", t.minutes_until_expiry()))
            .unwrap_or_default();
        Line::from(vec![
            Span::styled("  ↑↓", styles::help_key_style()),
            Span::raw(" select  "),
            Span::styled("Enter", styles::help_key_style()),
            Span::raw(" view  "),
            Span::styled("r", styles::help_key_style()),
            Span::raw(" refresh  "),
            Span::styled("L", styles::help_key_style()),
            Span::raw(" logout  "),
            Span::styled("q", styles::help_key_style()),
            Span::raw(" quit  "),
            Span::styled(expiry, styles::muted_style()),
        ])
    };

    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()),
        area,
    );
}

// ============================================================================
// Stream screen
// ============================================================================

fn render_stream(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(5),    // Details + URL
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    let name = app
        .stream_monitor
        .as_ref()
        .map(|m| m.name.as_str())
        .unwrap_or("-");
    let title = Line::from(Span::styled(
        format!("  zmview · {}", name),
        styles::title_style(),
    ));
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(title).block(block), chunks[0]);

    let mut lines = Vec::new();
    if let Some(ref monitor) = app.stream_monitor {
        lines.push(Line::from(vec![
            Span::styled("  Monitor:  ", styles::muted_style()),
            Span::raw(format!("{} (id {})", monitor.name, monitor.id)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("  Function: ", styles::muted_style()),
            Span::raw(monitor.function.clone()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("  Status:   ", styles::muted_style()),
            Span::styled(
                monitor.status.clone(),
                styles::monitor_status_style(&monitor.status),
            ),
        ]));
        lines.push(Line::from(vec![
            Span::styled("  Events:   ", styles::muted_style()),
            Span::raw(format!("{} today", monitor.day_events)),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Live MJPEG stream (open in a browser or media player):",
            styles::list_item_style(),
        )));
        lines.push(Line::from(""));
        if let Some(ref url) = app.stream_url {
            lines.push(Line::from(Span::styled(
                format!("  {}", url),
                styles::help_key_style(),
            )));
        }
    }

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        chunks[1],
    );

    let hint = Line::from(vec![
        Span::styled("  Esc", styles::help_key_style()),
        Span::raw(" back  "),
        Span::styled("q", styles::help_key_style()),
        Span::raw(" quit"),
    ]);
    frame.render_widget(
        Paragraph::new(hint).style(styles::status_bar_style()),
        chunks[2],
    );
}

// ============================================================================
// Overlays
// ============================================================================

fn render_logout_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(44, 5, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Log out and forget this server? "),
            Span::styled("y", styles::help_key_style()),
            Span::raw("/"),
            Span::styled("N", styles::help_key_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
