use ratatui::{prelude::*, widgets::*};
use unicode_width::UnicodeWidthStr;

use crate::{
    core::ColorHint,
    tui::app::{App, Focus},
};

const ACCENT: Color = Color::Rgb(0, 150, 0);

const HELP: &str = concat!(
    "Tab focus  Enter open/send  b/d/s/p/f settings  F2/F3 modes  F4 repeat  ",
    "F5/F6 period  F7 clear  F8/F9 reset  F10 quit",
);

fn hint_style(hint: ColorHint) -> Style {
    match hint {
        ColorHint::Neutral => Style::default(),
        ColorHint::Info => Style::default().fg(Color::Gray),
        ColorHint::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ColorHint::Sent => Style::default().fg(Color::Green),
        ColorHint::Received => Style::default().fg(Color::Blue),
    }
}

fn panel(title: &str, focused: bool) -> Block<'static> {
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_type(BorderType::Plain);
    if focused {
        block.style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
    } else {
        block
    }
}

pub fn render_ui(f: &mut Frame, app: &App) {
    let area = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title + clock
            Constraint::Min(0),
            Constraint::Length(3), // send field
            Constraint::Length(1), // status
            Constraint::Length(1), // help
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[1]);

    render_title(f, app, rows[0]);
    render_ports(f, app, columns[0]);
    render_log(f, app, columns[1]);
    render_send_field(f, app, rows[2]);
    render_status(f, app, rows[3]);

    let help = Paragraph::new(HELP)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, rows[4]);

    if let Some(notice) = app.terminal.notifier().latest() {
        render_notice(f, area, &notice.title, &notice.message);
    }
}

fn render_title(f: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let title = Paragraph::new("hexterm")
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    f.render_widget(title, halves[0]);
    let clock = Paragraph::new(app.terminal.sink().clock().to_string()).alignment(Alignment::Right);
    f.render_widget(clock, halves[1]);
}

fn render_ports(f: &mut Frame, app: &App, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(7)])
        .split(area);

    let items: Vec<ListItem> = app.ports.iter().map(|p| ListItem::new(p.label())).collect();
    let list = List::new(items)
        .block(panel("Ports", app.focus == Focus::Ports))
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(0, 100, 0))
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    let mut state = ListState::default();
    if !app.ports.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, parts[0], &mut state);

    let serial = app.terminal.serial_config();
    let open_label = if app.terminal.is_open() { "Close" } else { "Open" };
    let settings = vec![
        Line::from(format!("Baud:   {}", serial.baud)),
        Line::from(format!("Data:   {}", serial.data_bits)),
        Line::from(format!("Stop:   {}", serial.stop_bits)),
        Line::from(format!("Parity: {}", serial.parity)),
        Line::from(format!("Flow:   {}  [{open_label}]", serial.flow_control)),
    ];
    f.render_widget(
        Paragraph::new(settings).block(panel("Settings", false)),
        parts[1],
    );
}

fn render_log(f: &mut Frame, app: &App, area: Rect) {
    let entries = app.terminal.sink().entries();
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = entries
        .iter()
        .skip(entries.len().saturating_sub(visible))
        .map(|e| Line::styled(e.message.clone(), hint_style(e.hint)))
        .collect();
    let log = Paragraph::new(lines)
        .block(panel("Log", false))
        .wrap(Wrap { trim: false });
    f.render_widget(log, area);
}

fn render_send_field(f: &mut Frame, app: &App, area: Rect) {
    let controls = app.terminal.controls();
    let field = app.terminal.send_field();
    let focused = app.focus == Focus::SendField;
    let title = format!(
        "Send [{}] ({})",
        app.terminal.send_mode(),
        controls.send_label
    );
    let style = if controls.input_enabled {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    f.render_widget(
        Paragraph::new(field.text.as_str())
            .style(style)
            .block(panel(&title, focused)),
        area,
    );

    if focused && controls.input_enabled {
        let before: String = field.text.chars().take(field.cursor).collect();
        let x = area.x + 1 + before.width() as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let counters = app.terminal.sink().counters();
    let repeat = app.terminal.repeat();
    let repeat_text = match (repeat.enabled, app.terminal.is_repeating()) {
        (_, true) => format!("repeating every {} ms", repeat.period_ms),
        (true, false) => format!("repeat every {} ms", repeat.period_ms),
        (false, false) => format!("repeat off ({} ms)", repeat.period_ms),
    };
    let text = format!(
        "{}  RX: {}  TX: {}  Recv [{}]  {}",
        app.terminal.session_state(),
        counters.received,
        counters.sent,
        app.terminal.recv_mode(),
        repeat_text
    );
    f.render_widget(
        Paragraph::new(text).style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        area,
    );
}

fn render_notice(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let width = (message.width() as u16 + 4).clamp(24, area.width.max(24));
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(5) / 2,
        width: width.min(area.width),
        height: 5.min(area.height),
    };
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(vec![
            Line::from(message.to_string()),
            Line::from(""),
            Line::from("Esc to dismiss"),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(panel(title, true)),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cli::config::TerminalConfig,
        protocol::{loopback::LoopbackHandle, ports::PortEntry, session::PortSession},
    };
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &ratatui::Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn renders_ports_log_and_notice() -> anyhow::Result<()> {
        let handle = LoopbackHandle::new();
        let mut app = App::with_ports(
            TerminalConfig::default(),
            PortSession::with_opener(handle.opener()),
            vec![PortEntry {
                name: "/dev/ttyUSB0".to_string(),
                description: "CH340".to_string(),
                kind: "usb",
            }],
        );
        let now = std::time::Instant::now();
        app.handle(crate::tui::input::Action::ToggleOpen, now);

        let mut terminal = ratatui::Terminal::new(TestBackend::new(120, 30))?;
        terminal.draw(|f| render_ui(f, &app))?;
        let text = buffer_text(&terminal);
        assert!(text.contains("/dev/ttyUSB0 #CH340"));
        assert!(text.contains("---- Serial port /dev/ttyUSB0 is open ----"));
        assert!(text.contains("RX: 0  TX: 0"));

        app.handle(crate::tui::input::Action::SwitchFocus, now);
        app.handle(crate::tui::input::Action::Submit, now);
        terminal.draw(|f| render_ui(f, &app))?;
        assert!(buffer_text(&terminal).contains("Data Send field cannot be blank"));
        Ok(())
    }
}
