use std::time::Instant;

use strum::IntoEnumIterator;

use super::input::Action;
use crate::{
    cli::config::TerminalConfig,
    core::{LogBuffer, NoticeLog, Terminal},
    protocol::{
        link::SerialConfig,
        ports::{self, PortEntry},
        session::PortSession,
    },
};

/// Baud rates offered by the picker.
pub const BAUD_RATES: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

const PERIOD_STEP_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Ports,
    SendField,
}

pub struct App {
    pub terminal: Terminal<LogBuffer, NoticeLog>,
    pub ports: Vec<PortEntry>,
    pub selected: usize,
    pub focus: Focus,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: TerminalConfig) -> Self {
        Self::with_ports(config, PortSession::new(), ports::available_ports())
    }

    /// Build an App around a given session and port list (useful for tests).
    pub fn with_ports(config: TerminalConfig, session: PortSession, ports: Vec<PortEntry>) -> Self {
        let selected = ports
            .iter()
            .position(|p| p.name == config.serial.port)
            .unwrap_or(0);
        let mut app = Self {
            terminal: Terminal::new(config, session, LogBuffer::default(), NoticeLog::new()),
            ports,
            selected,
            focus: Focus::Ports,
            should_quit: false,
        };
        if app.terminal.serial_config().port.is_empty() {
            app.apply_selection();
        }
        app
    }

    pub fn selected_port(&self) -> Option<&PortEntry> {
        self.ports.get(self.selected)
    }

    pub fn handle(&mut self, action: Action, now: Instant) {
        // An open notice swallows everything except its dismissal and quitting.
        if self.terminal.notifier().latest().is_some()
            && !matches!(action, Action::DismissNotice | Action::Quit)
        {
            return;
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::SwitchFocus => {
                self.focus = match self.focus {
                    Focus::Ports => Focus::SendField,
                    Focus::SendField => {
                        self.terminal.commit_send_field();
                        Focus::Ports
                    }
                }
            }
            Action::DismissNotice => {
                self.terminal.notifier_mut().dismiss();
            }
            Action::NextPort => self.next(),
            Action::PrevPort => self.prev(),
            Action::RefreshPorts => self.refresh(),
            Action::ToggleOpen => self.terminal.toggle_open(now),
            Action::CycleBaud => self.edit_serial(|serial| {
                serial.baud = BAUD_RATES
                    .iter()
                    .copied()
                    .find(|&b| b > serial.baud)
                    .unwrap_or(BAUD_RATES[0]);
            }),
            Action::CycleDataBits => self.edit_serial(|s| s.data_bits = cycle(s.data_bits)),
            Action::CycleStopBits => self.edit_serial(|s| s.stop_bits = cycle(s.stop_bits)),
            Action::CycleParity => self.edit_serial(|s| s.parity = cycle(s.parity)),
            Action::CycleFlowControl => {
                self.edit_serial(|s| s.flow_control = cycle(s.flow_control))
            }
            Action::Submit => self.terminal.submit(now),
            Action::Type(c) => {
                self.terminal.type_char(c);
            }
            Action::Backspace => {
                self.terminal.backspace();
            }
            Action::CursorLeft => self.terminal.move_cursor_left(),
            Action::CursorRight => self.terminal.move_cursor_right(),
            Action::ToggleSendMode => {
                let mode = self.terminal.send_mode().toggled();
                self.terminal.set_send_mode(mode);
            }
            Action::ToggleRecvMode => {
                let mode = self.terminal.recv_mode().toggled();
                self.terminal.set_recv_mode(mode);
            }
            Action::ToggleRepeat => {
                let enabled = !self.terminal.repeat().enabled;
                self.terminal.set_repeat_enabled(enabled);
            }
            Action::PeriodDown => {
                let period = self.terminal.repeat().period_ms.saturating_sub(PERIOD_STEP_MS);
                self.terminal.set_repeat_period(period);
            }
            Action::PeriodUp => {
                let period = self.terminal.repeat().period_ms.saturating_add(PERIOD_STEP_MS);
                self.terminal.set_repeat_period(period);
            }
            Action::ClearLog => self.terminal.clear_log(),
            Action::ResetReceived => self.terminal.reset_received_counter(),
            Action::ResetSent => self.terminal.reset_sent_counter(),
            Action::None => {}
        }
    }

    /// Re-scan available ports, keeping the current port selected if it is still there.
    pub fn refresh(&mut self) {
        let current = self.selected_port().map(|p| p.name.clone());
        self.ports = ports::available_ports();
        self.selected = current
            .and_then(|name| self.ports.iter().position(|p| p.name == name))
            .unwrap_or(0);
        self.apply_selection();
    }

    pub fn next(&mut self) {
        if !self.ports.is_empty() {
            self.selected = (self.selected + 1) % self.ports.len();
            self.apply_selection();
        }
    }

    pub fn prev(&mut self) {
        if !self.ports.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.ports.len() - 1);
            self.apply_selection();
        }
    }

    fn apply_selection(&mut self) {
        if let Some(name) = self.selected_port().map(|p| p.name.clone()) {
            self.edit_serial(|serial| serial.port = name);
        }
    }

    fn edit_serial(&mut self, edit: impl FnOnce(&mut SerialConfig)) {
        let mut serial = self.terminal.serial_config().clone();
        edit(&mut serial);
        self.terminal.set_serial_config(serial);
    }
}

/// Next variant in declaration order, wrapping around.
fn cycle<T: IntoEnumIterator + PartialEq + Copy>(current: T) -> T {
    let mut variants = T::iter().skip_while(|v| *v != current).skip(1);
    variants
        .next()
        .or_else(|| T::iter().next())
        .unwrap_or(current)
}
