//! The terminal session object.
//!
//! `Terminal` owns every piece of per-session state (port, aggregator, scheduler,
//! timers, counters, modes, send field) and is driven entirely from outside: the
//! host calls the action methods on user input and `poll(now)` whenever a timer
//! deadline passes. Output goes back through `DisplaySink` and `Notifier`.

use std::time::{Duration, Instant};

use chrono::Local;

use super::{
    sink::{ColorHint, Counters, DisplaySink, Notifier},
    timer::{TimerKind, Timers},
};
use crate::{
    cli::config::TerminalConfig,
    protocol::{
        aggregator::ReceiveAggregator,
        codec::TransmitMode,
        formatter::{self, EditState, HexInputFormatter, Validity},
        link::{OpenError, SerialConfig},
        scheduler::{
            Controls, RepeatConfig, SentFrame, TransmitError, TransmitOutcome, TransmitScheduler,
        },
        session::{IoError, PortSession, SessionState},
    },
};

const HINT_TITLE: &str = "Hint";

pub struct Terminal<S: DisplaySink, N: Notifier> {
    session: PortSession,
    serial: SerialConfig,
    aggregator: ReceiveAggregator,
    scheduler: TransmitScheduler,
    timers: Timers,
    counters: Counters,
    send_mode: TransmitMode,
    recv_mode: TransmitMode,
    repeat: RepeatConfig,
    send_field: EditState,
    formatter: HexInputFormatter,
    poll_interval: Duration,
    clock_interval: Duration,
    sink: S,
    notifier: N,
}

impl<S: DisplaySink, N: Notifier> Terminal<S, N> {
    pub fn new(config: TerminalConfig, session: PortSession, sink: S, notifier: N) -> Self {
        let formatter = match config.hex_max_bytes {
            Some(max) => HexInputFormatter::with_max_bytes(max),
            None => HexInputFormatter::new(),
        };
        Self {
            session,
            serial: config.serial,
            aggregator: ReceiveAggregator::new(),
            scheduler: TransmitScheduler::new(),
            timers: Timers::new(),
            counters: Counters::default(),
            send_mode: config.send_mode,
            recv_mode: config.recv_mode,
            repeat: config.repeat,
            send_field: EditState::default(),
            formatter,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            clock_interval: Duration::from_millis(config.clock_interval_ms),
            sink,
            notifier,
        }
    }

    /// Start the clock and publish the initial status.
    pub fn start(&mut self, now: Instant) {
        self.timers
            .schedule_repeating(TimerKind::Clock, self.clock_interval, now);
        self.refresh_clock();
        self.sink.update_counters(self.counters);
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    pub fn serial_config(&self) -> &SerialConfig {
        &self.serial
    }

    /// Takes effect on the next open.
    pub fn set_serial_config(&mut self, serial: SerialConfig) {
        self.serial = serial;
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn controls(&self) -> Controls {
        self.scheduler.controls()
    }

    pub fn is_repeating(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn send_mode(&self) -> TransmitMode {
        self.send_mode
    }

    pub fn recv_mode(&self) -> TransmitMode {
        self.recv_mode
    }

    pub fn repeat(&self) -> RepeatConfig {
        self.repeat
    }

    pub fn send_field(&self) -> &EditState {
        &self.send_field
    }

    /// Earliest instant at which `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn open(&mut self, now: Instant) -> Result<(), OpenError> {
        let name = display_name(&self.serial.port).to_string();
        match self.session.open(&self.serial) {
            Ok(()) => {
                self.aggregator.reset();
                self.timers
                    .schedule_repeating(TimerKind::ReceivePoll, self.poll_interval, now);
                self.sink.append_line(
                    &format!("---- Serial port {name} is open ----"),
                    ColorHint::Neutral,
                );
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to open {}: {err}", self.serial.port);
                self.sink.append_line(
                    &format!("**** Unable to open serial port {name}. ****"),
                    ColorHint::Error,
                );
                self.notifier.notify("Open failed", &err.to_string());
                Err(err)
            }
        }
    }

    /// Close the port. Timers tied to the session are cancelled first.
    pub fn close(&mut self) {
        self.stop_session_timers();
        if let Some(name) = self.session.port_name().map(|n| display_name(n).to_string()) {
            self.session.close();
            self.sink.append_line(
                &format!("---- Serial port {name} closed ----"),
                ColorHint::Neutral,
            );
        }
    }

    /// The Open/Close button.
    pub fn toggle_open(&mut self, now: Instant) {
        if self.session.is_open() {
            self.close();
        } else {
            // Failure is already reported through the sink and notifier.
            let _ = self.open(now);
        }
    }

    /// The Send/Stop button.
    pub fn submit(&mut self, now: Instant) {
        let result = self.scheduler.submit(
            &self.send_field.text,
            self.send_mode,
            &mut self.repeat,
            &mut self.session,
            &mut self.timers,
            now,
        );
        match result {
            Ok(TransmitOutcome::Sent(frame)) | Ok(TransmitOutcome::Armed(frame)) => {
                self.record_sent(&frame)
            }
            Ok(TransmitOutcome::Disarmed) => {}
            Err(err) => self.transmit_failed(err),
        }
    }

    /// Offer a new send field state. Returns how the edit was classified; an
    /// `Invalid` edit leaves the field unchanged.
    pub fn edit_send_field(&mut self, candidate: EditState) -> Validity {
        if !self.scheduler.controls().input_enabled {
            return Validity::Invalid;
        }
        self.apply_edit(candidate)
    }

    /// Replace the field content programmatically. Unlike keystrokes this also
    /// works while a repeat is armed; the next tick sends the new content.
    pub fn set_send_field(&mut self, text: &str) -> Validity {
        self.apply_edit(EditState::at_end(text))
    }

    /// Normalize a Hex field once it loses focus: `"AB C"` becomes `"AB 0C"`.
    pub fn commit_send_field(&mut self) {
        if self.send_mode == TransmitMode::Hex {
            let normalized = formatter::normalize(&self.send_field.text);
            if normalized != self.send_field.text {
                self.send_field = EditState::at_end(normalized);
            }
        }
    }

    fn apply_edit(&mut self, mut candidate: EditState) -> Validity {
        let validity = match self.send_mode {
            TransmitMode::Ascii => Validity::Acceptable,
            TransmitMode::Hex => self.formatter.validate(&mut candidate),
        };
        if validity != Validity::Invalid {
            self.send_field = candidate;
        }
        validity
    }

    pub fn type_char(&mut self, c: char) -> Validity {
        let candidate = self.send_field.with_inserted(c);
        self.edit_send_field(candidate)
    }

    pub fn backspace(&mut self) -> Validity {
        let candidate = self.send_field.with_backspace();
        self.edit_send_field(candidate)
    }

    pub fn move_cursor_left(&mut self) {
        self.send_field.move_left();
    }

    pub fn move_cursor_right(&mut self) {
        self.send_field.move_right();
    }

    pub fn set_send_mode(&mut self, mode: TransmitMode) {
        self.send_mode = mode;
    }

    pub fn set_recv_mode(&mut self, mode: TransmitMode) {
        self.recv_mode = mode;
    }

    /// Turning repetition off stops a running repeat.
    pub fn set_repeat_enabled(&mut self, enabled: bool) {
        if enabled && !self.scheduler.controls().repeat_toggle_enabled {
            return;
        }
        self.repeat.enabled = enabled;
        if !enabled {
            self.scheduler.stop(&mut self.timers);
        }
    }

    /// Applies to the next arm; a running repeat keeps its period.
    pub fn set_repeat_period(&mut self, period_ms: u64) {
        self.repeat.period_ms = period_ms;
    }

    pub fn reset_received_counter(&mut self) {
        self.counters.reset_received();
        self.sink.update_counters(self.counters);
    }

    pub fn reset_sent_counter(&mut self) {
        self.counters.reset_sent();
        self.sink.update_counters(self.counters);
    }

    pub fn clear_log(&mut self) {
        self.sink.clear();
    }

    /// Run every timer that is due at `now`.
    pub fn poll(&mut self, now: Instant) {
        while let Some(kind) = self.timers.pop_due(now) {
            match kind {
                TimerKind::Clock => self.refresh_clock(),
                TimerKind::ReceivePoll => self.poll_receive(),
                TimerKind::TransmitRepeat => self.repeat_transmit(),
            }
        }
    }

    fn refresh_clock(&mut self) {
        let clock = Local::now().format("%Y-%m-%d %A %p %I:%M:%S").to_string();
        self.sink.update_clock(&clock);
    }

    fn poll_receive(&mut self) {
        match self.aggregator.tick(&mut self.session, self.recv_mode) {
            Ok(Some(message)) => {
                self.counters.record_received();
                self.sink
                    .append_line(&header("RECV", message.mode), ColorHint::Info);
                self.sink.append_line(&message.rendered, ColorHint::Received);
                self.sink.update_counters(self.counters);
            }
            Ok(None) => {}
            Err(err) => self.connection_lost(err),
        }
    }

    fn repeat_transmit(&mut self) {
        let result = self.scheduler.on_repeat_tick(
            &self.send_field.text,
            self.send_mode,
            &mut self.session,
            &mut self.timers,
        );
        match result {
            Ok(Some(frame)) => self.record_sent(&frame),
            Ok(None) => {}
            Err(err) => self.transmit_failed(err),
        }
    }

    fn record_sent(&mut self, frame: &SentFrame) {
        self.counters.record_sent();
        self.sink
            .append_line(&header("SEND", frame.mode), ColorHint::Info);
        self.sink.append_line(&frame.rendered, ColorHint::Sent);
        self.sink.update_counters(self.counters);
    }

    fn transmit_failed(&mut self, err: TransmitError) {
        match err {
            TransmitError::NotOpen => {
                let name = display_name(&self.serial.port).to_string();
                self.notifier.notify(
                    HINT_TITLE,
                    &format!("**** The serial port {name} has not been opened. ****"),
                );
            }
            TransmitError::BlankField => {
                self.notifier
                    .notify(HINT_TITLE, "Data Send field cannot be blank");
            }
            TransmitError::InvalidPeriod => {
                self.notifier
                    .notify(HINT_TITLE, "Repeat period must be greater than zero");
            }
            TransmitError::Malformed { source } => {
                self.notifier.notify(
                    HINT_TITLE,
                    &format!("Data Send can only fill in [0-9], [a-f], [A-F] ({source})"),
                );
            }
            TransmitError::Io { source } => self.connection_lost(source),
        }
    }

    /// The device went away: force the session closed and tell the user.
    fn connection_lost(&mut self, err: IoError) {
        log::error!("Serial I/O failed, closing session: {err}");
        self.stop_session_timers();
        let name = self
            .session
            .port_name()
            .map(|n| display_name(n).to_string())
            .unwrap_or_default();
        self.session.close();
        self.sink.append_line(
            &format!("**** Serial port {name} disconnected. ****"),
            ColorHint::Error,
        );
        self.notifier.notify("Serial port error", &err.to_string());
    }

    fn stop_session_timers(&mut self) {
        self.scheduler.stop(&mut self.timers);
        self.timers.cancel(TimerKind::ReceivePoll);
        self.aggregator.reset();
    }
}

/// Port picker entries read `name #description`; only the name is shown in
/// session lines.
fn display_name(port: &str) -> &str {
    port.split(" #").next().unwrap_or(port)
}

fn header(direction: &str, mode: TransmitMode) -> String {
    format!(
        "[{}]# {direction} {mode}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
    )
}
