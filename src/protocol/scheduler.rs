//! One-shot and repeating transmission.
//!
//! The scheduler decides what a "Send" press means given the repeat settings and
//! its own state, performs the write through `PortSession`, and keeps the
//! dependent controls (send field, repeat toggle, Send/Stop label) consistent.
//! Repeat timing lives in `core::timer::Timers`; the scheduler only arms and
//! cancels the `TransmitRepeat` slot, always cancelling before it resets state.

use std::time::{Duration, Instant};

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use super::{
    codec::{self, DecodeError, TransmitMode},
    formatter,
    session::{IoError, PortSession},
};
use crate::core::timer::{TimerKind, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatConfig {
    pub enabled: bool,
    pub period_ms: u64,
}

impl RepeatConfig {
    pub fn every(period_ms: u64) -> Self {
        Self {
            enabled: true,
            period_ms,
        }
    }

    pub fn once() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum SchedulerState {
    #[default]
    Idle,
    ArmedRepeating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SendLabel {
    Send,
    Stop,
}

/// Enabled state of the widgets the scheduler governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub input_enabled: bool,
    pub repeat_toggle_enabled: bool,
    pub send_label: SendLabel,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            input_enabled: true,
            repeat_toggle_enabled: true,
            send_label: SendLabel::Send,
        }
    }
}

/// A frame that was written to the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub bytes: Vec<u8>,
    pub mode: TransmitMode,
    pub rendered: String,
}

#[derive(Debug, PartialEq)]
pub enum TransmitOutcome {
    /// One-shot write.
    Sent(SentFrame),
    /// Repetition armed; carries the immediate first write.
    Armed(SentFrame),
    /// A running repetition was stopped by the user.
    Disarmed,
}

#[derive(Debug, Display, Error)]
pub enum TransmitError {
    #[display("serial port is not open")]
    NotOpen,
    #[display("send field is blank")]
    BlankField,
    #[display("repeat period must be greater than zero")]
    InvalidPeriod,
    #[display("send field is not valid hex: {source}")]
    Malformed { source: DecodeError },
    #[display("{source}")]
    Io { source: IoError },
}

impl TransmitError {
    /// Errors that end the session rather than just the current send.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransmitError::Io {
                source: IoError::Device { .. }
            }
        )
    }
}

impl From<IoError> for TransmitError {
    fn from(source: IoError) -> Self {
        match source {
            IoError::NotOpen => TransmitError::NotOpen,
            source => TransmitError::Io { source },
        }
    }
}

impl From<DecodeError> for TransmitError {
    fn from(source: DecodeError) -> Self {
        TransmitError::Malformed { source }
    }
}

#[derive(Debug, Default)]
pub struct TransmitScheduler {
    state: SchedulerState,
    controls: Controls,
}

impl TransmitScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn is_armed(&self) -> bool {
        self.state == SchedulerState::ArmedRepeating
    }

    /// Handle a Send/Stop press.
    ///
    /// A zero repeat period is rejected and switches `repeat` off.
    pub fn submit(
        &mut self,
        text: &str,
        mode: TransmitMode,
        repeat: &mut RepeatConfig,
        session: &mut PortSession,
        timers: &mut Timers,
        now: Instant,
    ) -> Result<TransmitOutcome, TransmitError> {
        if !session.is_open() {
            return Err(TransmitError::NotOpen);
        }

        if self.is_armed() {
            self.stop(timers);
            return Ok(TransmitOutcome::Disarmed);
        }

        if !repeat.enabled {
            self.release_controls();
            return Self::send_once(text, mode, session).map(TransmitOutcome::Sent);
        }

        if repeat.period_ms == 0 {
            repeat.enabled = false;
            log::warn!("Refusing to arm periodic send with a zero period");
            return Err(TransmitError::InvalidPeriod);
        }

        timers.schedule_repeating(
            TimerKind::TransmitRepeat,
            Duration::from_millis(repeat.period_ms),
            now,
        );
        self.state = SchedulerState::ArmedRepeating;
        self.controls = Controls {
            input_enabled: false,
            repeat_toggle_enabled: false,
            send_label: SendLabel::Stop,
        };
        log::info!("Periodic send armed every {} ms", repeat.period_ms);

        match Self::send_once(text, mode, session) {
            Ok(frame) => Ok(TransmitOutcome::Armed(frame)),
            Err(err) => {
                self.stop(timers);
                Err(err)
            }
        }
    }

    /// Handle a `TransmitRepeat` tick. `text` is the current send field, which the
    /// user may have changed since arming.
    pub fn on_repeat_tick(
        &mut self,
        text: &str,
        mode: TransmitMode,
        session: &mut PortSession,
        timers: &mut Timers,
    ) -> Result<Option<SentFrame>, TransmitError> {
        if !self.is_armed() {
            timers.cancel(TimerKind::TransmitRepeat);
            return Ok(None);
        }

        match Self::send_once(text, mode, session) {
            Ok(frame) => Ok(Some(frame)),
            Err(err) => {
                self.stop(timers);
                Err(err)
            }
        }
    }

    /// Cancel any repetition and hand the controls back to the user.
    pub fn stop(&mut self, timers: &mut Timers) {
        timers.cancel(TimerKind::TransmitRepeat);
        if self.is_armed() {
            log::info!("Periodic send stopped");
        }
        self.state = SchedulerState::Idle;
        self.release_controls();
    }

    fn release_controls(&mut self) {
        self.controls = Controls::default();
    }

    fn send_once(
        text: &str,
        mode: TransmitMode,
        session: &mut PortSession,
    ) -> Result<SentFrame, TransmitError> {
        if !session.is_open() {
            return Err(TransmitError::NotOpen);
        }

        let bytes = match mode {
            TransmitMode::Ascii => {
                if text.is_empty() {
                    return Err(TransmitError::BlankField);
                }
                text.as_bytes().to_vec()
            }
            TransmitMode::Hex => {
                let normalized = formatter::normalize(text);
                if normalized.is_empty() {
                    return Err(TransmitError::BlankField);
                }
                codec::decode(&normalized)?
            }
        };

        let written = session.write(&bytes)?;
        if written < bytes.len() {
            log::warn!("Only {written} of {} bytes were accepted", bytes.len());
        }
        let rendered = match mode {
            TransmitMode::Ascii => text.to_string(),
            TransmitMode::Hex => codec::encode(&bytes),
        };
        Ok(SentFrame {
            bytes,
            mode,
            rendered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{link::SerialConfig, loopback::LoopbackHandle};

    struct Rig {
        handle: LoopbackHandle,
        session: PortSession,
        timers: Timers,
        scheduler: TransmitScheduler,
        start: Instant,
    }

    impl Rig {
        fn open() -> Self {
            let handle = LoopbackHandle::new();
            let mut session = PortSession::with_opener(handle.opener());
            session
                .open(&SerialConfig::new("loop0", 9600))
                .expect("loopback opens");
            Self {
                handle,
                session,
                timers: Timers::new(),
                scheduler: TransmitScheduler::new(),
                start: Instant::now(),
            }
        }

        fn submit(
            &mut self,
            text: &str,
            mode: TransmitMode,
            repeat: &mut RepeatConfig,
        ) -> Result<TransmitOutcome, TransmitError> {
            self.scheduler.submit(
                text,
                mode,
                repeat,
                &mut self.session,
                &mut self.timers,
                self.start,
            )
        }
    }

    #[test]
    fn one_shot_hex_writes_decoded_bytes() {
        let mut rig = Rig::open();
        let outcome = rig
            .submit("48 65 6C 6C 6F", TransmitMode::Hex, &mut RepeatConfig::once())
            .expect("sent");
        assert!(matches!(outcome, TransmitOutcome::Sent(ref f) if f.rendered == "48 65 6C 6C 6F"));
        assert_eq!(rig.handle.writes(), vec![b"Hello".to_vec()]);
        assert_eq!(rig.scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn hex_field_is_normalized_before_decoding() {
        let mut rig = Rig::open();
        rig.submit("1 23", TransmitMode::Hex, &mut RepeatConfig::once())
            .expect("sent");
        assert_eq!(rig.handle.writes(), vec![vec![0x01, 0x23]]);
    }

    #[test]
    fn malformed_hex_writes_nothing() {
        let mut rig = Rig::open();
        let err = rig
            .submit("4G", TransmitMode::Hex, &mut RepeatConfig::once())
            .err();
        assert!(matches!(err, Some(TransmitError::Malformed { .. })));
        assert!(rig.handle.writes().is_empty());
    }

    #[test]
    fn closed_port_is_rejected_without_state_change() {
        let mut rig = Rig::open();
        rig.session.close();
        let mut repeat = RepeatConfig::every(100);
        let err = rig.submit("hi", TransmitMode::Ascii, &mut repeat).err();
        assert!(matches!(err, Some(TransmitError::NotOpen)));
        assert!(repeat.enabled);
        assert!(!rig.timers.is_active(TimerKind::TransmitRepeat));
    }

    #[test]
    fn zero_period_forces_repeat_off() {
        let mut rig = Rig::open();
        let mut repeat = RepeatConfig::every(0);
        let err = rig.submit("hi", TransmitMode::Ascii, &mut repeat).err();
        assert!(matches!(err, Some(TransmitError::InvalidPeriod)));
        assert!(!repeat.enabled);
        assert_eq!(rig.scheduler.state(), SchedulerState::Idle);
        assert!(rig.handle.writes().is_empty());
    }

    #[test]
    fn arm_then_disarm_toggles_controls() {
        let mut rig = Rig::open();
        let mut repeat = RepeatConfig::every(100);
        let outcome = rig.submit("hi", TransmitMode::Ascii, &mut repeat).expect("armed");
        assert!(matches!(outcome, TransmitOutcome::Armed(_)));
        assert!(rig.timers.is_active(TimerKind::TransmitRepeat));
        assert_eq!(
            rig.scheduler.controls(),
            Controls {
                input_enabled: false,
                repeat_toggle_enabled: false,
                send_label: SendLabel::Stop
            }
        );

        let outcome = rig.submit("hi", TransmitMode::Ascii, &mut repeat).expect("disarmed");
        assert_eq!(outcome, TransmitOutcome::Disarmed);
        assert!(!rig.timers.is_active(TimerKind::TransmitRepeat));
        assert_eq!(rig.scheduler.controls(), Controls::default());
        assert_eq!(rig.handle.writes().len(), 1);
    }

    #[test]
    fn blank_field_on_tick_disarms() {
        let mut rig = Rig::open();
        let mut repeat = RepeatConfig::every(100);
        rig.submit("hi", TransmitMode::Ascii, &mut repeat).expect("armed");

        let sent = rig
            .scheduler
            .on_repeat_tick("hi", TransmitMode::Ascii, &mut rig.session, &mut rig.timers)
            .expect("tick");
        assert!(sent.is_some());

        let err = rig
            .scheduler
            .on_repeat_tick("", TransmitMode::Ascii, &mut rig.session, &mut rig.timers)
            .err();
        assert!(matches!(err, Some(TransmitError::BlankField)));
        assert!(!rig.scheduler.is_armed());
        assert!(!rig.timers.is_active(TimerKind::TransmitRepeat));
        assert_eq!(rig.handle.writes().len(), 2);
    }

    #[test]
    fn unplug_during_send_is_fatal() {
        let mut rig = Rig::open();
        rig.handle.set_unplugged(true);
        let err = rig
            .submit("hi", TransmitMode::Ascii, &mut RepeatConfig::once())
            .err();
        assert!(err.is_some_and(|e| e.is_fatal()));
    }
}
