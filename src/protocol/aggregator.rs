//! Receive-side message framing by quiescence.
//!
//! A serial stream carries no framing, so a message is considered complete when
//! two consecutive samples see the same, nonzero backlog. The cost is at least one
//! tick of latency; a burst that pauses exactly on a tick boundary and then
//! continues is delivered in two pieces.

use bytes::Bytes;

use super::{
    codec::{self, TransmitMode},
    session::{IoError, PortSession},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// No backlog was seen on the previous tick.
    Idle,
    /// The previous tick saw a backlog of this many bytes.
    Armed(usize),
}

/// One drained burst and its display rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub bytes: Bytes,
    pub mode: TransmitMode,
    pub rendered: String,
}

#[derive(Debug, Default)]
pub struct ReceiveAggregator {
    previous: usize,
}

impl ReceiveAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AggregatorState {
        match self.previous {
            0 => AggregatorState::Idle,
            n => AggregatorState::Armed(n),
        }
    }

    /// Forget the recorded backlog, e.g. when the session closes.
    pub fn reset(&mut self) {
        self.previous = 0;
    }

    /// Sample the port once. Returns a message when the backlog was stable since
    /// the previous tick. Errors are fatal to the session and are not retried.
    pub fn tick(
        &mut self,
        session: &mut PortSession,
        mode: TransmitMode,
    ) -> Result<Option<ReceivedMessage>, IoError> {
        let available = session.bytes_available()?;

        let message = if available == self.previous && self.previous != 0 {
            let bytes = session.read_all()?;
            log::debug!("Received {} bytes after quiescence", bytes.len());
            let rendered = codec::render(&bytes, mode);
            Some(ReceivedMessage {
                bytes,
                mode,
                rendered,
            })
        } else {
            None
        };

        self.previous = available;
        Ok(message)
    }
}
