//! Callbacks from the terminal core into whatever front end hosts it.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// How a front end should tint a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ColorHint {
    Neutral,
    Info,
    Error,
    Sent,
    Received,
}

/// Receive and send event counts. Only ever incremented or reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub received: u64,
    pub sent: u64,
}

impl Counters {
    pub fn record_received(&mut self) {
        self.received = self.received.saturating_add(1);
    }

    pub fn record_sent(&mut self) {
        self.sent = self.sent.saturating_add(1);
    }

    pub fn reset_received(&mut self) {
        self.received = 0;
    }

    pub fn reset_sent(&mut self) {
        self.sent = 0;
    }
}

pub trait DisplaySink {
    fn append_line(&mut self, text: &str, hint: ColorHint);

    fn clear(&mut self);

    /// Clock label refresh.
    fn update_clock(&mut self, _clock: &str) {}

    fn update_counters(&mut self, _counters: Counters) {}
}

/// Modal hints such as "port not open" or "blank field".
pub trait Notifier {
    fn notify(&mut self, title: &str, message: &str);
}
