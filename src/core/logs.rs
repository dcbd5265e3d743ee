/// In-memory display sink
///
/// `LogBuffer` keeps the most recent log lines together with the clock label and
/// the counters so a front end (or a test) can render them whenever it wants.
/// `NoticeLog` does the same for notices.
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::sink::{ColorHint, Counters, DisplaySink, Notifier};

/// A log line with the time it was appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub hint: ColorHint,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, hint: ColorHint) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
            hint,
        }
    }
}

/// Bounded log plus the status values a front end shows next to it
#[derive(Debug)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    max_entries: usize,
    clock: String,
    counters: Counters,
}

impl LogBuffer {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max_entries.max(1),
            clock: String::new(),
            counters: Counters::default(),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);

        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(0..excess);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Messages only, oldest first.
    pub fn lines(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clock(&self) -> &str {
        &self.clock
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl DisplaySink for LogBuffer {
    fn append_line(&mut self, text: &str, hint: ColorHint) {
        self.push(LogEntry::new(text, hint));
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn update_clock(&mut self, clock: &str) {
        self.clock = clock.to_string();
    }

    fn update_counters(&mut self, counters: Counters) {
        self.counters = counters;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// Notices in arrival order. A front end shows the newest and dismisses it.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn dismiss(&mut self) -> Option<Notice> {
        self.notices.pop()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, title: &str, message: &str) {
        log::info!("Notice: {title}: {message}");
        self.notices.push(Notice {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}
