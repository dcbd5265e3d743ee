/// Front-end independent terminal logic
///
/// - `terminal`: the session object driven by the host
/// - `timer`: the three repeating timers it runs on
/// - `sink`: callbacks into the front end
/// - `logs`: an in-memory sink used by the TUI and tests
pub mod logs;
pub mod sink;
pub mod terminal;
pub mod timer;

pub use logs::{LogBuffer, NoticeLog};
pub use sink::{ColorHint, Counters, DisplaySink, Notifier};
pub use terminal::Terminal;
pub use timer::{TimerKind, Timers};
