/// Repeating timers driven by the host event loop.
///
/// Nothing here sleeps or spawns: the host asks for `next_deadline()`, waits for
/// input until then, and calls `pop_due(now)` until it returns `None`. A timer that
/// fell behind fires once and is re-armed from `now`, so missed ticks are not
/// replayed in a burst.
use std::time::{Duration, Instant};

use strum::{EnumCount, EnumIter, IntoEnumIterator};

#[derive(EnumIter, EnumCount, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Clock label refresh.
    Clock,
    /// Receive backlog sampling.
    ReceivePoll,
    /// Periodic transmission.
    TransmitRepeat,
}

impl TimerKind {
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    interval: Duration,
    next_due: Instant,
}

#[derive(Debug, Default)]
pub struct Timers {
    slots: [Option<Timer>; TimerKind::COUNT],
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) `kind` to fire every `interval`, first at `now + interval`.
    pub fn schedule_repeating(&mut self, kind: TimerKind, interval: Duration, now: Instant) {
        let interval = interval.max(Duration::from_millis(1));
        self.slots[kind.index()] = Some(Timer {
            interval,
            next_due: now + interval,
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.slots[kind.index()] = None;
    }

    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    pub fn interval(&self, kind: TimerKind) -> Option<Duration> {
        self.slots[kind.index()].map(|t| t.interval)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|t| t.next_due).min()
    }

    /// Take the earliest timer that is due at `now` and schedule its next firing.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerKind> {
        let (index, timer) = self
            .slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|t| (i, t)))
            .filter(|(_, t)| t.next_due <= now)
            .min_by_key(|(_, t)| t.next_due)?;

        timer.next_due += timer.interval;
        if timer.next_due <= now {
            timer.next_due = now + timer.interval;
        }

        TimerKind::iter().nth(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(timers: &mut Timers, now: Instant) -> Vec<TimerKind> {
        std::iter::from_fn(|| timers.pop_due(now)).collect()
    }

    #[test]
    fn fires_once_per_interval() {
        let start = Instant::now();
        let mut timers = Timers::new();
        timers.schedule_repeating(TimerKind::TransmitRepeat, Duration::from_millis(100), start);

        assert!(drain(&mut timers, start + Duration::from_millis(99)).is_empty());
        assert_eq!(
            drain(&mut timers, start + Duration::from_millis(100)),
            vec![TimerKind::TransmitRepeat]
        );
        assert!(drain(&mut timers, start + Duration::from_millis(150)).is_empty());
        assert_eq!(
            drain(&mut timers, start + Duration::from_millis(200)),
            vec![TimerKind::TransmitRepeat]
        );
    }

    #[test]
    fn every_kind_comes_back_from_its_slot() {
        let start = Instant::now();
        let mut timers = Timers::new();
        for kind in TimerKind::iter() {
            timers.schedule_repeating(kind, Duration::from_millis(10), start);
        }
        let fired = drain(&mut timers, start + Duration::from_millis(10));
        assert_eq!(fired, TimerKind::iter().collect::<Vec<_>>());
    }

    #[test]
    fn late_poll_does_not_replay_missed_ticks() {
        let start = Instant::now();
        let mut timers = Timers::new();
        timers.schedule_repeating(TimerKind::ReceivePoll, Duration::from_millis(5), start);
        let late = start + Duration::from_millis(50);
        assert_eq!(drain(&mut timers, late), vec![TimerKind::ReceivePoll]);
        assert_eq!(timers.next_deadline(), Some(late + Duration::from_millis(5)));
    }

    #[test]
    fn earliest_deadline_first_and_cancel() {
        let start = Instant::now();
        let mut timers = Timers::new();
        timers.schedule_repeating(TimerKind::Clock, Duration::from_millis(250), start);
        timers.schedule_repeating(TimerKind::ReceivePoll, Duration::from_millis(5), start);
        assert_eq!(timers.next_deadline(), Some(start + Duration::from_millis(5)));

        let now = start + Duration::from_millis(250);
        assert_eq!(timers.pop_due(now), Some(TimerKind::ReceivePoll));
        assert_eq!(timers.pop_due(now), Some(TimerKind::Clock));
        assert_eq!(timers.pop_due(now), None);

        timers.cancel(TimerKind::Clock);
        assert!(!timers.is_active(TimerKind::Clock));
        assert_eq!(timers.interval(TimerKind::ReceivePoll), Some(Duration::from_millis(5)));
    }
}
