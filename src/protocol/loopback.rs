//! In-memory serial link.
//!
//! `loopback` is accepted as a device name by `SystemOpener` and echoes every
//! written byte back as received data. A `LoopbackHandle` exposes the same link to
//! the caller so bytes can be injected, writes inspected and an unplug simulated.

use std::{
    cell::RefCell,
    collections::VecDeque,
    io,
    rc::Rc,
};

use super::link::{LinkOpener, OpenError, SerialConfig, SerialLink};

/// Device name that opens the echo link.
pub const LOOPBACK_PORT: &str = "loopback";

#[derive(Debug, Default)]
struct LoopbackState {
    rx: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    echo: bool,
    unplugged: bool,
    stalled: bool,
}

/// Shared view of a loopback device.
#[derive(Debug, Clone, Default)]
pub struct LoopbackHandle {
    state: Rc<RefCell<LoopbackState>>,
}

impl LoopbackHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_echo() -> Self {
        let handle = Self::default();
        handle.state.borrow_mut().echo = true;
        handle
    }

    /// Queue bytes as if the remote end had sent them.
    pub fn inject(&self, bytes: &[u8]) {
        self.state.borrow_mut().rx.extend(bytes.iter().copied());
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.borrow().writes.clone()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().rx.len()
    }

    /// Make writes time out, as a port held back by flow control does.
    pub fn set_stalled(&self, stalled: bool) {
        self.state.borrow_mut().stalled = stalled;
    }

    /// Simulate the device disappearing (or coming back).
    pub fn set_unplugged(&self, unplugged: bool) {
        self.state.borrow_mut().unplugged = unplugged;
    }

    pub fn opener(&self) -> LoopbackOpener {
        LoopbackOpener {
            handle: self.clone(),
        }
    }

    fn link(&self) -> LoopbackLink {
        LoopbackLink {
            state: Rc::clone(&self.state),
        }
    }
}

pub struct LoopbackLink {
    state: Rc<RefCell<LoopbackState>>,
}

impl LoopbackLink {
    pub fn echo() -> Self {
        LoopbackHandle::with_echo().link()
    }

    fn check_plugged(state: &LoopbackState) -> io::Result<()> {
        if state.unplugged {
            Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "loopback device unplugged",
            ))
        } else {
            Ok(())
        }
    }
}

impl SerialLink for LoopbackLink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        Self::check_plugged(&state)?;
        if state.stalled {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "loopback write stalled",
            ));
        }
        state.writes.push(bytes.to_vec());
        if state.echo {
            state.rx.extend(bytes.iter().copied());
        }
        Ok(bytes.len())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        let state = self.state.borrow();
        Self::check_plugged(&state)?;
        Ok(state.rx.len())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        Self::check_plugged(&state)?;
        let n = buf.len().min(state.rx.len());
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

/// Opens links that share one `LoopbackHandle`.
#[derive(Debug, Clone)]
pub struct LoopbackOpener {
    handle: LoopbackHandle,
}

impl LinkOpener for LoopbackOpener {
    fn open(&self, config: &SerialConfig) -> Result<Box<dyn SerialLink>, OpenError> {
        if self.handle.state.borrow().unplugged {
            return Err(OpenError::DeviceBusyOrMissing {
                port: config.port.clone(),
                reason: "no such device".to_string(),
            });
        }
        Ok(Box::new(self.handle.link()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_link_returns_written_bytes() {
        let mut link = LoopbackLink::echo();
        assert_eq!(link.write(b"ping").ok(), Some(4));
        assert_eq!(link.bytes_available().ok(), Some(4));

        let mut buf = [0u8; 2];
        assert_eq!(link.read_available(&mut buf).ok(), Some(2));
        assert_eq!(&buf, b"pi");
        assert_eq!(link.bytes_available().ok(), Some(2));
    }

    #[test]
    fn unplugged_link_fails_every_call() {
        let handle = LoopbackHandle::new();
        let mut link = handle.link();
        handle.inject(b"x");
        handle.set_unplugged(true);
        assert!(link.bytes_available().is_err());
        assert!(link.write(b"y").is_err());
        assert!(handle.opener().open(&SerialConfig::default()).is_err());
    }
}
