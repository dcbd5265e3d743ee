//! Open/closed lifecycle of the serial transport.
//!
//! `PortSession` is the only gateway to the link: callers check `is_open()` before
//! writing, and any I/O failure while open is reported as `IoError` so the owner
//! can tear the session down.

use std::io;

use bytes::Bytes;
use derive_more::{Display, Error};

use super::link::{LinkOpener, OpenError, SerialConfig, SerialLink, SystemOpener};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum SessionState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Display, Error)]
pub enum IoError {
    #[display("serial port is not open")]
    NotOpen,
    #[display("serial port {port} failed: {source}")]
    Device { port: String, source: io::Error },
}

const READ_CHUNK: usize = 4096;

pub struct PortSession {
    opener: Box<dyn LinkOpener>,
    link: Option<Box<dyn SerialLink>>,
    config: Option<SerialConfig>,
}

impl Default for PortSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PortSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortSession")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PortSession {
    pub fn new() -> Self {
        Self::with_opener(SystemOpener)
    }

    pub fn with_opener(opener: impl LinkOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            link: None,
            config: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.link.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Name of the open port, if any.
    pub fn port_name(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.port.as_str())
    }

    /// Open the port. An already open session is closed first.
    pub fn open(&mut self, config: &SerialConfig) -> Result<(), OpenError> {
        if self.is_open() {
            self.close();
        }
        let link = self.opener.open(config)?;
        log::info!("Opened serial port {} at {} baud", config.port, config.baud);
        self.link = Some(link);
        self.config = Some(config.clone());
        Ok(())
    }

    /// Drop the link. Safe to call when already closed.
    pub fn close(&mut self) {
        if self.link.take().is_some() {
            log::info!("Closed serial port {}", self.port_name().unwrap_or("?"));
        }
        self.config = None;
    }

    /// Write without blocking. A stalled link (flow control, full driver buffer)
    /// accepts fewer bytes, possibly none; only real device errors are returned.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, IoError> {
        let result = self.link_mut()?.write(bytes);
        match result {
            Err(err) if is_stall(&err) => {
                log::warn!(
                    "Write to {} stalled: {err}",
                    self.port_name().unwrap_or_default()
                );
                Ok(0)
            }
            result => self.device_result(result),
        }
    }

    pub fn bytes_available(&mut self) -> Result<usize, IoError> {
        let result = self.link_mut()?.bytes_available();
        self.device_result(result)
    }

    /// Drain everything currently buffered by the link.
    pub fn read_all(&mut self) -> Result<Bytes, IoError> {
        let mut out = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let result = self.link_mut()?.read_available(&mut chunk);
            let n = self.device_result(result)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
            if n < chunk.len() {
                break;
            }
        }
        Ok(Bytes::from(out))
    }

    fn link_mut(&mut self) -> Result<&mut Box<dyn SerialLink>, IoError> {
        self.link.as_mut().ok_or(IoError::NotOpen)
    }

    fn device_result<T>(&self, result: io::Result<T>) -> Result<T, IoError> {
        result.map_err(|source| IoError::Device {
            port: self.port_name().unwrap_or_default().to_string(),
            source,
        })
    }
}

fn is_stall(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::loopback::LoopbackHandle;

    fn open_session(handle: &LoopbackHandle) -> PortSession {
        let mut session = PortSession::with_opener(handle.opener());
        session
            .open(&SerialConfig::new("loop0", 9600))
            .expect("loopback opens");
        session
    }

    #[test]
    fn closed_session_refuses_io() {
        let mut session = PortSession::with_opener(LoopbackHandle::new().opener());
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(session.write(b"x"), Err(IoError::NotOpen)));
        assert!(matches!(session.bytes_available(), Err(IoError::NotOpen)));
    }

    #[test]
    fn open_write_read_close() {
        let handle = LoopbackHandle::new();
        let mut session = open_session(&handle);
        assert!(session.is_open());
        assert_eq!(session.port_name(), Some("loop0"));

        assert_eq!(session.write(b"abc").ok(), Some(3));
        assert_eq!(handle.writes(), vec![b"abc".to_vec()]);

        handle.inject(b"hello");
        assert_eq!(session.bytes_available().ok(), Some(5));
        assert_eq!(session.read_all().ok(), Some(Bytes::from_static(b"hello")));
        assert_eq!(session.bytes_available().ok(), Some(0));

        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.port_name(), None);
    }

    #[test]
    fn read_all_drains_more_than_one_chunk() {
        let handle = LoopbackHandle::new();
        let mut session = open_session(&handle);
        let payload = vec![0x5Au8; READ_CHUNK * 2 + 7];
        handle.inject(&payload);
        assert_eq!(session.read_all().map(|b| b.len()).ok(), Some(payload.len()));
    }

    #[test]
    fn unplug_surfaces_device_error() {
        let handle = LoopbackHandle::new();
        let mut session = open_session(&handle);
        handle.set_unplugged(true);
        assert!(matches!(
            session.bytes_available(),
            Err(IoError::Device { .. })
        ));
    }

    #[test]
    fn stalled_write_keeps_the_session_open() {
        let handle = LoopbackHandle::new();
        let mut session = open_session(&handle);
        handle.set_stalled(true);
        assert_eq!(session.write(b"abc").ok(), Some(0));
        assert!(session.is_open());
        assert!(handle.writes().is_empty());

        handle.set_stalled(false);
        assert_eq!(session.write(b"abc").ok(), Some(3));
    }

    #[test]
    fn failed_open_stays_closed() {
        let handle = LoopbackHandle::new();
        handle.set_unplugged(true);
        let mut session = PortSession::with_opener(handle.opener());
        let err = session.open(&SerialConfig::new("loop0", 9600)).err();
        assert!(matches!(err, Some(OpenError::DeviceBusyOrMissing { .. })));
        assert!(!session.is_open());
    }
}
