use std::{
    io::{self, Read, Write},
    time::Duration,
};

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use super::loopback::{LoopbackLink, LOOPBACK_PORT};

#[derive(
    EnumIter, Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
pub enum DataBits {
    #[display("5 Bits")]
    Five,
    #[display("6 Bits")]
    Six,
    #[display("7 Bits")]
    Seven,
    #[default]
    #[display("8 Bits")]
    Eight,
}

impl DataBits {
    pub fn as_u8(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            5 => Some(DataBits::Five),
            6 => Some(DataBits::Six),
            7 => Some(DataBits::Seven),
            8 => Some(DataBits::Eight),
            _ => None,
        }
    }
}

#[derive(
    EnumIter, Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
pub enum StopBits {
    #[default]
    #[display("1 Bit")]
    One,
    #[display("1.5 Bits")]
    OneAndHalf,
    #[display("2 Bits")]
    Two,
}

impl StopBits {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1" => Some(StopBits::One),
            "1.5" => Some(StopBits::OneAndHalf),
            "2" => Some(StopBits::Two),
            _ => None,
        }
    }
}

#[derive(
    EnumIter, Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
pub enum Parity {
    #[default]
    #[display("No Parity")]
    None,
    #[display("Even Parity")]
    Even,
    #[display("Odd Parity")]
    Odd,
    #[display("Mark Parity")]
    Mark,
    #[display("Space Parity")]
    Space,
}

impl Parity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "n" => Some(Parity::None),
            "even" | "e" => Some(Parity::Even),
            "odd" | "o" => Some(Parity::Odd),
            "mark" | "m" => Some(Parity::Mark),
            "space" | "s" => Some(Parity::Space),
            _ => None,
        }
    }
}

#[derive(
    EnumIter, Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
pub enum FlowControl {
    #[default]
    #[display("No Flow Control")]
    None,
    #[display("Hardware Flow Control")]
    Hardware,
    #[display("Software Flow Control")]
    Software,
}

impl FlowControl {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Some(FlowControl::None),
            "hardware" | "rts/cts" => Some(FlowControl::Hardware),
            "software" | "xon/xoff" => Some(FlowControl::Software),
            _ => None,
        }
    }
}

/// Serial port configuration handed to `PortSession::open`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud: 115_200,
            data_bits: DataBits::default(),
            stop_bits: StopBits::default(),
            parity: Parity::default(),
            flow_control: FlowControl::default(),
        }
    }
}

impl SerialConfig {
    pub fn new(port: impl Into<String>, baud: u32) -> Self {
        Self {
            port: port.into(),
            baud,
            ..Default::default()
        }
    }

    /// Apply framing settings to a serialport builder. Settings the backend cannot
    /// express (1.5 stop bits, mark/space parity) are reported instead of approximated.
    pub fn apply_builder(
        &self,
        b: serialport::SerialPortBuilder,
    ) -> Result<serialport::SerialPortBuilder, OpenError> {
        let b = b.data_bits(match self.data_bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        });
        let b = b.stop_bits(match self.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
            StopBits::OneAndHalf => return Err(self.unsupported(self.stop_bits.to_string())),
        });
        let b = b.parity(match self.parity {
            Parity::None => serialport::Parity::None,
            Parity::Even => serialport::Parity::Even,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Mark | Parity::Space => {
                return Err(self.unsupported(self.parity.to_string()))
            }
        });
        let b = b.flow_control(match self.flow_control {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
            FlowControl::Software => serialport::FlowControl::Software,
        });
        Ok(b)
    }

    fn unsupported(&self, setting: String) -> OpenError {
        OpenError::UnsupportedSetting {
            port: self.port.clone(),
            setting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum OpenError {
    #[display("serial port {port} is busy or missing: {reason}")]
    DeviceBusyOrMissing { port: String, reason: String },
    #[display("serial port {port} cannot be configured with {setting}")]
    UnsupportedSetting { port: String, setting: String },
}

/// Byte transport behind a `PortSession`. Every call must return immediately.
pub trait SerialLink {
    /// Hand `bytes` to the driver without waiting for them to drain. Returns how
    /// many were accepted.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read up to `buf.len()` bytes that are already buffered.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Acquires a `SerialLink` for a configuration.
pub trait LinkOpener {
    fn open(&self, config: &SerialConfig) -> Result<Box<dyn SerialLink>, OpenError>;
}

/// Opens OS serial devices through `serialport`, and the in-memory echo link for
/// the `loopback` device name.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, config: &SerialConfig) -> Result<Box<dyn SerialLink>, OpenError> {
        if config.port == LOOPBACK_PORT {
            return Ok(Box::new(LoopbackLink::echo()));
        }

        let builder = serialport::new(config.port.as_str(), config.baud)
            .timeout(Duration::from_millis(10));
        let builder = config.apply_builder(builder)?;
        let busy = |err: serialport::Error| OpenError::DeviceBusyOrMissing {
            port: config.port.clone(),
            reason: err.to_string(),
        };

        let handle = open_os_port(builder).map_err(busy)?;
        Ok(Box::new(OsLink(handle)))
    }
}

#[cfg(unix)]
fn open_os_port(
    builder: serialport::SerialPortBuilder,
) -> serialport::Result<Box<dyn serialport::SerialPort>> {
    // TIOCEXCL: later opens of the same tty fail with EBUSY.
    let mut handle = builder.open_native()?;
    handle.set_exclusive(true)?;
    Ok(Box::new(handle))
}

#[cfg(not(unix))]
fn open_os_port(
    builder: serialport::SerialPortBuilder,
) -> serialport::Result<Box<dyn serialport::SerialPort>> {
    builder.open()
}

struct OsLink(Box<dyn serialport::SerialPort>);

impl SerialLink for OsLink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.write(bytes)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.0.bytes_to_read()? as usize)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pending = self.bytes_available()?;
        if pending == 0 {
            return Ok(0);
        }
        let limit = pending.min(buf.len());
        match self.0.read(&mut buf[..limit]) {
            Ok(n) => Ok(n),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(err) => Err(err),
        }
    }
}
