//! hexterm: serial port terminal
//!
//! The crate is split the same way the binary is layered:
//!
//! - `protocol`: the serial transport and the pieces that shape traffic over it
//!   (hex codec, input formatter, receive aggregator, transmit scheduler)
//! - `core`: the `Terminal` session object that ties them to timers, counters
//!   and a display sink
//! - `cli` and `tui`: the command line and the ratatui front end
//!
//! Everything in `protocol` and `core` is single-threaded and driven by explicit
//! `Instant`s, so it can be exercised against the in-memory `loopback` device
//! without real hardware.

#[doc(hidden)]
pub mod boot;
pub mod cli;
pub mod core;
pub mod protocol;
#[doc(hidden)]
pub mod tui;

pub use crate::core::{ColorHint, Counters, DisplaySink, Notifier, Terminal};
pub use crate::protocol::{
    codec::{decode, encode, DecodeError, TransmitMode},
    formatter::{normalize, EditState, HexInputFormatter, Validity},
    link::{OpenError, SerialConfig},
    session::{IoError, PortSession},
};
