pub mod actions;
pub mod config;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::protocol::{
    codec::TransmitMode,
    link::{DataBits, FlowControl, Parity, StopBits},
};
use config::TerminalConfig;

/// Build the command line definition.
pub fn command() -> Command {
    Command::new("hexterm")
        .about("Serial port terminal with ASCII/HEX send and receive")
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .short('l')
                .help("List all available serial ports and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .short('j')
                .help("Output one-shot results in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Load terminal settings from a TOML or JSON file")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write logs to this file instead of stderr")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .help("Serial port to use (\"loopback\" for an in-memory echo device)")
                .value_name("PORT"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open the port immediately")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("baud-rate")
                .long("baud-rate")
                .short('b')
                .help("Serial port baud rate [default: 115200]")
                .value_name("BAUD")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("data-bits")
                .long("data-bits")
                .help("Data bits per character")
                .value_name("BITS")
                .value_parser(clap::value_parser!(u8).range(5..=8)),
        )
        .arg(
            Arg::new("stop-bits")
                .long("stop-bits")
                .help("Stop bits")
                .value_name("BITS")
                .value_parser(["1", "1.5", "2"]),
        )
        .arg(
            Arg::new("parity")
                .long("parity")
                .help("Parity checking")
                .value_name("PARITY")
                .value_parser(["none", "even", "odd", "mark", "space"]),
        )
        .arg(
            Arg::new("flow-control")
                .long("flow-control")
                .help("Flow control")
                .value_name("FLOW")
                .value_parser(["none", "hardware", "software"]),
        )
        .arg(
            Arg::new("send-mode")
                .long("send-mode")
                .help("Interpret the send field as text or hex bytes")
                .value_name("MODE")
                .value_parser(["ascii", "hex"]),
        )
        .arg(
            Arg::new("recv-mode")
                .long("recv-mode")
                .help("Display received bytes as text or hex")
                .value_name("MODE")
                .value_parser(["ascii", "hex"]),
        )
        .arg(
            Arg::new("period")
                .long("period")
                .help("Repeat every send at this period in milliseconds")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("poll-interval")
                .long("poll-interval")
                .help("Receive sampling interval in milliseconds [default: 5]")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("hex-max-bytes")
                .long("hex-max-bytes")
                .help("Maximum number of bytes accepted in the hex send field")
                .value_name("N")
                .value_parser(clap::value_parser!(usize)),
        )
}

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    command().get_matches()
}

/// Load the config file (if any) and apply command line overrides on top.
pub fn resolve_config(matches: &ArgMatches) -> Result<TerminalConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => TerminalConfig::from_file(path)?,
        None => TerminalConfig::default(),
    };
    apply_overrides(matches, &mut config)?;
    Ok(config)
}

fn apply_overrides(matches: &ArgMatches, config: &mut TerminalConfig) -> Result<()> {
    if let Some(port) = matches.get_one::<String>("port") {
        config.serial.port = port.clone();
    }
    if matches.get_flag("open") {
        config.auto_open = true;
    }
    if let Some(&baud) = matches.get_one::<u32>("baud-rate") {
        config.serial.baud = baud;
    }
    if let Some(&bits) = matches.get_one::<u8>("data-bits") {
        config.serial.data_bits =
            DataBits::from_u8(bits).ok_or_else(|| anyhow!("Unsupported data bits: {bits}"))?;
    }
    if let Some(stop) = matches.get_one::<String>("stop-bits") {
        config.serial.stop_bits =
            StopBits::parse(stop).ok_or_else(|| anyhow!("Unsupported stop bits: {stop}"))?;
    }
    if let Some(parity) = matches.get_one::<String>("parity") {
        config.serial.parity =
            Parity::parse(parity).ok_or_else(|| anyhow!("Unsupported parity: {parity}"))?;
    }
    if let Some(flow) = matches.get_one::<String>("flow-control") {
        config.serial.flow_control = FlowControl::parse(flow)
            .ok_or_else(|| anyhow!("Unsupported flow control: {flow}"))?;
    }
    if let Some(mode) = matches.get_one::<String>("send-mode") {
        config.send_mode = parse_mode(mode);
    }
    if let Some(mode) = matches.get_one::<String>("recv-mode") {
        config.recv_mode = parse_mode(mode);
    }
    if let Some(&period) = matches.get_one::<u64>("period") {
        config.repeat.period_ms = period;
        config.repeat.enabled = true;
    }
    if let Some(&interval) = matches.get_one::<u64>("poll-interval") {
        config.poll_interval_ms = interval;
    }
    if let Some(&max) = matches.get_one::<usize>("hex-max-bytes") {
        config.hex_max_bytes = Some(max);
    }
    Ok(())
}

fn parse_mode(mode: &str) -> TransmitMode {
    if mode.eq_ignore_ascii_case("hex") {
        TransmitMode::Hex
    } else {
        TransmitMode::Ascii
    }
}
