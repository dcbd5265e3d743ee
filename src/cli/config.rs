use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::protocol::{codec::TransmitMode, link::SerialConfig, scheduler::RepeatConfig};

/// Everything needed to bring up a terminal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub serial: SerialConfig,
    /// How the send field is interpreted
    pub send_mode: TransmitMode,
    /// How received bytes are displayed
    pub recv_mode: TransmitMode,
    pub repeat: RepeatConfig,
    /// Receive backlog sampling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Clock label refresh interval in milliseconds
    pub clock_interval_ms: u64,
    /// Upper bound on bytes in the hex send field
    pub hex_max_bytes: Option<usize>,
    /// Open the port as soon as the terminal starts
    pub auto_open: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            send_mode: TransmitMode::Ascii,
            recv_mode: TransmitMode::Ascii,
            repeat: RepeatConfig {
                enabled: false,
                period_ms: 1000,
            },
            poll_interval_ms: 5,
            clock_interval_ms: 250,
            hex_max_bytes: None,
            auto_open: false,
        }
    }
}

impl TerminalConfig {
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read configuration from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json(&content)
                .with_context(|| format!("Invalid JSON config {}", path.display()))?
        } else {
            Self::from_toml(&content)
                .with_context(|| format!("Invalid TOML config {}", path.display()))?
        };
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::link::{DataBits, Parity};

    #[test]
    fn defaults_match_classic_terminal() {
        let config = TerminalConfig::default();
        assert_eq!(config.serial.baud, 115_200);
        assert_eq!(config.serial.data_bits, DataBits::Eight);
        assert_eq!(config.poll_interval_ms, 5);
        assert!(!config.repeat.enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() -> Result<()> {
        let config = TerminalConfig::from_toml(
            r#"
send_mode = "hex"

[serial]
port = "/dev/ttyUSB0"
parity = "Even"

[repeat]
enabled = true
period_ms = 100
"#,
        )?;
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud, 115_200);
        assert_eq!(config.serial.parity, Parity::Even);
        assert_eq!(config.send_mode, TransmitMode::Hex);
        assert_eq!(config.recv_mode, TransmitMode::Ascii);
        assert_eq!(config.repeat, RepeatConfig::every(100));
        Ok(())
    }

    #[test]
    fn json_and_toml_agree() -> Result<()> {
        let config = TerminalConfig {
            hex_max_bytes: Some(16),
            ..Default::default()
        };
        let toml_text = config.to_toml()?;
        assert_eq!(TerminalConfig::from_toml(&toml_text)?, config);

        let json = serde_json::to_string(&config)?;
        assert_eq!(TerminalConfig::from_json(&json)?, config);
        Ok(())
    }

    #[test]
    fn file_format_follows_extension() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("hexterm-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;

        let json_path = dir.join("terminal.json");
        std::fs::write(&json_path, r#"{"serial": {"port": "loopback", "baud": 9600}}"#)?;
        let config = TerminalConfig::from_file(&json_path)?;
        assert_eq!(config.serial.port, "loopback");
        assert_eq!(config.serial.baud, 9600);

        let toml_path = dir.join("terminal.toml");
        std::fs::write(&toml_path, "auto_open = true\n")?;
        assert!(TerminalConfig::from_file(&toml_path)?.auto_open);

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
