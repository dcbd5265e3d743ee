use anyhow::Result;
use clap::ArgMatches;

use crate::protocol::ports::{self, PortEntry};

/// Run the one-shot actions requested on the command line. Returns `true` when
/// one ran and the program should exit instead of starting the terminal UI.
pub fn run_one_shot_actions(matches: &ArgMatches) -> Result<bool> {
    if matches.get_flag("list-ports") {
        let ports = ports::available_ports();
        log::debug!("Listing {} ports", ports.len());
        println!("{}", render_port_list(&ports, matches.get_flag("json"))?);
        return Ok(true);
    }
    Ok(false)
}

pub fn render_port_list(ports: &[PortEntry], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(ports)?);
    }
    Ok(ports
        .iter()
        .map(PortEntry::label)
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PortEntry> {
        vec![
            PortEntry {
                name: "/dev/ttyUSB0".to_string(),
                description: "CH340".to_string(),
                kind: "usb",
            },
            PortEntry {
                name: "/dev/ttyS0".to_string(),
                description: String::new(),
                kind: "unknown",
            },
        ]
    }

    #[test]
    fn plain_listing_uses_labels() -> Result<()> {
        assert_eq!(
            render_port_list(&sample(), false)?,
            "/dev/ttyUSB0 #CH340\n/dev/ttyS0"
        );
        Ok(())
    }

    #[test]
    fn json_listing_is_an_array() -> Result<()> {
        let value: serde_json::Value = serde_json::from_str(&render_port_list(&sample(), true)?)?;
        assert_eq!(value[0]["name"], "/dev/ttyUSB0");
        assert_eq!(value[1]["kind"], "unknown");
        Ok(())
    }
}
