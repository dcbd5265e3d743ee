use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serialport::{SerialPortInfo, SerialPortType};

use super::loopback::LOOPBACK_PORT;

/// One selectable port as shown in the port picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortEntry {
    pub name: String,
    pub description: String,
    pub kind: &'static str,
}

impl PortEntry {
    /// `name #description`, or just the name when there is no description.
    pub fn label(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{} #{}", self.name, self.description)
        }
    }

    fn loopback() -> Self {
        Self {
            name: LOOPBACK_PORT.to_string(),
            description: "In-memory echo".to_string(),
            kind: "virtual",
        }
    }
}

impl From<&SerialPortInfo> for PortEntry {
    fn from(info: &SerialPortInfo) -> Self {
        let (kind, description) = match &info.port_type {
            SerialPortType::UsbPort(usb) => {
                let description = usb
                    .product
                    .clone()
                    .or_else(|| usb.manufacturer.clone())
                    .unwrap_or_else(|| format!("USB {:04x}:{:04x}", usb.vid, usb.pid));
                ("usb", description)
            }
            SerialPortType::PciPort => ("pci", "PCI device".to_string()),
            SerialPortType::BluetoothPort => ("bluetooth", "Bluetooth".to_string()),
            SerialPortType::Unknown => ("unknown", String::new()),
        };
        Self {
            name: info.port_name.clone(),
            description,
            kind,
        }
    }
}

/// System ports sorted and deduplicated, followed by the loopback device.
pub fn available_ports() -> Vec<PortEntry> {
    let raw = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(err) => {
            log::warn!("Failed to enumerate serial ports: {err}");
            Vec::new()
        }
    };
    let mut entries = sort_and_dedup_ports(raw);
    entries.push(PortEntry::loopback());
    entries
}

fn base_name(port_name: &str) -> String {
    port_name
        .rsplit('/')
        .next()
        .unwrap_or(port_name)
        .to_lowercase()
}

// USB/ACM first, then ttys.
fn priority(name: &str) -> i32 {
    let n = name.to_lowercase();
    if n.contains("ttyusb") || n.contains("usb") {
        0
    } else if n.contains("acm") {
        1
    } else if n.contains("ttys") || n.contains("serial") {
        2
    } else {
        10
    }
}

/// Entry names stay openable device paths; ports that share a basename get
/// their vid/pid appended to the description instead.
pub(crate) fn sort_and_dedup_ports(raw_ports: Vec<SerialPortInfo>) -> Vec<PortEntry> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ports: Vec<SerialPortInfo> = Vec::new();

    for port in raw_ports {
        let base = base_name(&port.port_name);
        let key = match &port.port_type {
            SerialPortType::UsbPort(usb) => {
                format!("{base}:vid={:04x}:pid={:04x}", usb.vid, usb.pid)
            }
            _ => base,
        };
        if seen.insert(key) {
            ports.push(port);
        }
    }

    ports.sort_by(|a, b| {
        priority(&a.port_name)
            .cmp(&priority(&b.port_name))
            .then_with(|| a.port_name.cmp(&b.port_name))
    });

    let mut basenames: HashMap<String, usize> = HashMap::new();
    for p in &ports {
        *basenames.entry(base_name(&p.port_name)).or_default() += 1;
    }

    ports
        .iter()
        .map(|info| {
            let mut entry = PortEntry::from(info);
            let shared = basenames
                .get(&base_name(&info.port_name))
                .is_some_and(|&n| n > 1);
            if let (true, SerialPortType::UsbPort(usb)) = (shared, &info.port_type) {
                let ids = format!("vid:{:04x} pid:{:04x}", usb.vid, usb.pid);
                entry.description = if entry.description.is_empty() {
                    ids
                } else {
                    format!("{} ({ids})", entry.description)
                };
            }
            entry
        })
        .collect()
}
