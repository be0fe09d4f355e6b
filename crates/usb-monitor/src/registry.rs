//! Connected-device registry
//!
//! Maps each port identifier to the description reported when the device
//! connected. A port is present exactly while the monitor believes the
//! device is attached.

use std::collections::HashMap;

use crate::events::{port_key, MonitorEvent};

/// Registry of currently attached devices
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: HashMap<String, String>,
    delimiter: String,
}

impl DeviceRegistry {
    /// Create an empty registry using `:` between path and description
    pub fn new() -> Self {
        Self::with_delimiter(":")
    }

    /// Create an empty registry with a custom port key delimiter
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        Self {
            devices: HashMap::new(),
            delimiter: delimiter.into(),
        }
    }

    /// Record a newly attached device
    ///
    /// Returns `Connected` if the port was not yet registered. A duplicate
    /// add is swallowed and the stored description is left untouched.
    pub fn on_add(&mut self, port: &str, info: String) -> Option<MonitorEvent> {
        if self.devices.contains_key(port) {
            return None;
        }

        let event = MonitorEvent::Connected {
            port_key: port_key(port, &self.delimiter, &info),
            description: info.clone(),
        };
        self.devices.insert(port.to_string(), info);
        Some(event)
    }

    /// Forget a detached device
    ///
    /// Returns `Disconnected` with the stored description, or `None` if the
    /// port was never registered.
    pub fn on_remove(&mut self, port: &str) -> Option<MonitorEvent> {
        let description = self.devices.remove(port)?;
        Some(MonitorEvent::Disconnected {
            port_key: port_key(port, &self.delimiter, &description),
            description,
        })
    }

    /// Stored description for a port
    pub fn get(&self, port: &str) -> Option<&str> {
        self.devices.get(port).map(String::as_str)
    }

    /// Check whether a port is registered
    pub fn contains(&self, port: &str) -> bool {
        self.devices.contains_key(port)
    }

    /// Number of attached devices
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True if nothing is attached
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Iterate over `(port, description)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.devices.iter().map(|(p, d)| (p.as_str(), d.as_str()))
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
