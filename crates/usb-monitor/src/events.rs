//! Notifications delivered to the consumer
//!
//! Everything the monitor reports, device activity and lifecycle alike,
//! arrives on a single channel in the order the triggering kernel events
//! were observed.

/// Notification emitted by the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A device was attached
    Connected {
        /// Human-readable description
        description: String,
        /// Display key: parent device path and description joined
        port_key: String,
    },

    /// A previously reported device was detached
    Disconnected {
        /// Description stored when the device connected
        description: String,
        /// Same key as the matching `Connected`
        port_key: String,
    },

    /// Status message for the consumer's console
    Log(String),

    /// The session ended; emitted exactly once per `start()`
    Finished,
}

impl MonitorEvent {
    /// Check if this is a connect or disconnect
    pub fn is_device_event(&self) -> bool {
        matches!(
            self,
            MonitorEvent::Connected { .. } | MonitorEvent::Disconnected { .. }
        )
    }

    /// Get the port key for device events
    pub fn port_key(&self) -> Option<&str> {
        match self {
            MonitorEvent::Connected { port_key, .. }
            | MonitorEvent::Disconnected { port_key, .. } => Some(port_key),
            _ => None,
        }
    }

    /// Get the description for device events
    pub fn description(&self) -> Option<&str> {
        match self {
            MonitorEvent::Connected { description, .. }
            | MonitorEvent::Disconnected { description, .. } => Some(description),
            _ => None,
        }
    }
}

/// Build the consumer's port key
pub fn port_key(parent_devpath: &str, delimiter: &str, description: &str) -> String {
    format!("{parent_devpath}{delimiter}{description}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_key_format() {
        assert_eq!(
            port_key("/devices/pci0000:00/usb1", ":", "Device: Logitech USB Receiver"),
            "/devices/pci0000:00/usb1:Device: Logitech USB Receiver"
        );
    }

    #[test]
    fn test_device_event_accessors() {
        let connected = MonitorEvent::Connected {
            description: "Device: Mouse".into(),
            port_key: "/devices/usb1:Device: Mouse".into(),
        };
        assert!(connected.is_device_event());
        assert_eq!(connected.port_key(), Some("/devices/usb1:Device: Mouse"));
        assert_eq!(connected.description(), Some("Device: Mouse"));

        let log = MonitorEvent::Log("hello".into());
        assert!(!log.is_device_event());
        assert_eq!(log.port_key(), None);
        assert_eq!(MonitorEvent::Finished.description(), None);
    }
}
