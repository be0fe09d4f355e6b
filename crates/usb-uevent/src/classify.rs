//! Event classification and port resolution
//!
//! Decides whether a decoded uevent describes a USB attachment and, if so,
//! derives the port identifier used to pair an `add` with its `remove`.

use std::fmt;

use tracing::debug;

use crate::fields;
use crate::uevent::UEvent;

/// Kernel hotplug action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// Device attached
    Add,
    /// Device detached
    Remove,
    /// Any other action (`bind`, `change`, `unbind`, ...), kept verbatim
    Other(String),
}

impl Action {
    /// Interpret an `ACTION` field value
    pub fn from_field(value: &str) -> Self {
        match value {
            "add" => Action::Add,
            "remove" => Action::Remove,
            other => Action::Other(other.to_string()),
        }
    }

    /// Returns the kernel spelling of the action
    pub fn as_str(&self) -> &str {
        match self {
            Action::Add => "add",
            Action::Remove => "remove",
            Action::Other(s) => s,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subsystems this crate reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Subsystem {
    /// `SUBSYSTEM=usb`
    Usb,
    /// `SUBSYSTEM=block` with `ID_BUS=usb`
    Block,
}

impl Subsystem {
    /// Returns the kernel spelling of the subsystem
    pub fn as_str(&self) -> &'static str {
        match self {
            Subsystem::Usb => "usb",
            Subsystem::Block => "block",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event that passed classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    /// What happened
    pub action: Action,
    /// Which subsystem reported it
    pub subsystem: Subsystem,
    /// Parent directory of `DEVPATH`; the registry key. Never empty.
    pub parent_devpath: String,
    /// All decoded fields, for enrichment
    pub raw_fields: UEvent,
}

impl ClassifiedEvent {
    /// Look up a raw field
    pub fn field(&self, key: &str) -> Option<&str> {
        self.raw_fields.get(key)
    }
}

/// Strip the final segment of a device path
///
/// Returns `None` if the path has no `/` or the parent would be empty.
pub fn parent_devpath(devpath: &str) -> Option<&str> {
    let last_slash = devpath.rfind('/')?;
    let parent = &devpath[..last_slash];
    if parent.is_empty() {
        None
    } else {
        Some(parent)
    }
}

/// Check that a `usb` device path points below a bus-port node
///
/// Root hubs live directly under `/usbN` and carry no `-` separator after
/// it; ports look like `/usbN/N-P[.P...]`. Paths without `/usb` are not
/// filtered.
fn is_addressable_usb_port(devpath: &str) -> bool {
    match devpath.find("/usb") {
        Some(pos) => devpath[pos + "/usb".len()..].contains('-'),
        None => true,
    }
}

/// Check for an interface of the root hub itself (`N-0:C.I`)
///
/// Port 0 is the hub's own port, so these nodes sit under `/usbN` but
/// describe the controller rather than an attached device.
fn is_root_hub_interface(devpath: &str) -> bool {
    let last = devpath.rsplit('/').next().unwrap_or(devpath);
    last.split_once(':')
        .and_then(|(port, _)| port.split_once('-'))
        .is_some_and(|(bus, port)| {
            port == "0" && !bus.is_empty() && bus.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Classify a decoded uevent
///
/// Returns `None` unless the event has `ACTION` and `DEVPATH`, belongs to
/// the `usb` subsystem (at an addressable port) or to the `block`
/// subsystem with `ID_BUS=usb`, and has a non-empty parent path.
pub fn classify(event: UEvent) -> Option<ClassifiedEvent> {
    let action = Action::from_field(event.action()?);
    let devpath = event.devpath()?;

    let subsystem = match event.subsystem() {
        Some("usb") => Subsystem::Usb,
        Some("block") if event.get(fields::ID_BUS) == Some("usb") => Subsystem::Block,
        _ => return None,
    };

    let Some(parent) = parent_devpath(devpath) else {
        debug!("Ignoring {} event with no parent path: {}", subsystem, devpath);
        return None;
    };

    if subsystem == Subsystem::Usb
        && (!is_addressable_usb_port(devpath) || is_root_hub_interface(devpath))
    {
        debug!("Ignoring usb event for non-port node: {}", devpath);
        return None;
    }

    let parent_devpath = parent.to_string();

    Some(ClassifiedEvent {
        action,
        subsystem,
        parent_devpath,
        raw_fields: event,
    })
}
