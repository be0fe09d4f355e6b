//! Kernel UEvent Library
//!
//! This crate decodes the hotplug broadcasts the Linux kernel sends on the
//! `NETLINK_KOBJECT_UEVENT` multicast group and decides which of them
//! describe USB attachments worth reporting:
//!
//! - **Parsing**: a raw datagram is a list of NUL-terminated `KEY=VALUE`
//!   records, decoded into a [`UEvent`]
//! - **Classification**: only `usb` events for addressable ports and
//!   `block` events whose bus is USB survive [`classify`]
//! - **Port resolution**: every kept event carries the parent of its
//!   `DEVPATH`, which stays stable between an `add` and its `remove`
//!
//! # Example
//!
//! ```rust
//! use usb_uevent::{classify, parse, Action, Subsystem};
//!
//! let raw = b"ACTION=add\0DEVPATH=/devices/pci0000:00/usb1/1-1\0SUBSYSTEM=usb\0";
//! let event = classify(parse(raw)).unwrap();
//!
//! assert_eq!(event.action, Action::Add);
//! assert_eq!(event.subsystem, Subsystem::Usb);
//! assert_eq!(event.parent_devpath, "/devices/pci0000:00/usb1");
//! ```

pub mod classify;
pub mod error;
pub mod product;
pub mod uevent;

pub use classify::{classify, parent_devpath, Action, ClassifiedEvent, Subsystem};
pub use error::ParseError;
pub use product::ProductId;
pub use uevent::{parse, UEvent};

/// Well-known uevent field names
pub mod fields {
    pub const ACTION: &str = "ACTION";
    pub const DEVPATH: &str = "DEVPATH";
    pub const SUBSYSTEM: &str = "SUBSYSTEM";
    pub const ID_BUS: &str = "ID_BUS";
    pub const PRODUCT: &str = "PRODUCT";
    pub const ID_MODEL: &str = "ID_MODEL";
    pub const DEVNAME: &str = "DEVNAME";
}
