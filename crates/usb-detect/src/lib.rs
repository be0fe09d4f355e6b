//! USB Device Description Library
//!
//! This crate turns classified hotplug events into the human-readable text
//! reported on connect and disconnect.
//!
//! Lookups go through the [`InfoProvider`] trait. [`CommandProvider`] runs
//! `lsusb`/`lsblk` with a timeout; any closure `Fn(&str) -> String` works
//! too, which keeps tests free of external tools.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use usb_detect::DeviceDescriber;
//! use usb_uevent::{classify, parse};
//!
//! let describer = DeviceDescriber::new(Arc::new(|_: &str| {
//!     "ID 046d:c52b Logitech USB Receiver".to_string()
//! }));
//!
//! let raw = b"ACTION=add\0DEVPATH=/devices/pci0000:00/usb1/1-1\0SUBSYSTEM=usb\0PRODUCT=46d/c52b/1\0";
//! let event = classify(parse(raw)).unwrap();
//!
//! assert_eq!(
//!     describer.describe(&event).as_deref(),
//!     Some("Device: Logitech USB Receiver")
//! );
//! ```

pub mod enrich;
pub mod error;
pub mod provider;

pub use enrich::{DeviceDescriber, DEVICE_PREFIX, STORAGE_PREFIX};
pub use error::DetectError;
pub use provider::{CommandProvider, InfoProvider, ProviderConfig};
