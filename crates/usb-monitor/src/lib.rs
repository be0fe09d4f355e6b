//! USB Hotplug Monitor
//!
//! This crate listens for kernel uevents on a netlink socket and reports
//! USB devices and USB storage volumes as they are attached and detached.
//!
//! # Architecture
//!
//! A monitoring session runs on one worker thread:
//!
//! - An [`EventSource`] yields raw datagrams ([`NetlinkSource`] in
//!   production, [`ReplaySource`] in tests)
//! - The [`EventPipeline`] parses and classifies each datagram, asks the
//!   describer for a description, and updates the [`DeviceRegistry`]
//! - All notifications go out through a single [`MonitorEvent`] channel
//!
//! [`UsbMonitor`] owns the worker and drives the lifecycle
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::{mpsc, Arc};
//! use usb_detect::{CommandProvider, DeviceDescriber, ProviderConfig};
//! use usb_monitor::{MonitorConfig, MonitorEvent, UsbMonitor};
//!
//! let config = ProviderConfig::default();
//! let provider = CommandProvider::with_config(&config).unwrap();
//! let describer = DeviceDescriber::with_config(Arc::new(provider), &config);
//!
//! let (tx, rx) = mpsc::channel();
//! let mut monitor = UsbMonitor::new(MonitorConfig::default(), describer, tx);
//! monitor.start().unwrap();
//!
//! for event in rx {
//!     match event {
//!         MonitorEvent::Connected { port_key, .. } => println!("connected {port_key}"),
//!         MonitorEvent::Finished => break,
//!         _ => {}
//!     }
//! }
//! ```

pub mod error;
pub mod events;
pub mod monitor;
pub mod pipeline;
pub mod registry;
pub mod source;
pub mod state;

pub use error::MonitorError;
pub use events::{port_key, MonitorEvent};
pub use monitor::{netlink_opener, MonitorConfig, MonitorHandle, SourceOpener, UsbMonitor};
pub use pipeline::EventPipeline;
pub use registry::DeviceRegistry;
pub use source::{EventSource, NetlinkSource, ReplayFeed, ReplaySource, KERNEL_UEVENT_GROUP};
pub use state::{MonitorState, SharedState};
