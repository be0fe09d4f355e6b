//! Per-datagram processing
//!
//! Parse, classify, describe, and update the registry. The pipeline is
//! owned by the worker thread and is the only writer of the registry.

use tracing::{debug, trace};
use usb_detect::DeviceDescriber;
use usb_uevent::{classify, parse, Action, ClassifiedEvent};

use crate::events::MonitorEvent;
use crate::registry::DeviceRegistry;

/// Turns raw datagrams into connect/disconnect notifications
pub struct EventPipeline {
    describer: DeviceDescriber,
    registry: DeviceRegistry,
}

impl EventPipeline {
    /// Create a pipeline with an empty registry
    pub fn new(describer: DeviceDescriber) -> Self {
        Self::with_registry(describer, DeviceRegistry::new())
    }

    /// Create a pipeline around an existing registry
    pub fn with_registry(describer: DeviceDescriber, registry: DeviceRegistry) -> Self {
        Self {
            describer,
            registry,
        }
    }

    /// Process one raw datagram
    pub fn handle(&mut self, raw: &[u8]) -> Option<MonitorEvent> {
        let event = classify(parse(raw))?;
        self.handle_classified(event)
    }

    /// Process an already classified event
    pub fn handle_classified(&mut self, event: ClassifiedEvent) -> Option<MonitorEvent> {
        let port = event.parent_devpath.as_str();

        match &event.action {
            Action::Add => {
                if self.registry.contains(port) {
                    trace!("Ignoring repeated add for {}", port);
                    return None;
                }
                let Some(info) = self.describer.describe(&event) else {
                    debug!("No description for {} add at {}", event.subsystem, port);
                    return None;
                };
                self.registry.on_add(port, info)
            }
            Action::Remove => self.registry.on_remove(port),
            Action::Other(action) => {
                trace!("Ignoring {} {} event at {}", event.subsystem, action, port);
                None
            }
        }
    }

    /// The registry of attached devices
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
}
