//! Event processing - handling notifications from the monitor

use std::time::Instant;

use usb_monitor::MonitorEvent;

use crate::console::ConsoleSeverity;

use super::{MonitorStatus, UsbWatchApp};

impl UsbWatchApp {
    /// Drain the monitor channel and update local state
    pub(super) fn process_monitor_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.apply_monitor_event(event);
        }
        self.devices.prune(Instant::now());
    }

    fn apply_monitor_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Connected {
                description,
                port_key,
            } => {
                self.devices.connect(&port_key, &description);
                self.console.push(
                    ConsoleSeverity::Device,
                    format!("UPDATE/CONNECT on port {}", port_key),
                );
            }
            MonitorEvent::Disconnected { port_key, .. } => {
                if !self.devices.disconnect(&port_key, Instant::now()) {
                    tracing::debug!("Disconnect for unlisted device {}", port_key);
                }
                self.console.push(
                    ConsoleSeverity::Device,
                    format!("DISCONNECTED from port {}", port_key),
                );
            }
            MonitorEvent::Log(message) => {
                self.console
                    .push(ConsoleSeverity::of_message(&message), message);
            }
            MonitorEvent::Finished => {
                self.pending_sessions = self.pending_sessions.saturating_sub(1);
                if self.pending_sessions == 0 {
                    self.monitor_status = MonitorStatus::Stopped;
                }
            }
        }
    }
}
