//! Monitor controller
//!
//! [`UsbMonitor`] owns a worker thread that blocks on the event source and
//! drives the [`EventPipeline`]. The state machine is
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`:
//!
//! - `start()` spawns the worker, which opens the source. If opening fails
//!   the worker logs the error and finishes straight away.
//! - `stop()` only clears the running flag. The worker notices on its next
//!   poll timeout, closes the source, and finishes.
//! - Every `start()` produces exactly one [`MonitorEvent::Finished`], after
//!   which the monitor can be started again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use usb_detect::DeviceDescriber;

use crate::error::MonitorError;
use crate::events::MonitorEvent;
use crate::pipeline::EventPipeline;
use crate::registry::DeviceRegistry;
use crate::source::{EventSource, NetlinkSource};
use crate::state::{MonitorState, SharedState};

/// Opens a fresh event source for each monitoring session
pub type SourceOpener =
    Arc<dyn Fn(&MonitorConfig) -> Result<Box<dyn EventSource>, MonitorError> + Send + Sync>;

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// How long each receive waits before re-checking the stop flag
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Receive buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Separator between device path and description in port keys
    #[serde(default = "default_port_key_delimiter")]
    pub port_key_delimiter: String,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_buffer_size() -> usize {
    4096
}

fn default_port_key_delimiter() -> String {
    ":".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            buffer_size: default_buffer_size(),
            port_key_delimiter: default_port_key_delimiter(),
        }
    }
}

impl MonitorConfig {
    /// Receive timeout as a `Duration` (never zero)
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Opener for the kernel netlink socket
pub fn netlink_opener() -> SourceOpener {
    Arc::new(|config: &MonitorConfig| {
        NetlinkSource::open(config.buffer_size).map(|s| Box::new(s) as Box<dyn EventSource>)
    })
}

/// Cloneable stop control for a [`UsbMonitor`]
///
/// Lets threads other than the owner request a stop or read the state.
#[derive(Clone)]
pub struct MonitorHandle {
    running: Arc<AtomicBool>,
    state: Arc<SharedState>,
    events: Sender<MonitorEvent>,
}

impl MonitorHandle {
    /// Request the worker to stop
    ///
    /// Returns immediately; the worker exits within one poll interval.
    pub fn stop(&self) {
        let claimed = self
            .state
            .transition(MonitorState::Running, MonitorState::Stopping)
            || self
                .state
                .transition(MonitorState::Starting, MonitorState::Stopping);
        if !claimed {
            debug!("Stop requested while {}", self.state.get().name());
            return;
        }

        info!("Stopping monitoring...");
        let _ = self
            .events
            .send(MonitorEvent::Log("Stopping monitoring...".to_string()));
        self.running.store(false, Ordering::Release);
    }

    /// Current lifecycle state
    pub fn state(&self) -> MonitorState {
        self.state.get()
    }

    /// True while the running flag is set
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// USB hotplug monitor
pub struct UsbMonitor {
    config: MonitorConfig,
    describer: DeviceDescriber,
    opener: SourceOpener,
    handle: MonitorHandle,
    worker: Option<JoinHandle<()>>,
}

impl UsbMonitor {
    /// Create a monitor that listens on the kernel netlink socket
    pub fn new(
        config: MonitorConfig,
        describer: DeviceDescriber,
        events: Sender<MonitorEvent>,
    ) -> Self {
        Self::with_source(config, describer, events, netlink_opener())
    }

    /// Create a monitor with a custom event source
    pub fn with_source(
        config: MonitorConfig,
        describer: DeviceDescriber,
        events: Sender<MonitorEvent>,
        opener: SourceOpener,
    ) -> Self {
        Self {
            config,
            describer,
            opener,
            handle: MonitorHandle {
                running: Arc::new(AtomicBool::new(false)),
                state: Arc::new(SharedState::new()),
                events,
            },
            worker: None,
        }
    }

    /// Start monitoring on a worker thread
    ///
    /// A no-op while a session is starting or running. If the previous
    /// session is still stopping, waits for it to exit first.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if matches!(
            self.handle.state(),
            MonitorState::Starting | MonitorState::Running
        ) {
            info!("Monitoring is already running.");
            self.emit_log("Monitoring is already running.");
            return Ok(());
        }

        self.join_worker();

        self.handle.state.set(MonitorState::Starting);
        self.handle.running.store(true, Ordering::Release);

        let worker = Worker {
            config: self.config.clone(),
            describer: self.describer.clone(),
            opener: self.opener.clone(),
            handle: self.handle.clone(),
        };

        match thread::Builder::new()
            .name("usb-monitor".to_string())
            .spawn(move || worker.run())
        {
            Ok(join) => {
                self.worker = Some(join);
                Ok(())
            }
            Err(e) => {
                error!("Failed to spawn monitor worker: {}", e);
                self.handle.running.store(false, Ordering::Release);
                self.handle.state.set(MonitorState::Stopped);
                self.emit_log(format!("Error: failed to start monitoring: {e}"));
                let _ = self.handle.events.send(MonitorEvent::Finished);
                Err(MonitorError::Spawn(e))
            }
        }
    }

    /// Request the worker to stop without waiting
    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Stop and wait for the worker to release its resources
    pub fn shutdown(&mut self) {
        self.stop();
        self.join_worker();
    }

    /// Current lifecycle state
    pub fn state(&self) -> MonitorState {
        self.handle.state()
    }

    /// A cloneable handle for stopping from another thread
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    /// Active configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Replace the configuration used by the next `start()`
    pub fn set_config(&mut self, config: MonitorConfig) {
        self.config = config;
    }

    fn emit_log(&self, message: impl Into<String>) {
        let _ = self.handle.events.send(MonitorEvent::Log(message.into()));
    }

    fn join_worker(&mut self) {
        if let Some(join) = self.worker.take() {
            if join.join().is_err() {
                warn!("Monitor worker panicked");
            }
        }
    }
}

impl Drop for UsbMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Everything the worker thread owns for one session
struct Worker {
    config: MonitorConfig,
    describer: DeviceDescriber,
    opener: SourceOpener,
    handle: MonitorHandle,
}

impl Worker {
    fn run(self) {
        let _finish = FinishGuard {
            handle: self.handle.clone(),
        };

        let mut source = match (self.opener)(&self.config) {
            Ok(source) => source,
            Err(e) => {
                error!("Failed to open event source: {}", e);
                self.emit(MonitorEvent::Log(format!("Error: {e}")));
                return;
            }
        };

        if self.handle.is_running() {
            self.handle
                .state
                .transition(MonitorState::Starting, MonitorState::Running);
            info!("Started monitoring USB events");
            self.emit(MonitorEvent::Log("Started monitoring USB events...".to_string()));
        }

        let registry = DeviceRegistry::with_delimiter(self.config.port_key_delimiter.clone());
        let mut pipeline = EventPipeline::with_registry(self.describer.clone(), registry);
        let poll_interval = self.config.poll_interval();

        while self.handle.is_running() {
            match source.receive(poll_interval) {
                Ok(Some(raw)) => {
                    if let Some(event) = pipeline.handle(&raw) {
                        match &event {
                            MonitorEvent::Connected { port_key, .. } => {
                                info!("Device connected: {}", port_key)
                            }
                            MonitorEvent::Disconnected { port_key, .. } => {
                                info!("Device disconnected: {}", port_key)
                            }
                            _ => {}
                        }
                        self.emit(event);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Stopping after event source error: {}", e);
                    self.emit(MonitorEvent::Log(format!("Error: {e}")));
                    break;
                }
            }
        }

        source.close();
        debug!(
            "Worker exiting with {} device(s) registered",
            pipeline.registry().len()
        );
        info!("Monitoring stopped");
        self.emit(MonitorEvent::Log("Monitoring stopped.".to_string()));
    }

    fn emit(&self, event: MonitorEvent) {
        let _ = self.handle.events.send(event);
    }
}

/// Marks the session finished when the worker exits, even by panic
struct FinishGuard {
    handle: MonitorHandle,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.handle.running.store(false, Ordering::Release);
        self.handle.state.set(MonitorState::Stopped);
        let _ = self.handle.events.send(MonitorEvent::Finished);
    }
}
