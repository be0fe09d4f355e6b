//! Main application state and UI
//!
//! This module contains the core `UsbWatchApp` struct and is organized into submodules:
//! - `status`: Status messaging and settings save helpers
//! - `events`: Processing of monitor events
//! - `ui_panels`: UI panel drawing methods

mod events;
mod status;
mod ui_panels;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::CreationContext;
use usb_detect::{CommandProvider, DeviceDescriber, InfoProvider};
use usb_monitor::{MonitorEvent, MonitorState, UsbMonitor};

use crate::console::Console;
use crate::device_table::DeviceTable;
use crate::settings::Settings;

/// Headline status shown above the device table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    /// Monitoring has not been started yet
    Ready,
    /// A session is running
    Active,
    /// The last session has finished
    Stopped,
}

impl MonitorStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "Ready to monitor",
            Self::Active => "Monitoring Active...",
            Self::Stopped => "Monitoring Stopped",
        }
    }
}

/// Main application state
pub struct UsbWatchApp {
    /// Settings
    pub(super) settings: Settings,
    /// Kernel event monitor
    pub(super) monitor: UsbMonitor,
    /// Monitor event sender (cloned into each monitor)
    pub(super) event_tx: Sender<MonitorEvent>,
    /// Monitor event receiver
    pub(super) event_rx: Receiver<MonitorEvent>,
    /// Sessions started whose `Finished` has not arrived yet
    pub(super) pending_sessions: usize,
    /// Headline status
    pub(super) monitor_status: MonitorStatus,
    /// Attached devices
    pub(super) devices: DeviceTable,
    /// Message console
    pub(super) console: Console,
    /// Status bar message
    pub(super) status_message: Option<(String, Instant)>,
    /// Show settings panel
    pub(super) show_settings: bool,
}

impl UsbWatchApp {
    /// Create a new application
    pub fn new(_cc: &CreationContext<'_>) -> Self {
        let settings = Settings::load();
        let (event_tx, event_rx) = mpsc::channel();

        let mut app = Self {
            monitor: Self::build_monitor(&settings, event_tx.clone()),
            event_tx,
            event_rx,
            pending_sessions: 0,
            monitor_status: MonitorStatus::Ready,
            devices: DeviceTable::new(),
            console: Console::new(settings.console_history_size),
            status_message: None,
            show_settings: false,
            settings,
        };

        if app.settings.auto_start {
            app.start_monitoring();
        }

        app
    }

    /// Build a monitor from the current settings
    fn build_monitor(settings: &Settings, events: Sender<MonitorEvent>) -> UsbMonitor {
        let provider: Arc<dyn InfoProvider> = match CommandProvider::with_config(&settings.provider)
        {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                tracing::error!("Device lookups disabled: {}", e);
                Arc::new(|_: &str| String::new())
            }
        };
        let describer = DeviceDescriber::with_config(provider, &settings.provider);
        UsbMonitor::new(settings.monitor.clone(), describer, events)
    }

    /// Start a monitoring session with the current settings
    pub(super) fn start_monitoring(&mut self) {
        if self.monitor.state() != MonitorState::Stopped {
            return;
        }

        // Pick up settings changed since the last session
        self.monitor = Self::build_monitor(&self.settings, self.event_tx.clone());

        // Every start produces exactly one Finished, even on failure
        self.pending_sessions += 1;
        match self.monitor.start() {
            Ok(()) => self.monitor_status = MonitorStatus::Active,
            Err(e) => self.report_err("Monitor", e.to_string()),
        }
    }

    /// Request the running session to stop
    pub(super) fn stop_monitoring(&mut self) {
        self.monitor.stop();
    }
}

impl eframe::App for UsbWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_monitor_events();

        // Clear old status messages
        if let Some((_, when)) = &self.status_message {
            if when.elapsed().as_secs() > 5 {
                self.status_message = None;
            }
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            self.draw_controls(ui, ctx);
        });

        if self.show_settings {
            egui::SidePanel::right("settings")
                .default_width(320.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.heading("Settings");
                        ui.separator();
                        if let Some(error) = self.settings.draw(ui) {
                            self.handle_save_error(error);
                        }
                        self.console
                            .set_max_entries(self.settings.console_history_size);

                        ui.add_space(16.0);
                        ui.separator();
                        if ui.button("Close").clicked() {
                            self.show_settings = false;
                        }
                    });
                });
        }

        if self.settings.show_console {
            egui::TopBottomPanel::bottom("console")
                .resizable(true)
                .default_height(220.0)
                .min_height(120.0)
                .show(ctx, |ui| {
                    self.console.draw(ui);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_device_panel(ui);
        });

        // Keep polling the channel while a session is alive
        if self.devices.is_animating() {
            ctx.request_repaint();
        } else if self.monitor.state().is_active() || self.pending_sessions > 0 {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
