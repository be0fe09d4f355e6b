//! Table of attached devices
//!
//! Rows are keyed by port key. A disconnected row stays visible while it
//! fades out, then is pruned.

use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local};
use egui::{Color32, RichText, Ui};

/// How long a disconnected row takes to disappear
pub const FADE_DURATION: Duration = Duration::from_millis(500);

/// One attached (or fading) device
#[derive(Debug, Clone)]
pub struct DeviceRow {
    pub port_key: String,
    pub description: String,
    pub connected_at: SystemTime,
    /// Set once the device disconnects
    pub removed_at: Option<Instant>,
}

impl DeviceRow {
    /// Device path part of the port key
    pub fn device_path<'a>(&'a self, delimiter: &str) -> &'a str {
        self.port_key
            .strip_suffix(self.description.as_str())
            .and_then(|rest| rest.strip_suffix(delimiter))
            .unwrap_or(&self.port_key)
    }

    /// Opacity in `0.0..=1.0`
    pub fn opacity(&self, now: Instant) -> f32 {
        match self.removed_at {
            None => 1.0,
            Some(removed) => {
                let elapsed = now.saturating_duration_since(removed);
                1.0 - (elapsed.as_secs_f32() / FADE_DURATION.as_secs_f32()).min(1.0)
            }
        }
    }
}

/// Attached-device table state
#[derive(Default)]
pub struct DeviceTable {
    rows: Vec<DeviceRow>,
}

impl DeviceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, or revive and refresh an existing one
    pub fn connect(&mut self, port_key: &str, description: &str) {
        let now = SystemTime::now();
        if let Some(row) = self.rows.iter_mut().find(|r| r.port_key == port_key) {
            row.description = description.to_string();
            row.connected_at = now;
            row.removed_at = None;
            return;
        }
        self.rows.push(DeviceRow {
            port_key: port_key.to_string(),
            description: description.to_string(),
            connected_at: now,
            removed_at: None,
        });
    }

    /// Start fading a row out; returns false if the key is unknown
    pub fn disconnect(&mut self, port_key: &str, now: Instant) -> bool {
        match self
            .rows
            .iter_mut()
            .find(|r| r.port_key == port_key && r.removed_at.is_none())
        {
            Some(row) => {
                row.removed_at = Some(now);
                true
            }
            None => false,
        }
    }

    /// Drop rows whose fade has completed
    pub fn prune(&mut self, now: Instant) {
        self.rows.retain(|row| {
            row.removed_at
                .is_none_or(|removed| now.saturating_duration_since(removed) < FADE_DURATION)
        });
    }

    /// True while any row is fading
    pub fn is_animating(&self) -> bool {
        self.rows.iter().any(|r| r.removed_at.is_some())
    }

    /// Number of rows, fading ones included
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Format a connection time as local `HH:MM:SS`
    pub fn format_time(timestamp: &SystemTime) -> String {
        DateTime::<Local>::from(*timestamp)
            .format("%H:%M:%S")
            .to_string()
    }

    /// Draw the table
    pub fn draw(&self, ui: &mut Ui, delimiter: &str) {
        let now = Instant::now();
        let base = ui.visuals().text_color();

        if self.rows.is_empty() {
            ui.label(RichText::new("No devices detected").color(Color32::GRAY));
            return;
        }

        egui::Grid::new("device_table")
            .num_columns(3)
            .striped(true)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                ui.label(RichText::new("Device Path").strong());
                ui.label(RichText::new("Information").strong());
                ui.label(RichText::new("Timestamp").strong());
                ui.end_row();

                for row in &self.rows {
                    let text = base.gamma_multiply(row.opacity(now));

                    ui.label(RichText::new(row.device_path(delimiter)).monospace().color(text));
                    ui.label(RichText::new(&row.description).color(text));
                    ui.label(
                        RichText::new(Self::format_time(&row.connected_at))
                            .monospace()
                            .color(text),
                    );
                    ui.end_row();
                }
            });
    }
}
