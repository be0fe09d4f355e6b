//! Application settings

use std::path::PathBuf;

use egui::Ui;
use serde::{Deserialize, Serialize};
use usb_detect::ProviderConfig;
use usb_monitor::MonitorConfig;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Kernel event monitor configuration
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Device lookup configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Start monitoring as soon as the window opens
    #[serde(default)]
    pub auto_start: bool,
    /// Console history size
    #[serde(default = "default_console_history_size")]
    pub console_history_size: usize,
    /// Show the console panel
    #[serde(default = "default_true")]
    pub show_console: bool,
}

fn default_console_history_size() -> usize {
    500
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            provider: ProviderConfig::default(),
            auto_start: false,
            console_history_size: default_console_history_size(),
            show_console: true,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for usbwatch
    /// Uses $XDG_CONFIG_HOME/usbwatch, falls back to ~/.config/usbwatch
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("usbwatch"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("usbwatch"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .map(|s| Self::from_json(&s))
            .unwrap_or_default()
    }

    /// Parse settings, falling back to defaults on malformed input
    fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed settings file: {}", e);
            Self::default()
        })
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(&path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }

    fn auto_save_if_changed(&self, previous: &Settings) -> Option<String> {
        if self != previous {
            if let Err(e) = self.save() {
                return Some(e);
            }
        }
        None
    }

    /// Draw settings UI (auto-saves on change)
    /// Returns an error message if save failed
    pub fn draw(&mut self, ui: &mut Ui) -> Option<String> {
        let previous = self.clone();

        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                ui.label("Poll interval (ms):");
                ui.add(egui::DragValue::new(&mut self.monitor.poll_interval_ms).range(10..=5000));
                ui.end_row();

                ui.label("Lookup timeout (ms):");
                ui.add(egui::DragValue::new(&mut self.provider.timeout_ms).range(100..=10000));
                ui.end_row();

                ui.label("USB lookup:");
                ui.text_edit_singleline(&mut self.provider.usb_list_command);
                ui.end_row();

                ui.label("Storage lookup:");
                ui.text_edit_singleline(&mut self.provider.block_list_command);
                ui.end_row();

                ui.label("Start on launch:");
                ui.checkbox(&mut self.auto_start, "");
                ui.end_row();

                ui.label("Console history:");
                ui.add(egui::DragValue::new(&mut self.console_history_size).range(50..=10000));
                ui.end_row();
            });

        ui.add_space(8.0);
        ui.label(
            egui::RichText::new("Changes apply the next time monitoring starts.")
                .small()
                .color(egui::Color32::GRAY),
        );

        ui.add_space(16.0);

        if let Some(path) = Self::settings_path() {
            ui.label(
                egui::RichText::new(format!("Config: {}", path.display()))
                    .small()
                    .color(egui::Color32::GRAY),
            );
        }

        self.auto_save_if_changed(&previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.auto_start);
        assert!(settings.show_console);
        assert_eq!(settings.console_history_size, 500);
        assert_eq!(settings.monitor.poll_interval_ms, 1000);
        assert_eq!(settings.provider.usb_list_command, "lsusb");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings =
            Settings::from_json(r#"{ "auto_start": true, "monitor": { "poll_interval_ms": 250 } }"#);
        assert!(settings.auto_start);
        assert_eq!(settings.monitor.poll_interval_ms, 250);
        assert_eq!(settings.monitor.buffer_size, 4096);
        assert_eq!(settings.provider, ProviderConfig::default());
        assert_eq!(settings.console_history_size, 500);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        assert_eq!(Settings::from_json("{ not json"), Settings::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut settings = Settings::default();
        settings.show_console = false;
        settings.provider.timeout_ms = 500;

        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::from_json(&json), settings);
    }
}
