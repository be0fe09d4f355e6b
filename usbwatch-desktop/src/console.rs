//! Console of monitor messages

use std::collections::VecDeque;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use egui::{Color32, RichText, Ui};

/// Severity of a console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleSeverity {
    /// Lifecycle and status messages
    Info,
    /// Device connect/disconnect lines
    Device,
    /// Failures reported by the monitor
    Error,
}

impl ConsoleSeverity {
    /// Classify a monitor log message
    pub fn of_message(message: &str) -> Self {
        if message.starts_with("Error:") {
            Self::Error
        } else {
            Self::Info
        }
    }

    fn color(self) -> Color32 {
        match self {
            Self::Info => Color32::from_rgb(100, 180, 255),
            Self::Device => Color32::from_rgb(100, 255, 180),
            Self::Error => Color32::from_rgb(255, 80, 80),
        }
    }
}

/// A single console line
#[derive(Debug, Clone)]
pub struct ConsoleEntry {
    pub timestamp: SystemTime,
    pub severity: ConsoleSeverity,
    pub message: String,
}

/// Bounded console history
pub struct Console {
    entries: VecDeque<ConsoleEntry>,
    max_entries: usize,
    auto_scroll: bool,
}

impl Console {
    /// Create a console keeping at most `max_entries` lines
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
            auto_scroll: true,
        }
    }

    /// Append a line, evicting the oldest when full
    pub fn push(&mut self, severity: ConsoleSeverity, message: impl Into<String>) {
        self.push_at(SystemTime::now(), severity, message);
    }

    fn push_at(
        &mut self,
        timestamp: SystemTime,
        severity: ConsoleSeverity,
        message: impl Into<String>,
    ) {
        while self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(ConsoleEntry {
            timestamp,
            severity,
            message: message.into(),
        });
    }

    /// Change the history bound, dropping the oldest lines if needed
    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries.max(1);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Format a timestamp as local `HH:MM:SS.mmm`
    pub fn format_timestamp(timestamp: &SystemTime) -> String {
        DateTime::<Local>::from(*timestamp)
            .format("%H:%M:%S%.3f")
            .to_string()
    }

    /// Draw the console
    pub fn draw(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Console");
            ui.label(RichText::new(format!("({})", self.len())).color(Color32::GRAY));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Clear").clicked() {
                    self.clear();
                }
                ui.checkbox(&mut self.auto_scroll, "Auto-scroll");
            });
        });

        ui.separator();

        let row_height = ui.text_style_height(&egui::TextStyle::Monospace);

        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .stick_to_bottom(self.auto_scroll)
            .show_rows(ui, row_height, self.entries.len(), |ui, row_range| {
                for entry in self.entries.range(row_range) {
                    ui.horizontal(|ui| {
                        let time = Self::format_timestamp(&entry.timestamp);
                        ui.label(RichText::new(time).color(Color32::GRAY).monospace());
                        ui.label(
                            RichText::new(&entry.message)
                                .color(entry.severity.color())
                                .monospace(),
                        );
                    });
                }
                ui.add_space(row_height);
            });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_format_timestamp() {
        let local = Local.with_ymd_and_hms(2026, 3, 4, 13, 5, 9).single().unwrap();
        let ts = SystemTime::from(local) + Duration::from_millis(42);
        assert_eq!(Console::format_timestamp(&ts), "13:05:09.042");
    }

    #[test]
    fn test_oldest_lines_are_evicted() {
        let mut console = Console::new(2);
        console.push(ConsoleSeverity::Info, "one");
        console.push(ConsoleSeverity::Info, "two");
        console.push(ConsoleSeverity::Device, "three");

        let messages: Vec<_> = console.entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_shrinking_history() {
        let mut console = Console::new(10);
        for i in 0..5 {
            console.push(ConsoleSeverity::Info, format!("line {i}"));
        }
        console.set_max_entries(3);
        assert_eq!(console.len(), 3);
        assert_eq!(console.entries.front().map(|e| e.message.as_str()), Some("line 2"));
    }

    #[test]
    fn test_error_messages_are_flagged() {
        assert_eq!(
            ConsoleSeverity::of_message("Error: failed to bind netlink socket"),
            ConsoleSeverity::Error
        );
        assert_eq!(
            ConsoleSeverity::of_message("Monitoring stopped."),
            ConsoleSeverity::Info
        );
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_bound(max in 1usize..50, pushes in 0usize..200) {
            let mut console = Console::new(max);
            for i in 0..pushes {
                console.push(ConsoleSeverity::Info, i.to_string());
            }
            prop_assert_eq!(console.len(), pushes.min(max));
        }
    }
}
