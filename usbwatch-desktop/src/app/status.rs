//! Status messaging and save helpers

use std::time::Instant;

use super::UsbWatchApp;

impl UsbWatchApp {
    /// Report an error via tracing (shows in console and status bar)
    pub(super) fn report_err(&mut self, source: &str, message: impl Into<String>) {
        let message = message.into();
        self.status_message = Some((format!("{}: {}", source, message), Instant::now()));
        tracing::error!(source = source, "{}", message);
    }

    /// Handle a settings save error
    pub(super) fn handle_save_error(&mut self, error: String) {
        self.report_err("Settings", error);
    }

    /// Persist the console visibility toggle
    pub(super) fn set_console_visible(&mut self, visible: bool) {
        if self.settings.show_console == visible {
            return;
        }
        self.settings.show_console = visible;
        if let Err(e) = self.settings.save() {
            self.handle_save_error(e);
        }
    }
}
