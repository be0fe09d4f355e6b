//! UI panel drawing methods

use egui::{Color32, RichText, Ui};
use usb_monitor::MonitorState;

use super::{MonitorStatus, UsbWatchApp};

impl UsbWatchApp {
    /// Draw the toolbar
    pub(super) fn draw_toolbar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if self.settings.show_console {
                if ui.button("Hide Console").clicked() {
                    self.set_console_visible(false);
                }
            } else if ui.button("Show Console").clicked() {
                self.set_console_visible(true);
            }

            ui.separator();

            if ui.button("Settings").clicked() {
                self.show_settings = !self.show_settings;
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{} device(s)", self.devices.len()));

                ui.separator();

                if let Some((msg, _)) = &self.status_message {
                    ui.label(RichText::new(msg).color(Color32::from_rgb(255, 80, 80)));
                }
            });
        });
    }

    /// Draw the status label and the Start/Stop/Exit buttons
    pub(super) fn draw_controls(&mut self, ui: &mut Ui, ctx: &egui::Context) {
        let state = self.monitor.state();

        ui.horizontal(|ui| {
            let color = match self.monitor_status {
                MonitorStatus::Ready => Color32::GRAY,
                MonitorStatus::Active => Color32::GREEN,
                MonitorStatus::Stopped => Color32::from_rgb(255, 180, 100),
            };
            ui.label(RichText::new(self.monitor_status.label()).color(color).strong());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Exit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }

                let can_stop = matches!(state, MonitorState::Starting | MonitorState::Running);
                if ui
                    .add_enabled(can_stop, egui::Button::new("Stop Monitoring"))
                    .clicked()
                {
                    self.stop_monitoring();
                }

                if ui
                    .add_enabled(
                        state == MonitorState::Stopped,
                        egui::Button::new("Start Monitoring"),
                    )
                    .clicked()
                {
                    self.start_monitoring();
                }
            });
        });
    }

    /// Draw the attached-device table
    pub(super) fn draw_device_panel(&mut self, ui: &mut Ui) {
        ui.heading("Connected Devices");
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.devices
                    .draw(ui, &self.settings.monitor.port_key_delimiter);
            });
    }
}
