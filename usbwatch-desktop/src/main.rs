//! USB Device Monitor Desktop Application
//!
//! Shows USB devices and storage volumes as they are plugged in and
//! removed, with a console of monitor messages.

mod app;
mod console;
mod device_table;
mod settings;

use app::UsbWatchApp;
use eframe::NativeOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "usbwatch=info,usb_uevent=info,usb_detect=info,usb_monitor=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting USB Device Monitor");

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([850.0, 600.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("USB Device Monitor"),
        ..Default::default()
    };

    eframe::run_native(
        "usbwatch",
        options,
        Box::new(|cc| Ok(Box::new(UsbWatchApp::new(cc)))),
    )
}
