//! Device descriptions
//!
//! Turns a classified `add` event into the text shown to the user:
//!
//! - USB devices: `Device: <lsusb description>`, falling back to
//!   `Device: <ID_MODEL>` or `Device: Unknown`
//! - USB storage: `Storage: <matching lsblk lines>`, or nothing

use std::sync::Arc;

use tracing::debug;
use usb_uevent::{fields, ClassifiedEvent, ProductId, Subsystem};

use crate::provider::{InfoProvider, ProviderConfig};

/// Prefix for USB device descriptions
pub const DEVICE_PREFIX: &str = "Device: ";

/// Prefix for block device descriptions
pub const STORAGE_PREFIX: &str = "Storage: ";

/// Distance from the start of the `vendor:product` match to the description
const LSUSB_DESCRIPTION_OFFSET: usize = 9;

/// Produces human-readable descriptions for classified events
#[derive(Clone)]
pub struct DeviceDescriber {
    provider: Arc<dyn InfoProvider>,
    usb_list_command: String,
    block_list_command: String,
}

impl DeviceDescriber {
    /// Create a describer with the default lookup commands
    pub fn new(provider: Arc<dyn InfoProvider>) -> Self {
        Self::with_config(provider, &ProviderConfig::default())
    }

    /// Create a describer using the commands from `config`
    pub fn with_config(provider: Arc<dyn InfoProvider>, config: &ProviderConfig) -> Self {
        Self {
            provider,
            usb_list_command: config.usb_list_command.clone(),
            block_list_command: config.block_list_command.clone(),
        }
    }

    /// Describe a newly attached device
    ///
    /// Returns `None` when there is nothing to report: a USB event without
    /// `PRODUCT`, or a storage event without `DEVNAME` or without a
    /// matching block device.
    pub fn describe(&self, event: &ClassifiedEvent) -> Option<String> {
        match event.subsystem {
            Subsystem::Usb => self.describe_usb(event),
            Subsystem::Block => self.describe_block(event),
        }
    }

    fn describe_usb(&self, event: &ClassifiedEvent) -> Option<String> {
        let product = event.field(fields::PRODUCT)?;

        let looked_up = match ProductId::parse(product) {
            Ok(id) => self.lookup_usb(&id),
            Err(e) => {
                debug!("Not querying provider for {}: {}", event.parent_devpath, e);
                None
            }
        };

        let description = looked_up.unwrap_or_else(|| {
            event
                .field(fields::ID_MODEL)
                .unwrap_or("Unknown")
                .to_string()
        });

        Some(format!("{DEVICE_PREFIX}{description}"))
    }

    fn lookup_usb(&self, id: &ProductId) -> Option<String> {
        let needle = id.query();
        let output = self
            .provider
            .run(&format!("{} -d {}", self.usb_list_command, needle));

        output.lines().find_map(|line| {
            let pos = line.find(&needle)?;
            let rest = line
                .get(pos + LSUSB_DESCRIPTION_OFFSET..)?
                .trim_end_matches(['\r', '\n']);
            (!rest.is_empty()).then(|| rest.to_string())
        })
    }

    fn describe_block(&self, event: &ClassifiedEvent) -> Option<String> {
        let devname = event.field(fields::DEVNAME)?;
        let name = devname.rsplit('/').next().unwrap_or(devname);
        if name.is_empty() {
            return None;
        }

        let output = self.provider.run(&self.block_list_command);
        let matching: Vec<&str> = output.lines().filter(|line| line.contains(name)).collect();

        if matching.is_empty() {
            debug!("No block device listing for {}", name);
            return None;
        }

        let listing = matching.join("\n");
        Some(format!(
            "{STORAGE_PREFIX}{}",
            listing.trim_end_matches(['\r', '\n'])
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use usb_uevent::{classify, UEvent};

    use super::*;

    fn usb_event(extra: &[(&str, &str)]) -> ClassifiedEvent {
        let mut event: UEvent = [
            ("ACTION", "add"),
            ("DEVPATH", "/devices/pci0000:00/usb1/1-1"),
            ("SUBSYSTEM", "usb"),
        ]
        .into_iter()
        .collect();
        for (k, v) in extra {
            event.insert(*k, *v);
        }
        classify(event).unwrap()
    }

    fn block_event(devname: Option<&str>) -> ClassifiedEvent {
        let mut event: UEvent = [
            ("ACTION", "add"),
            ("DEVPATH", "/devices/pci0000:00/usb2/2-1/2-1:1.0/host0/block/sdb"),
            ("SUBSYSTEM", "block"),
            ("ID_BUS", "usb"),
        ]
        .into_iter()
        .collect();
        if let Some(name) = devname {
            event.insert("DEVNAME", name);
        }
        classify(event).unwrap()
    }

    fn describer(output: &'static str) -> DeviceDescriber {
        DeviceDescriber::new(Arc::new(move |_: &str| output.to_string()))
    }

    #[test]
    fn test_usb_description_from_provider() {
        let commands = Arc::new(Mutex::new(Vec::new()));
        let seen = commands.clone();
        let describer = DeviceDescriber::new(Arc::new(move |cmd: &str| {
            seen.lock().unwrap().push(cmd.to_string());
            "ID 046d:c52b Logitech USB Receiver\n".to_string()
        }));

        let event = usb_event(&[("PRODUCT", "46d/c52b/1")]);
        assert_eq!(
            describer.describe(&event).as_deref(),
            Some("Device: Logitech USB Receiver")
        );
        assert_eq!(*commands.lock().unwrap(), vec!["lsusb -d 46d:c52b".to_string()]);
    }

    #[test]
    fn test_usb_description_real_lsusb_line() {
        let describer =
            describer("Bus 001 Device 004: ID 046d:c52b Logitech, Inc. Unifying Receiver\n");
        let event = usb_event(&[("PRODUCT", "46d/c52b/1203")]);
        assert_eq!(
            describer.describe(&event).as_deref(),
            Some("Device: Logitech, Inc. Unifying Receiver")
        );
    }

    #[test]
    fn test_usb_falls_back_to_model() {
        let describer = describer("");
        let event = usb_event(&[("PRODUCT", "781/5567/100"), ("ID_MODEL", "Cruzer_Blade")]);
        assert_eq!(
            describer.describe(&event).as_deref(),
            Some("Device: Cruzer_Blade")
        );
    }

    #[test]
    fn test_usb_falls_back_to_unknown() {
        let describer = describer("Bus 001 Device 002: ID 8087:0024 Intel Corp. Hub\n");
        let event = usb_event(&[("PRODUCT", "46d/c52b/1")]);
        assert_eq!(describer.describe(&event).as_deref(), Some("Device: Unknown"));
    }

    #[test]
    fn test_usb_match_without_room_for_description() {
        let describer = describer("46d:c52b");
        let event = usb_event(&[("PRODUCT", "46d/c52b/1")]);
        assert_eq!(describer.describe(&event).as_deref(), Some("Device: Unknown"));
    }

    #[test]
    fn test_usb_invalid_product_skips_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let describer = DeviceDescriber::new(Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            String::new()
        }));

        let event = usb_event(&[("PRODUCT", "46d/c52b;reboot/1"), ("ID_MODEL", "Widget")]);
        assert_eq!(describer.describe(&event).as_deref(), Some("Device: Widget"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_usb_without_product_reports_nothing() {
        let describer = describer("ID 046d:c52b Logitech USB Receiver");
        let event = usb_event(&[("ID_MODEL", "Receiver")]);
        assert_eq!(describer.describe(&event), None);
    }

    #[test]
    fn test_block_description() {
        let describer = describer(
            "NAME MODEL SIZE FSTYPE TRAN\nsda Samsung_SSD 465.8G  sata\nsdb Cruzer_Blade 14.9G  usb\nsdb1  14.9G vfat \n",
        );
        let event = block_event(Some("/dev/sdb"));
        assert_eq!(
            describer.describe(&event).as_deref(),
            Some("Storage: sdb Cruzer_Blade 14.9G  usb\nsdb1  14.9G vfat ")
        );
    }

    #[test]
    fn test_block_custom_command() {
        let config = ProviderConfig {
            block_list_command: "lsblk -l".to_string(),
            ..Default::default()
        };
        let describer = DeviceDescriber::with_config(
            Arc::new(|cmd: &str| {
                if cmd == "lsblk -l" {
                    "sdc 1G\n".to_string()
                } else {
                    String::new()
                }
            }),
            &config,
        );
        let event = block_event(Some("sdc"));
        assert_eq!(describer.describe(&event).as_deref(), Some("Storage: sdc 1G"));
    }

    #[test]
    fn test_block_without_match_reports_nothing() {
        let describer = describer("sda Samsung_SSD 465.8G  sata\n");
        assert_eq!(describer.describe(&block_event(Some("/dev/sdb"))), None);
    }

    #[test]
    fn test_block_without_devname_reports_nothing() {
        let describer = describer("sdb Cruzer_Blade 14.9G  usb\n");
        assert_eq!(describer.describe(&block_event(None)), None);
        assert_eq!(describer.describe(&block_event(Some("/dev/"))), None);
    }
}
