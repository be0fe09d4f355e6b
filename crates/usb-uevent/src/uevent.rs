//! Raw uevent datagram decoding
//!
//! The kernel broadcasts each hotplug event as a flat sequence of
//! NUL-terminated strings. Most are `KEY=VALUE` records; the first one is an
//! `action@devpath` header that carries no `=` and is skipped like any other
//! unrecognized record.

use std::collections::BTreeMap;

use tracing::trace;

use crate::fields;

/// A decoded kernel uevent
///
/// Field names map to their last-seen value. The event is rebuilt for every
/// datagram and discarded once it has been classified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UEvent {
    fields: BTreeMap<String, String>,
}

impl UEvent {
    /// Create an empty event
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any earlier value for the same key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Look up a field value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Check whether a field is present
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of decoded fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no field was decoded
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `ACTION` field
    pub fn action(&self) -> Option<&str> {
        self.get(fields::ACTION)
    }

    /// The `DEVPATH` field
    pub fn devpath(&self) -> Option<&str> {
        self.get(fields::DEVPATH)
    }

    /// The `SUBSYSTEM` field
    pub fn subsystem(&self) -> Option<&str> {
        self.get(fields::SUBSYSTEM)
    }
}

impl<K, V> FromIterator<(K, V)> for UEvent
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut event = UEvent::new();
        for (key, value) in iter {
            event.insert(key, value);
        }
        event
    }
}

/// Decode one raw datagram
///
/// Records are split on NUL bytes and decoding stops at the first empty
/// record. A record is kept only if it is NUL-terminated and contains `=`;
/// everything else (headers, truncated tails) is dropped. Later duplicates
/// of a key overwrite earlier ones. This function never fails.
pub fn parse(raw: &[u8]) -> UEvent {
    let mut event = UEvent::new();
    let mut rest = raw;

    loop {
        let Some(end) = rest.iter().position(|&b| b == 0) else {
            if !rest.is_empty() {
                trace!("Dropping {} byte unterminated trailing fragment", rest.len());
            }
            break;
        };

        let record = &rest[..end];
        rest = &rest[end + 1..];

        if record.is_empty() {
            break;
        }

        let Some(eq) = record.iter().position(|&b| b == b'=') else {
            trace!(
                "Skipping record without '=': {:?}",
                String::from_utf8_lossy(record)
            );
            continue;
        };

        let key = String::from_utf8_lossy(&record[..eq]);
        let value = String::from_utf8_lossy(&record[eq + 1..]);
        event.insert(key, value);
    }

    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_records() {
        let event = parse(b"ACTION=add\0DEVPATH=/devices/usb1/1-1\0SUBSYSTEM=usb\0");
        assert_eq!(event.len(), 3);
        assert_eq!(event.action(), Some("add"));
        assert_eq!(event.devpath(), Some("/devices/usb1/1-1"));
        assert_eq!(event.subsystem(), Some("usb"));
    }

    #[test]
    fn test_parse_skips_kernel_header() {
        let event = parse(b"add@/devices/usb1/1-1\0ACTION=add\0SEQNUM=4021\0");
        assert_eq!(event.len(), 2);
        assert_eq!(event.get("SEQNUM"), Some("4021"));
        assert!(!event.contains("add@/devices/usb1/1-1"));
    }

    #[test]
    fn test_parse_last_write_wins() {
        let event = parse(b"ACTION=add\0ACTION=remove\0");
        assert_eq!(event.action(), Some("remove"));
        assert_eq!(event.len(), 1);
    }

    #[test]
    fn test_parse_stops_at_empty_record() {
        let event = parse(b"ACTION=add\0\0DEVPATH=/devices/x\0");
        assert_eq!(event.len(), 1);
        assert!(event.devpath().is_none());
    }

    #[test]
    fn test_parse_drops_unterminated_fragment() {
        let event = parse(b"ACTION=add\0DEVPATH=/devices/trunc");
        assert_eq!(event.action(), Some("add"));
        assert!(event.devpath().is_none());
    }

    #[test]
    fn test_parse_value_may_contain_equals() {
        let event = parse(b"MODALIAS=usb:v046D=x\0");
        assert_eq!(event.get("MODALIAS"), Some("usb:v046D=x"));
    }

    #[test]
    fn test_parse_empty_and_garbage() {
        assert!(parse(b"").is_empty());
        assert!(parse(b"\0").is_empty());
        assert!(parse(b"no equals here\0also none\0").is_empty());
        assert!(parse(&[0xff, 0xfe, b'=', 0x80]).is_empty());
    }

    #[test]
    fn test_parse_invalid_utf8_is_lossy() {
        let event = parse(b"ID_MODEL=Flash\xffDrive\0");
        assert_eq!(event.get("ID_MODEL"), Some("Flash\u{fffd}Drive"));
    }
}
