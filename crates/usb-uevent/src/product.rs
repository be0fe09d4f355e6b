//! `PRODUCT` field decoding
//!
//! USB device uevents carry `PRODUCT=<vendor>/<product>/<bcdDevice>` with
//! each id printed as unpadded lowercase hex (e.g. `46d/c52b/1203`).

use std::fmt;

use crate::error::ParseError;

/// Vendor/product pair from a `PRODUCT` field
///
/// The tokens are kept exactly as the kernel printed them so that lookups
/// match the kernel's spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductId {
    pub vendor: String,
    pub product: String,
    /// Device release number, if present
    pub bcd_device: Option<String>,
}

impl ProductId {
    /// Parse a `PRODUCT` field value
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let mut tokens = value.split('/');

        let vendor = tokens
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ParseError::MissingVendor(value.to_string()))?;
        let product = tokens
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ParseError::MissingProduct(value.to_string()))?;

        check_hex(vendor)?;
        check_hex(product)?;

        Ok(Self {
            vendor: vendor.to_string(),
            product: product.to_string(),
            bcd_device: tokens.next().filter(|t| !t.is_empty()).map(str::to_string),
        })
    }

    /// Numeric vendor id
    pub fn vid(&self) -> u16 {
        // validated in parse()
        u16::from_str_radix(&self.vendor, 16).unwrap_or_default()
    }

    /// Numeric product id
    pub fn pid(&self) -> u16 {
        u16::from_str_radix(&self.product, 16).unwrap_or_default()
    }

    /// `vendor:product` in the kernel's spelling
    pub fn query(&self) -> String {
        format!("{}:{}", self.vendor, self.product)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vid(), self.pid())
    }
}

fn check_hex(token: &str) -> Result<(), ParseError> {
    if token.len() <= 4 && token.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ParseError::InvalidHex(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_product() {
        let id = ProductId::parse("46d/c52b/1203").unwrap();
        assert_eq!(id.vendor, "46d");
        assert_eq!(id.product, "c52b");
        assert_eq!(id.bcd_device.as_deref(), Some("1203"));
        assert_eq!(id.vid(), 0x046D);
        assert_eq!(id.pid(), 0xC52B);
        assert_eq!(id.query(), "46d:c52b");
        assert_eq!(id.to_string(), "046d:c52b");
    }

    #[test]
    fn test_parse_without_bcd() {
        let id = ProductId::parse("1d6b/2").unwrap();
        assert_eq!(id.bcd_device, None);
        assert_eq!(id.to_string(), "1d6b:0002");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ProductId::parse(""),
            Err(ParseError::MissingVendor(String::new()))
        );
        assert_eq!(
            ProductId::parse("46d"),
            Err(ParseError::MissingProduct("46d".into()))
        );
        assert_eq!(
            ProductId::parse("46d//1"),
            Err(ParseError::MissingProduct("46d//1".into()))
        );
        assert_eq!(
            ProductId::parse("46d/c52b;rm/1"),
            Err(ParseError::InvalidHex("c52b;rm".into()))
        );
        assert_eq!(
            ProductId::parse("12345/1"),
            Err(ParseError::InvalidHex("12345".into()))
        );
    }
}
