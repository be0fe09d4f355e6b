//! Error types for uevent field decoding

use thiserror::Error;

/// Errors that can occur while decoding structured uevent fields
///
/// Raw datagram parsing and classification never fail; only fields with an
/// inner structure (such as `PRODUCT`) report errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Vendor token missing from a `PRODUCT` field
    #[error("missing vendor id in {0:?}")]
    MissingVendor(String),

    /// Product token missing from a `PRODUCT` field
    #[error("missing product id in {0:?}")]
    MissingProduct(String),

    /// Token is not a 1-4 digit hexadecimal id
    #[error("invalid hex id: {0:?}")]
    InvalidHex(String),
}
