//! Runtime support for generated SOAP clients.

pub mod soap;
pub mod xml;

pub use serde;

/// Target of the XSD date and time types.
pub type Timestamp = chrono::DateTime<chrono::FixedOffset>;
