//! Common utilities and types shared across hostprint crates.

pub mod error;
pub mod hash;
pub mod os;
pub mod timestamp;

pub use error::{Error, Result};
pub use os::{OsFamily, PlatformKey};
pub use timestamp::Timestamp;

/// Sentinel value for any fact that could not be detected.
pub const UNKNOWN: &str = "Unknown";
