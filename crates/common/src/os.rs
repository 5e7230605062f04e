//! Platform keys and operating system families.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key selecting per-platform detection rules in the software configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKey {
    Darwin,
    Linux,
    Windows,
}

impl PlatformKey {
    /// Fixed order used when the target platform is not known up front.
    pub const ALL: [PlatformKey; 3] = [PlatformKey::Darwin, PlatformKey::Linux, PlatformKey::Windows];

    /// Platform key of the host this binary runs on.
    ///
    /// Hosts that are neither macOS nor Windows use the `linux` rules.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    fn from_os_name(os: &str) -> Self {
        match os {
            "macos" => PlatformKey::Darwin,
            "windows" => PlatformKey::Windows,
            _ => PlatformKey::Linux,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKey::Darwin => "darwin",
            PlatformKey::Linux => "linux",
            PlatformKey::Windows => "windows",
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "darwin" | "macos" => Ok(PlatformKey::Darwin),
            "linux" => Ok(PlatformKey::Linux),
            "windows" => Ok(PlatformKey::Windows),
            _ => Err(crate::Error::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// Operating system family as resolved by probing a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Darwin,
    Linux,
    Windows,
    GenericUnix,
}

impl OsFamily {
    /// Classify the output of `uname -s`.
    ///
    /// Any non-empty kernel name other than Darwin or Linux is a generic Unix.
    pub fn from_kernel_name(name: &str) -> Option<Self> {
        match name.trim() {
            "" => None,
            n if n.eq_ignore_ascii_case("darwin") => Some(OsFamily::Darwin),
            n if n.eq_ignore_ascii_case("linux") => Some(OsFamily::Linux),
            _ => Some(OsFamily::GenericUnix),
        }
    }

    /// Configuration key used for this family.
    pub fn platform_key(&self) -> PlatformKey {
        match self {
            OsFamily::Darwin => PlatformKey::Darwin,
            OsFamily::Linux | OsFamily::GenericUnix => PlatformKey::Linux,
            OsFamily::Windows => PlatformKey::Windows,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Darwin => write!(f, "darwin"),
            OsFamily::Linux => write!(f, "linux"),
            OsFamily::Windows => write!(f, "windows"),
            OsFamily::GenericUnix => write!(f, "unix"),
        }
    }
}
