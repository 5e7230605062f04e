//! Product family classification for detected software.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standardized product family categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductFamily {
    #[serde(rename = "IDE")]
    Ide,
    Browser,
    Virtualization,
    Communication,
    #[serde(rename = "Programming Language")]
    ProgrammingLanguage,
    #[serde(rename = "Version Control")]
    VersionControl,
    Database,
    Runtime,
    Container,
    #[serde(rename = "Cloud Tools")]
    CloudTools,
    Security,
    Monitoring,
    Other,
    Unknown,
}

/// Alternate spellings accepted in configuration files.
const ALIASES: &[(&str, ProductFamily)] = &[
    ("Editor", ProductFamily::Ide),
    ("Web Browser", ProductFamily::Browser),
    ("Browsers", ProductFamily::Browser),
    ("Hypervisor", ProductFamily::Virtualization),
    ("VM", ProductFamily::Virtualization),
    ("Chat", ProductFamily::Communication),
    ("Messaging", ProductFamily::Communication),
    ("Language", ProductFamily::ProgrammingLanguage),
    ("Programming", ProductFamily::ProgrammingLanguage),
    ("VCS", ProductFamily::VersionControl),
    ("SCM", ProductFamily::VersionControl),
    ("Version-Control", ProductFamily::VersionControl),
    ("DB", ProductFamily::Database),
    ("Containers", ProductFamily::Container),
    ("Container Runtime", ProductFamily::Container),
    ("Cloud", ProductFamily::CloudTools),
    ("Observability", ProductFamily::Monitoring),
];

impl ProductFamily {
    pub const ALL: [ProductFamily; 14] = [
        ProductFamily::Ide,
        ProductFamily::Browser,
        ProductFamily::Virtualization,
        ProductFamily::Communication,
        ProductFamily::ProgrammingLanguage,
        ProductFamily::VersionControl,
        ProductFamily::Database,
        ProductFamily::Runtime,
        ProductFamily::Container,
        ProductFamily::CloudTools,
        ProductFamily::Security,
        ProductFamily::Monitoring,
        ProductFamily::Other,
        ProductFamily::Unknown,
    ];

    /// Canonical display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductFamily::Ide => "IDE",
            ProductFamily::Browser => "Browser",
            ProductFamily::Virtualization => "Virtualization",
            ProductFamily::Communication => "Communication",
            ProductFamily::ProgrammingLanguage => "Programming Language",
            ProductFamily::VersionControl => "Version Control",
            ProductFamily::Database => "Database",
            ProductFamily::Runtime => "Runtime",
            ProductFamily::Container => "Container",
            ProductFamily::CloudTools => "Cloud Tools",
            ProductFamily::Security => "Security",
            ProductFamily::Monitoring => "Monitoring",
            ProductFamily::Other => "Other",
            ProductFamily::Unknown => "Unknown",
        }
    }

    /// Exact, case-sensitive match against canonical names and aliases.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|family| family.as_str() == raw)
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == raw)
                    .map(|(_, family)| *family)
            })
    }

    /// Like [`ProductFamily::parse`], but unmatched input becomes `Other`.
    ///
    /// The flag is `true` when `Other` was substituted for unmatched input.
    pub fn normalize(raw: &str) -> (Self, bool) {
        match Self::parse(raw) {
            Some(family) => (family, false),
            None => (ProductFamily::Other, true),
        }
    }
}

impl fmt::Display for ProductFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
