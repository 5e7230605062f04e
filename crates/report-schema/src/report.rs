//! Report types - the single artifact produced by a scan.

use crate::evidence::{keys, EvidenceMap};
use crate::family::ProductFamily;
use hostprint_common::UNKNOWN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The complete fingerprint report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub agent_metadata: AgentMetadata,
    pub system_info: SystemInfo,
    /// Detected software, in the order targets were evaluated.
    pub software_inventory: Vec<SoftwareRecord>,
}

/// How the target was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Local,
    Remote,
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanType::Local => write!(f, "local"),
            ScanType::Remote => write!(f, "remote"),
        }
    }
}

/// Scan metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Unique identifier for this scan.
    pub agent_id: String,
    /// ISO 8601 UTC time the scan finished.
    pub timestamp: String,
    pub scan_type: ScanType,
    pub target_host: String,
    pub agent_version: String,
    pub scan_duration_ms: u64,
}

/// Operating system facts of the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub version: String,
    pub kernel: String,
    pub cpu: String,
    pub architecture: String,
    pub hostname: String,
    #[serde(default)]
    pub evidence: EvidenceMap,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            os: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
            kernel: UNKNOWN.to_string(),
            cpu: UNKNOWN.to_string(),
            architecture: UNKNOWN.to_string(),
            hostname: UNKNOWN.to_string(),
            evidence: EvidenceMap::new(),
        }
    }
}

impl SystemInfo {
    /// Every fact paired with the evidence key that explains it.
    pub fn facts(&self) -> [(&'static str, &str); 6] {
        [
            (keys::OS_NAME, &self.os),
            (keys::OS_VERSION, &self.version),
            (keys::KERNEL, &self.kernel),
            (keys::CPU, &self.cpu),
            (keys::ARCHITECTURE, &self.architecture),
            (keys::HOSTNAME, &self.hostname),
        ]
    }

    /// Mutable access to the fact stored under an evidence key.
    pub fn fact_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            keys::OS_NAME => Some(&mut self.os),
            keys::OS_VERSION => Some(&mut self.version),
            keys::KERNEL => Some(&mut self.kernel),
            keys::CPU => Some(&mut self.cpu),
            keys::ARCHITECTURE => Some(&mut self.architecture),
            keys::HOSTNAME => Some(&mut self.hostname),
            _ => None,
        }
    }
}

/// One detected software product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareRecord {
    pub product_name: String,
    pub version_number: String,
    pub architecture: String,
    pub product_family: ProductFamily,
    pub vendor: String,
    /// First line of the detection output.
    pub install_path: String,
    pub evidence: EvidenceMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Evidence;

    #[test]
    fn test_system_info_defaults_to_unknown() {
        let info = SystemInfo::default();
        assert!(info.facts().iter().all(|(_, v)| *v == UNKNOWN));
        assert!(info.evidence.is_empty());
    }

    #[test]
    fn test_fact_mut_by_key() {
        let mut info = SystemInfo::default();
        *info.fact_mut(keys::CPU).unwrap() = "Apple M2".to_string();
        assert_eq!(info.cpu, "Apple M2");
        assert!(info.fact_mut(keys::OS_TYPE).is_none());
    }

    #[test]
    fn test_software_record_uses_camel_case() {
        let mut evidence = EvidenceMap::new();
        evidence.insert(
            keys::DETECTION.to_string(),
            Evidence::new("which git", "/usr/bin/git", true),
        );
        let record = SoftwareRecord {
            product_name: "Git".to_string(),
            version_number: "2.39.2".to_string(),
            architecture: "x86_64".to_string(),
            product_family: ProductFamily::VersionControl,
            vendor: "Git SCM".to_string(),
            install_path: "/usr/bin/git".to_string(),
            evidence,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["productName"], "Git");
        assert_eq!(json["versionNumber"], "2.39.2");
        assert_eq!(json["productFamily"], "Version Control");
        assert_eq!(json["installPath"], "/usr/bin/git");
        assert!(json["evidence"]["detection"].is_object());
    }
}
