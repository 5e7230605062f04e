//! Evidence records pairing a probe with its raw output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Evidence keyed by the fact it explains.
pub type EvidenceMap = BTreeMap<String, Evidence>;

/// Well-known evidence keys.
pub mod keys {
    pub const OS_TYPE: &str = "os_type";
    pub const OS_NAME: &str = "os_name";
    pub const OS_VERSION: &str = "os_version";
    pub const KERNEL: &str = "kernel";
    pub const CPU: &str = "cpu";
    pub const ARCHITECTURE: &str = "architecture";
    pub const HOSTNAME: &str = "hostname";
    pub const DETECTION: &str = "detection";
    pub const VERSION: &str = "version";
}

/// Audit record of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// The command exactly as issued, including any ssh wrapping.
    pub command_run: String,
    /// The probe before transport wrapping, when it differs from `command_run`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_command: Option<String>,
    /// Raw output, trimmed at the edges only.
    pub raw_output: String,
    /// Whether the probe succeeded.
    pub success: bool,
    /// SHA256 of `raw_output`.
    pub output_sha256: String,
}

impl Evidence {
    /// Create evidence for a completed probe.
    pub fn new(command_run: impl Into<String>, raw_output: &str, success: bool) -> Self {
        let raw_output = raw_output.trim().to_string();
        let output_sha256 = hostprint_common::hash::sha256_str(&raw_output);

        Self {
            command_run: command_run.into(),
            remote_command: None,
            raw_output,
            success,
            output_sha256,
        }
    }

    /// Attach the unwrapped probe text.
    pub fn with_remote_command(mut self, command: impl Into<String>) -> Self {
        self.remote_command = Some(command.into());
        self
    }

    /// Check the stored digest against the stored output.
    pub fn is_intact(&self) -> bool {
        hostprint_common::hash::sha256_str(&self.raw_output) == self.output_sha256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_trims_edges_only() {
        let evidence = Evidence::new("uname -a", "  Linux host 6.1.0  x86_64\n", true);
        assert_eq!(evidence.raw_output, "Linux host 6.1.0  x86_64");
        assert!(evidence.success);
        assert!(evidence.is_intact());
    }

    #[test]
    fn test_remote_command_omitted_when_local() {
        let evidence = Evidence::new("hostname", "web-01", true);
        let json = serde_json::to_value(&evidence).unwrap();
        assert!(json.get("remote_command").is_none());
        assert_eq!(json["command_run"], "hostname");

        let wrapped = Evidence::new("ssh -o BatchMode=yes web-01 hostname", "web-01", true)
            .with_remote_command("hostname");
        let json = serde_json::to_value(&wrapped).unwrap();
        assert_eq!(json["remote_command"], "hostname");
    }

    #[test]
    fn test_tampered_output_detected() {
        let mut evidence = Evidence::new("sw_vers -productVersion", "14.2.1", true);
        evidence.raw_output = "99.0".to_string();
        assert!(!evidence.is_intact());
    }
}
