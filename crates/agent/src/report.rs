//! Report assembly and report file I/O.

use crate::scan::ScanIdentity;
use anyhow::{Context, Result};
use hostprint_common::Timestamp;
use hostprint_report_schema::{AgentMetadata, Report, ScanType, SoftwareRecord, SystemInfo};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Build the final report. No probing happens here.
pub fn assemble_report(
    identity: &dyn ScanIdentity,
    scan_type: ScanType,
    target_host: &str,
    duration: Duration,
    system_info: SystemInfo,
    software_inventory: Vec<SoftwareRecord>,
) -> Report {
    Report {
        agent_metadata: AgentMetadata {
            agent_id: identity.agent_id(),
            timestamp: identity.timestamp().to_iso8601(),
            scan_type,
            target_host: target_host.to_string(),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            scan_duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        },
        system_info,
        software_inventory,
    }
}

/// `fingerprint_<timestamp>.json`, with `:` replaced so the name is portable.
pub fn default_report_path(report: &Report) -> PathBuf {
    let raw = &report.agent_metadata.timestamp;
    let stem = raw
        .parse::<Timestamp>()
        .map(|ts| ts.to_file_stem())
        .unwrap_or_else(|_| raw.replace(':', "-"));
    PathBuf::from(format!("fingerprint_{}.json", stem))
}

/// Write a report as pretty-printed JSON.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(())
}

pub fn read_report(path: &Path) -> Result<Report> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report {}", path.display()))
}
