//! Scan settings and the software target document.

use anyhow::{Context, Result};
use hostprint_common::PlatformKey;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::transport::CONNECT_TIMEOUT;

/// Default location of the software target document.
pub const DEFAULT_SOFTWARE_CONFIG: &str = "software_config.json";

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub software_config: PathBuf,
    /// Per-command timeout; `None` uses the transport default.
    pub command_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    /// Wall-clock budget for the whole scan.
    pub scan_budget: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            software_config: PathBuf::from(DEFAULT_SOFTWARE_CONFIG),
            command_timeout: None,
            connect_timeout: CONNECT_TIMEOUT,
            scan_budget: None,
        }
    }
}

/// The software target document, after per-entry parsing.
#[derive(Debug, Clone, Default)]
pub struct SoftwareConfig {
    pub software_targets: Vec<SoftwareTarget>,
    /// Entries that could not be parsed and were skipped.
    pub invalid_targets: usize,
}

/// Entries stay untyped until each one is parsed on its own.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default, alias = "software")]
    software_targets: Vec<serde_json::Value>,
}

/// A software product to probe for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftwareTarget {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default = "unknown")]
    pub vendor: String,
    /// Free-form family, normalized when a record is built.
    #[serde(default = "unknown")]
    pub family: String,
    /// Detection rules keyed by platform key. Unrecognized keys are ignored
    /// and `null` entries are dropped.
    #[serde(default, deserialize_with = "rules_without_nulls")]
    pub detection: BTreeMap<String, DetectionRule>,
}

/// Detection and version commands for one platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionRule {
    #[serde(default)]
    pub command: String,
    /// May contain the `{app_path}` placeholder.
    #[serde(default)]
    pub version_command: Option<String>,
}

fn unknown() -> String {
    hostprint_common::UNKNOWN.to_string()
}

fn rules_without_nulls<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, DetectionRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let rules = Option::<BTreeMap<String, Option<DetectionRule>>>::deserialize(deserializer)?;
    Ok(rules
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, rule)| rule.map(|rule| (key, rule)))
        .collect())
}

impl SoftwareTarget {
    /// A target outside the config document with a single rule.
    pub fn custom(
        name: impl Into<String>,
        key: PlatformKey,
        command: impl Into<String>,
        version_command: Option<String>,
    ) -> Self {
        let mut detection = BTreeMap::new();
        detection.insert(
            key.as_str().to_string(),
            DetectionRule {
                command: command.into(),
                version_command,
            },
        );
        Self {
            name: name.into(),
            vendor: unknown(),
            family: "Custom".to_string(),
            detection,
        }
    }

    pub fn rule(&self, key: PlatformKey) -> Option<&DetectionRule> {
        self.detection.get(key.as_str())
    }
}

impl DetectionRule {
    /// The version command, if one is configured and non-blank.
    pub fn version_command(&self) -> Option<&str> {
        self.version_command
            .as_deref()
            .filter(|cmd| !cmd.trim().is_empty())
    }
}

impl SoftwareConfig {
    /// Load from JSON, or YAML for `.yaml`/`.yml` files.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read software config {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let raw: RawDocument = if is_yaml {
            serde_yaml::from_str(&content).context("Failed to parse software config YAML")?
        } else {
            serde_json::from_str(&content).context("Failed to parse software config JSON")?
        };

        let config = Self::from_entries(raw.software_targets);
        info!("Loaded {} software targets from config", config.software_targets.len());
        Ok(config)
    }

    pub fn from_targets(software_targets: Vec<SoftwareTarget>) -> Self {
        Self {
            software_targets,
            invalid_targets: 0,
        }
    }

    /// Parse each entry on its own; malformed entries are skipped and counted.
    fn from_entries(entries: Vec<serde_json::Value>) -> Self {
        let mut config = Self::default();
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<SoftwareTarget>(entry) {
                Ok(target) => config.software_targets.push(target),
                Err(e) => {
                    warn!("Skipping software target #{}: {}", index + 1, e);
                    config.invalid_targets += 1;
                }
            }
        }
        config
    }

    /// Load, or log a warning and fall back to no targets.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}; continuing without software targets", e);
                Self::default()
            }
        }
    }
}
