//! Config-driven software detection.

use crate::budget::ScanBudget;
use crate::config::SoftwareTarget;
use crate::recorder::probe;
use crate::transport::Transport;
use hostprint_common::{PlatformKey, UNKNOWN};
use hostprint_report_schema::{keys, EvidenceMap, ProductFamily, SoftwareRecord};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Placeholder in version commands, replaced with the install path.
pub const APP_PATH_PLACEHOLDER: &str = "{app_path}";

/// Dotted version with two to four numeric components, not preceded by a digit or dot.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9.])(\d+(?:\.\d+){1,3})").unwrap());

/// First line of trimmed output.
pub fn first_line(output: &str) -> &str {
    output.trim().lines().next().unwrap_or("").trim()
}

/// Replace every `{app_path}` in a version command.
pub fn substitute_app_path(version_command: &str, app_path: &str) -> String {
    version_command.replace(APP_PATH_PLACEHOLDER, app_path)
}

/// Pull the first dotted version number out of free-form output.
pub fn extract_version(output: &str) -> Option<String> {
    VERSION_PATTERN
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Per-target errors. Counted and logged, never propagated past the matcher.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("no detection command for {target} on {platform}")]
    EmptyCommand { target: String, platform: PlatformKey },
}

/// Result of evaluating one target.
#[derive(Debug)]
pub enum MatchOutcome {
    Detected(SoftwareRecord),
    /// The detection probe failed or printed nothing.
    NotDetected,
    /// No rule for the platform(s) tried.
    NotApplicable,
}

/// Which detection rules to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSelection {
    /// Only the rule for a known platform.
    Local(PlatformKey),
    /// darwin, linux, windows in that order; first detection wins.
    AnyInOrder,
}

/// Outcome counts for one detection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventorySummary {
    pub detected: usize,
    pub not_detected: usize,
    pub not_applicable: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Detected records, in target order, plus counts.
#[derive(Debug, Default)]
pub struct Inventory {
    pub records: Vec<SoftwareRecord>,
    pub summary: InventorySummary,
}

/// Evaluates software targets through a transport.
pub struct SoftwareMatcher<'a> {
    transport: &'a dyn Transport,
    timeout: Duration,
    architecture: String,
}

impl<'a> SoftwareMatcher<'a> {
    pub fn new(transport: &'a dyn Transport, timeout: Duration, architecture: impl Into<String>) -> Self {
        Self {
            transport,
            timeout,
            architecture: architecture.into(),
        }
    }

    /// Evaluate every target, isolating failures.
    pub async fn detect_all(
        &self,
        targets: &[SoftwareTarget],
        selection: PlatformSelection,
        budget: &ScanBudget,
    ) -> Inventory {
        info!("Starting software detection...");
        let mut inventory = Inventory::default();

        for (index, target) in targets.iter().enumerate() {
            if budget.is_exhausted() {
                inventory.summary.skipped = targets.len() - index;
                warn!(
                    "Scan budget exhausted, skipping {} remaining software targets",
                    inventory.summary.skipped
                );
                break;
            }

            let outcome = match selection {
                PlatformSelection::Local(key) => self.evaluate(target, key).await,
                PlatformSelection::AnyInOrder => self.evaluate_any(target, &PlatformKey::ALL).await,
            };

            match outcome {
                Ok(MatchOutcome::Detected(record)) => {
                    inventory.summary.detected += 1;
                    inventory.records.push(record);
                }
                Ok(MatchOutcome::NotDetected) => inventory.summary.not_detected += 1,
                Ok(MatchOutcome::NotApplicable) => inventory.summary.not_applicable += 1,
                Err(e) => {
                    inventory.summary.failed += 1;
                    error!("Error detecting {}: {}", target.name, e);
                }
            }
        }

        let summary = &inventory.summary;
        if summary.failed > 0 {
            warn!(
                "Software detection complete: {} found, {} failed",
                summary.detected, summary.failed
            );
        } else {
            info!("Software detection complete: {} products found", summary.detected);
        }
        inventory
    }

    /// Try each platform's rule in order; the first detection wins.
    pub async fn evaluate_any(
        &self,
        target: &SoftwareTarget,
        platforms: &[PlatformKey],
    ) -> Result<MatchOutcome, MatchError> {
        let mut applicable = false;
        let mut first_error = None;

        for &key in platforms {
            match self.evaluate(target, key).await {
                Ok(MatchOutcome::Detected(record)) => return Ok(MatchOutcome::Detected(record)),
                Ok(MatchOutcome::NotDetected) => applicable = true,
                Ok(MatchOutcome::NotApplicable) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match (applicable, first_error) {
            (true, _) => Ok(MatchOutcome::NotDetected),
            (false, Some(e)) => Err(e),
            (false, None) => Ok(MatchOutcome::NotApplicable),
        }
    }

    /// Evaluate a target using one platform's rule.
    pub async fn evaluate(
        &self,
        target: &SoftwareTarget,
        key: PlatformKey,
    ) -> Result<MatchOutcome, MatchError> {
        let Some(rule) = target.rule(key) else {
            info!("No detection config for {} on {}", target.name, key);
            return Ok(MatchOutcome::NotApplicable);
        };

        if rule.command.trim().is_empty() {
            return Err(MatchError::EmptyCommand {
                target: target.name.clone(),
                platform: key,
            });
        }

        let detection = probe(self.transport, &rule.command, self.timeout).await;
        let Some(output) = detection.value() else {
            info!("{} not detected", target.name);
            return Ok(MatchOutcome::NotDetected);
        };
        info!("Detected {}", target.name);

        let install_path = first_line(output).to_string();
        let mut evidence = EvidenceMap::new();

        let version = match rule.version_command() {
            Some(template) => {
                let command = substitute_app_path(template, &install_path);
                let version_probe = probe(self.transport, &command, self.timeout).await;
                let version = version_probe.value().map(|out| first_line(out).to_string());
                evidence.insert(keys::VERSION.to_string(), version_probe.evidence);
                version
            }
            None => extract_version(output),
        };
        evidence.insert(keys::DETECTION.to_string(), detection.evidence);

        Ok(MatchOutcome::Detected(SoftwareRecord {
            product_name: target.name.clone(),
            version_number: version.unwrap_or_else(|| UNKNOWN.to_string()),
            architecture: self.architecture.clone(),
            product_family: normalize_family(&target.family),
            vendor: target.vendor.clone(),
            install_path,
            evidence,
        }))
    }
}

fn normalize_family(raw: &str) -> ProductFamily {
    let (family, substituted) = ProductFamily::normalize(raw);
    if substituted {
        info!("Unknown product family: {}, using 'Other'", raw);
    }
    family
}
