//! Report validation utilities.

use crate::evidence::keys;
use crate::schema;
use crate::Report;
use hostprint_common::UNKNOWN;
use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;

/// Validation error type.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("Fact without evidence: {0}")]
    FactWithoutEvidence(String),

    #[error("Evidence digest mismatch for {0}")]
    DigestMismatch(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result of report validation.
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a report document against the JSON schema.
pub fn validate_report_value(report: &Value) -> Result<ValidationResult, ValidationError> {
    let mut result = ValidationResult::new();

    let schema_value = schema::report_schema();
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|e| ValidationError::SchemaError(e.to_string()))?;

    let validation = compiled.validate(report);
    if let Err(errors) = validation {
        for error in errors {
            result.add_error(ValidationError::SchemaError(format!(
                "{} at {}",
                error, error.instance_path
            )));
        }
    }

    Ok(result)
}

/// Validate a report: schema plus evidence invariants.
///
/// Every fact that is not `Unknown` must carry evidence, every software
/// record must carry detection evidence, and every evidence digest must
/// match its output.
pub fn validate_report(report: &Report) -> Result<ValidationResult, ValidationError> {
    let mut result = ValidationResult::new();

    let report_json = serde_json::to_value(report)?;
    let schema_result = validate_report_value(&report_json)?;
    for error in schema_result.errors {
        result.add_error(error);
    }

    let system = &report.system_info;
    for (key, value) in system.facts() {
        if value == UNKNOWN {
            result.add_warning(format!("system_info.{} is {}", key, UNKNOWN));
        } else if !system.evidence.contains_key(key) {
            result.add_error(ValidationError::FactWithoutEvidence(format!(
                "system_info.{}",
                key
            )));
        }
    }
    for (key, evidence) in &system.evidence {
        if !evidence.is_intact() {
            result.add_error(ValidationError::DigestMismatch(format!(
                "system_info.evidence.{}",
                key
            )));
        }
    }

    for record in &report.software_inventory {
        if !record.evidence.contains_key(keys::DETECTION) {
            result.add_error(ValidationError::FactWithoutEvidence(format!(
                "software_inventory[{}].detection",
                record.product_name
            )));
        }
        if record.version_number != UNKNOWN && !record.evidence.contains_key(keys::VERSION) {
            // Versions parsed out of the detection output are backed by the detection evidence.
            let detection_mentions_version = record
                .evidence
                .get(keys::DETECTION)
                .map(|e| e.raw_output.contains(&record.version_number))
                .unwrap_or(false);
            if !detection_mentions_version {
                result.add_error(ValidationError::FactWithoutEvidence(format!(
                    "software_inventory[{}].version",
                    record.product_name
                )));
            }
        }
        for (key, evidence) in &record.evidence {
            if !evidence.is_intact() {
                result.add_error(ValidationError::DigestMismatch(format!(
                    "software_inventory[{}].evidence.{}",
                    record.product_name, key
                )));
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentMetadata, Evidence, EvidenceMap, ProductFamily, ScanType, SoftwareRecord, SystemInfo};

    fn sample_report() -> Report {
        let mut system_info = SystemInfo {
            os: "Ubuntu".to_string(),
            ..SystemInfo::default()
        };
        system_info.evidence.insert(
            keys::OS_NAME.to_string(),
            Evidence::new("lsb_release -si", "Ubuntu", true),
        );

        let mut evidence = EvidenceMap::new();
        evidence.insert(
            keys::DETECTION.to_string(),
            Evidence::new("which node", "/usr/local/bin/node", true),
        );
        evidence.insert(
            keys::VERSION.to_string(),
            Evidence::new("/usr/local/bin/node --version", "v20.11.0", true),
        );

        Report {
            agent_metadata: AgentMetadata {
                agent_id: uuid::Uuid::new_v4().to_string(),
                timestamp: "2024-01-01T00:00:00.000Z".to_string(),
                scan_type: ScanType::Local,
                target_host: "localhost".to_string(),
                agent_version: "0.1.0".to_string(),
                scan_duration_ms: 42,
            },
            system_info,
            software_inventory: vec![SoftwareRecord {
                product_name: "Node.js".to_string(),
                version_number: "v20.11.0".to_string(),
                architecture: "x86_64".to_string(),
                product_family: ProductFamily::Runtime,
                vendor: "OpenJS Foundation".to_string(),
                install_path: "/usr/local/bin/node".to_string(),
                evidence,
            }],
        }
    }

    #[test]
    fn test_valid_report() {
        let result = validate_report(&sample_report()).unwrap();
        assert!(result.valid, "Errors: {:?}", result.errors);
        // Five of six system facts are Unknown.
        assert_eq!(result.warnings.len(), 5);
    }

    #[test]
    fn test_fact_without_evidence() {
        let mut report = sample_report();
        report.system_info.cpu = "Intel(R) Xeon(R)".to_string();

        let result = validate_report(&report).unwrap();
        assert!(!result.valid);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::FactWithoutEvidence(f) if f == "system_info.cpu")));
    }

    #[test]
    fn test_digest_mismatch() {
        let mut report = sample_report();
        report.software_inventory[0]
            .evidence
            .get_mut(keys::VERSION)
            .unwrap()
            .raw_output = "v0.0.1".to_string();

        let result = validate_report(&report).unwrap();
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::DigestMismatch(_))));
    }

    #[test]
    fn test_version_backed_by_detection_output() {
        let mut report = sample_report();
        let record = &mut report.software_inventory[0];
        record.evidence.remove(keys::VERSION);
        record.evidence.insert(
            keys::DETECTION.to_string(),
            Evidence::new("ls /opt/tool-3.4.1", "/opt/tool-3.4.1", true),
        );
        record.version_number = "3.4.1".to_string();

        let result = validate_report(&report).unwrap();
        assert!(result.valid, "Errors: {:?}", result.errors);
    }

    #[test]
    fn test_schema_rejects_missing_sections() {
        let report = serde_json::json!({
            "agent_metadata": {}
        });

        let result = validate_report_value(&report).unwrap();
        assert!(!result.valid);
    }

    #[test]
    fn test_schema_rejects_unknown_scan_type() {
        let mut value = serde_json::to_value(sample_report()).unwrap();
        value["agent_metadata"]["scan_type"] = serde_json::json!("hybrid");

        let result = validate_report_value(&value).unwrap();
        assert!(!result.valid);
    }
}
