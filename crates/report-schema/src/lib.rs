//! Report schema definitions for hostprint.
//!
//! This crate defines the structure of fingerprint reports,
//! including evidence records, product families, and validation.

pub mod evidence;
pub mod family;
pub mod report;
pub mod schema;
pub mod validation;

pub use evidence::{keys, Evidence, EvidenceMap};
pub use family::ProductFamily;
pub use report::{AgentMetadata, Report, ScanType, SoftwareRecord, SystemInfo};
pub use validation::{validate_report, validate_report_value, ValidationError, ValidationResult};
