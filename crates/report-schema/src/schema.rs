//! JSON schema definition for report validation.

/// JSON Schema for a fingerprint report.
pub const REPORT_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "$id": "https://hostprint.dev/schemas/report.json",
  "title": "Hostprint Fingerprint Report",
  "type": "object",
  "required": ["agent_metadata", "system_info", "software_inventory"],
  "definitions": {
    "evidence": {
      "type": "object",
      "required": ["command_run", "raw_output", "success", "output_sha256"],
      "properties": {
        "command_run": { "type": "string" },
        "remote_command": { "type": "string" },
        "raw_output": { "type": "string" },
        "success": { "type": "boolean" },
        "output_sha256": { "type": "string", "pattern": "^[0-9a-f]{64}$" }
      }
    },
    "evidence_map": {
      "type": "object",
      "additionalProperties": { "$ref": "#/definitions/evidence" }
    }
  },
  "properties": {
    "agent_metadata": {
      "type": "object",
      "required": ["agent_id", "timestamp", "scan_type", "target_host", "agent_version", "scan_duration_ms"],
      "properties": {
        "agent_id": {
          "type": "string",
          "pattern": "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
        },
        "timestamp": { "type": "string", "format": "date-time" },
        "scan_type": { "type": "string", "enum": ["local", "remote"] },
        "target_host": { "type": "string", "minLength": 1 },
        "agent_version": { "type": "string" },
        "scan_duration_ms": { "type": "integer", "minimum": 0 }
      }
    },
    "system_info": {
      "type": "object",
      "required": ["os", "version", "kernel", "cpu", "architecture", "hostname", "evidence"],
      "properties": {
        "os": { "type": "string" },
        "version": { "type": "string" },
        "kernel": { "type": "string" },
        "cpu": { "type": "string" },
        "architecture": { "type": "string" },
        "hostname": { "type": "string" },
        "evidence": { "$ref": "#/definitions/evidence_map" }
      }
    },
    "software_inventory": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["productName", "versionNumber", "architecture", "productFamily", "vendor", "installPath", "evidence"],
        "properties": {
          "productName": { "type": "string" },
          "versionNumber": { "type": "string" },
          "architecture": { "type": "string" },
          "productFamily": {
            "type": "string",
            "enum": [
              "IDE", "Browser", "Virtualization", "Communication", "Programming Language",
              "Version Control", "Database", "Runtime", "Container", "Cloud Tools",
              "Security", "Monitoring", "Other", "Unknown"
            ]
          },
          "vendor": { "type": "string" },
          "installPath": { "type": "string" },
          "evidence": {
            "allOf": [
              { "$ref": "#/definitions/evidence_map" },
              { "required": ["detection"] }
            ]
          }
        }
      }
    }
  }
}"##;

/// Get the report schema as a parsed JSON value.
pub fn report_schema() -> serde_json::Value {
    serde_json::from_str(REPORT_SCHEMA).expect("Invalid report schema")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_parses() {
        let schema = report_schema();
        assert_eq!(schema["title"], "Hostprint Fingerprint Report");
    }

    #[test]
    fn test_schema_keeps_definition_refs() {
        let schema = report_schema();
        assert_eq!(
            schema["definitions"]["evidence_map"]["additionalProperties"]["$ref"],
            "#/definitions/evidence"
        );
        assert!(schema["properties"]["software_inventory"].is_object());
    }
}
