//! Evidence recording around transport calls.

use crate::transport::{CommandOutput, Transport};
use hostprint_report_schema::Evidence;
use std::time::Duration;
use tracing::debug;

/// Shape a transport result into evidence.
pub fn record(output: &CommandOutput) -> Evidence {
    let evidence = Evidence::new(&output.issued_command, &output.output, output.success);
    match &output.remote_command {
        Some(remote) => evidence.with_remote_command(remote),
        None => evidence,
    }
}

/// A completed probe and its evidence.
#[derive(Debug, Clone)]
pub struct Probe {
    pub output: CommandOutput,
    pub evidence: Evidence,
}

impl Probe {
    /// Trimmed output of a successful, non-empty probe.
    pub fn value(&self) -> Option<&str> {
        let value = self.output.output.trim();
        (self.output.success && !value.is_empty()).then_some(value)
    }
}

/// Run one command and record it.
pub async fn probe(transport: &dyn Transport, command: &str, timeout: Duration) -> Probe {
    let output = transport.execute(command, timeout).await;
    debug!(
        success = output.success,
        bytes = output.output.len(),
        "Probe finished: {}",
        command
    );
    let evidence = record(&output);
    Probe { output, evidence }
}
