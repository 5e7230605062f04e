//! Scan orchestration: system detection, software detection, report assembly.

use crate::budget::ScanBudget;
use crate::config::{ScanConfig, SoftwareConfig};
use crate::report::assemble_report;
use crate::software::{Inventory, PlatformSelection, SoftwareMatcher};
use crate::system::SystemDetector;
use crate::transport::{
    LocalTransport, SshTarget, SshTransport, Transport, LOCAL_TIMEOUT, REMOTE_TIMEOUT,
};
use hostprint_common::{Error, PlatformKey, Result, Timestamp, UNKNOWN};
use hostprint_report_schema::{Report, ScanType, SoftwareRecord, SystemInfo};
use tracing::{error, info};

/// Supplies the scan id and the report timestamp.
pub trait ScanIdentity: Send + Sync {
    fn agent_id(&self) -> String;
    fn timestamp(&self) -> Timestamp;
}

/// Random v4 id, current time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl ScanIdentity for SystemIdentity {
    fn agent_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn timestamp(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Constant id and timestamp, for reproducible reports.
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    agent_id: String,
    timestamp: Timestamp,
}

impl FixedIdentity {
    pub fn new(agent_id: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            agent_id: agent_id.into(),
            timestamp,
        }
    }
}

impl ScanIdentity for FixedIdentity {
    fn agent_id(&self) -> String {
        self.agent_id.clone()
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Runs local and remote scans.
pub struct Scanner {
    config: ScanConfig,
    identity: Box<dyn ScanIdentity>,
    software: Option<SoftwareConfig>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            identity: Box::new(SystemIdentity),
            software: None,
        }
    }

    pub fn with_identity(mut self, identity: Box<dyn ScanIdentity>) -> Self {
        self.identity = identity;
        self
    }

    /// Use these targets instead of loading `software_config`.
    pub fn with_software(mut self, software: SoftwareConfig) -> Self {
        self.software = Some(software);
        self
    }

    /// Scan this machine through the local shell.
    pub async fn run_local_scan(&self) -> Report {
        let transport =
            LocalTransport::with_timeout(self.config.command_timeout.unwrap_or(LOCAL_TIMEOUT));
        self.scan_with(&transport).await
    }

    /// Scan this machine through any transport.
    pub async fn scan_with(&self, transport: &dyn Transport) -> Report {
        self.scan_local_as(transport, PlatformKey::current()).await
    }

    async fn scan_local_as(&self, transport: &dyn Transport, key: PlatformKey) -> Report {
        info!("Starting local scan ({})", key);
        let budget = ScanBudget::new(self.config.scan_budget);

        let (system_info, inventory) = self
            .collect(transport, PlatformSelection::Local(key), budget)
            .await;

        let target_host = if system_info.hostname == UNKNOWN {
            "localhost".to_string()
        } else {
            system_info.hostname.clone()
        };

        self.finish(ScanType::Local, &target_host, budget, system_info, inventory.records)
    }

    /// Scan a remote host over ssh.
    pub async fn run_remote_scan(&self, target: SshTarget) -> Result<Report> {
        let host = target.host.clone();
        let transport = SshTransport::new(target).with_timeouts(
            self.config.command_timeout.unwrap_or(REMOTE_TIMEOUT),
            self.config.connect_timeout,
        );
        self.scan_remote_with(&transport, &host).await
    }

    /// Scan a remote host through any transport. Fails if the host is unreachable.
    pub async fn scan_remote_with(&self, transport: &dyn Transport, host: &str) -> Result<Report> {
        info!("Starting remote scan of {}", host);
        let budget = ScanBudget::new(self.config.scan_budget);

        if !transport.connect().await {
            error!("Failed to connect to {}", host);
            return Err(Error::SshConnection(host.to_string()));
        }

        let (system_info, inventory) = self
            .collect(transport, PlatformSelection::AnyInOrder, budget)
            .await;

        Ok(self.finish(ScanType::Remote, host, budget, system_info, inventory.records))
    }

    async fn collect(
        &self,
        transport: &dyn Transport,
        selection: PlatformSelection,
        budget: ScanBudget,
    ) -> (SystemInfo, Inventory) {
        let timeout = self
            .config
            .command_timeout
            .unwrap_or_else(|| transport.default_timeout());

        let system_info = SystemDetector::new(transport, timeout)
            .with_budget(budget)
            .detect_all()
            .await;

        let software = self.software_config();
        let matcher = SoftwareMatcher::new(transport, timeout, system_info.architecture.clone());
        let mut inventory = matcher
            .detect_all(&software.software_targets, selection, &budget)
            .await;
        // Entries rejected while loading count as failed targets.
        inventory.summary.failed += software.invalid_targets;

        (system_info, inventory)
    }

    fn software_config(&self) -> SoftwareConfig {
        match &self.software {
            Some(software) => software.clone(),
            None => SoftwareConfig::load_or_empty(&self.config.software_config),
        }
    }

    fn finish(
        &self,
        scan_type: ScanType,
        target_host: &str,
        budget: ScanBudget,
        system_info: SystemInfo,
        records: Vec<SoftwareRecord>,
    ) -> Report {
        let elapsed = budget.elapsed();
        info!(
            "Scan of {} complete in {:.2}s: {} products",
            target_host,
            elapsed.as_secs_f64(),
            records.len()
        );
        assemble_report(
            self.identity.as_ref(),
            scan_type,
            target_host,
            elapsed,
            system_info,
            records,
        )
    }
}
