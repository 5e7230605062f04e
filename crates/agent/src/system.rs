//! System information detection.

use crate::budget::ScanBudget;
use crate::platform::{
    probes_for, Fact, PlatformProbes, KERNEL_NAME_PROBE, UNIX_MARKER_PROBE, WINDOWS_PROBE,
};
use crate::recorder::probe;
use crate::transport::Transport;
use hostprint_common::OsFamily;
use hostprint_report_schema::{keys, SystemInfo};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fills a [`SystemInfo`] by running per-family probe waterfalls.
pub struct SystemDetector<'a> {
    transport: &'a dyn Transport,
    timeout: Duration,
    budget: ScanBudget,
}

impl<'a> SystemDetector<'a> {
    pub fn new(transport: &'a dyn Transport, timeout: Duration) -> Self {
        Self {
            transport,
            timeout,
            budget: ScanBudget::unlimited(),
        }
    }

    pub fn with_budget(mut self, budget: ScanBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Detect every fact. Facts that cannot be probed stay `Unknown`.
    pub async fn detect_all(&self) -> SystemInfo {
        self.detect().await.1
    }

    /// Detect every fact and report the family used for routing.
    pub async fn detect(&self) -> (OsFamily, SystemInfo) {
        info!("Starting system detection...");
        let mut info = SystemInfo::default();

        let family = self.resolve_family(&mut info).await;
        let probes = probes_for(family);
        debug!("Resolved OS family: {}", family);

        for fact in Fact::ALL {
            if self.budget.is_exhausted() {
                warn!("Scan budget exhausted, skipping remaining system facts");
                break;
            }
            self.detect_fact(probes.as_ref(), fact, &mut info).await;
        }

        info!("System detection complete: {} {}", info.os, info.version);
        (family, info)
    }

    /// Resolve the OS family: kernel name, then a Unix marker, then Windows.
    ///
    /// The deciding probe is recorded under `os_type`.
    pub async fn resolve_family(&self, info: &mut SystemInfo) -> OsFamily {
        let kernel = probe(self.transport, KERNEL_NAME_PROBE, self.timeout).await;
        if let Some(family) = kernel.value().and_then(OsFamily::from_kernel_name) {
            info.evidence.insert(keys::OS_TYPE.to_string(), kernel.evidence);
            return family;
        }

        let marker = probe(self.transport, UNIX_MARKER_PROBE, self.timeout).await;
        if marker.value().is_some() {
            info.evidence.insert(keys::OS_TYPE.to_string(), marker.evidence);
            return OsFamily::GenericUnix;
        }

        let windows = probe(self.transport, WINDOWS_PROBE, self.timeout).await;
        if windows.value().is_none() {
            warn!("Could not determine OS family, assuming Windows");
        }
        info.evidence.insert(keys::OS_TYPE.to_string(), windows.evidence);
        OsFamily::Windows
    }

    /// Run the candidates for one fact until one yields a value.
    pub async fn detect_fact(
        &self,
        probes: &dyn PlatformProbes,
        fact: Fact,
        info: &mut SystemInfo,
    ) -> bool {
        for candidate in probes.candidates(fact) {
            let result = probe(self.transport, candidate.command, self.timeout).await;
            let Some(value) = result.value().and_then(|out| candidate.extract.apply(out)) else {
                continue;
            };

            if let Some(slot) = info.fact_mut(fact.key()) {
                *slot = value;
            }
            info.evidence.insert(fact.key().to_string(), result.evidence);
            return true;
        }

        debug!("No candidate succeeded for {}", fact.key());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;
    use hostprint_common::{PlatformKey, UNKNOWN};

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn linux_host() -> ScriptedTransport {
        ScriptedTransport::new()
            .ok("uname -s", "Linux")
            .ok(
                "cat /etc/os-release 2>/dev/null | grep '^NAME=' | cut -d'=' -f2 | tr -d '\"'",
                "Ubuntu 22.04 LTS",
            )
            .ok(
                "cat /etc/os-release 2>/dev/null | grep '^VERSION_ID=' | cut -d'=' -f2 | tr -d '\"'",
                "22.04",
            )
            .ok("uname -r", "5.15.0-91-generic")
            .ok(
                "grep -m 1 'model name' /proc/cpuinfo | cut -d':' -f2",
                " Intel(R) Xeon(R) CPU E5-2686 v4 @ 2.30GHz",
            )
            .ok("uname -m", "x86_64")
            .ok("hostname", "web-01")
    }

    fn darwin_host() -> ScriptedTransport {
        ScriptedTransport::new()
            .ok("uname -s", "Darwin")
            .ok("sw_vers -productName", "macOS")
            .ok("sw_vers -productVersion", "14.2.1")
            .ok("uname -r", "23.2.0")
            .ok("sysctl -n machdep.cpu.brand_string", "Apple M2 Pro")
            .ok("uname -m", "arm64")
            .ok("hostname", "dev-mbp.local")
    }

    fn windows_host() -> ScriptedTransport {
        ScriptedTransport::new()
            .fail("uname -s", "'uname' is not recognized as an internal or external command")
            .fail("test -d /etc && echo unix", "'test' is not recognized")
            .ok("ver", "Microsoft Windows [Version 10.0.22631.2861]")
            .ok(
                "systeminfo | findstr /B /C:\"OS Name\" /C:\"OS Version\"",
                "OS Name:                   Microsoft Windows 11 Pro\r\nOS Version:                10.0.22631 N/A Build 22631",
            )
            .ok("wmic cpu get name", "Name\r\nAMD Ryzen 7 5800X 8-Core Processor")
            .ok("echo %PROCESSOR_ARCHITECTURE%", "AMD64")
            .ok("hostname", "DESKTOP-7Q2")
    }

    fn host_for(key: PlatformKey) -> ScriptedTransport {
        match key {
            PlatformKey::Darwin => darwin_host(),
            PlatformKey::Linux => linux_host(),
            PlatformKey::Windows => windows_host(),
        }
    }

    #[tokio::test]
    async fn test_all_fields_present_with_evidence() {
        for key in PlatformKey::ALL {
            let transport = host_for(key);
            let (family, info) = SystemDetector::new(&transport, TIMEOUT).detect().await;
            assert_eq!(family.platform_key(), key);

            for (evidence_key, value) in info.facts() {
                assert!(!value.is_empty(), "{} empty on {}", evidence_key, key);
                if value != UNKNOWN {
                    assert!(
                        info.evidence.contains_key(evidence_key),
                        "{} has no evidence on {}",
                        evidence_key,
                        key
                    );
                }
            }
            assert!(info.evidence.contains_key(keys::OS_TYPE));
        }
    }

    #[tokio::test]
    async fn test_linux_os_name_is_first_token() {
        let transport = linux_host();
        let info = SystemDetector::new(&transport, TIMEOUT).detect_all().await;

        assert_eq!(info.os, "Ubuntu");
        assert_eq!(info.version, "22.04");
        assert_eq!(info.cpu, "Intel(R) Xeon(R) CPU E5-2686 v4 @ 2.30GHz");
        assert_eq!(info.evidence[keys::OS_NAME].raw_output, "Ubuntu 22.04 LTS");
    }

    #[tokio::test]
    async fn test_waterfall_stops_at_first_success() {
        let transport = ScriptedTransport::new()
            .ok("uname -s", "Linux")
            .ok("lsb_release -sr 2>/dev/null", "12")
            .ok("uname -r", "6.1.0-17-amd64");
        let info = SystemDetector::new(&transport, TIMEOUT).detect_all().await;

        assert_eq!(info.version, "12");
        assert_eq!(
            info.evidence[keys::OS_VERSION].command_run,
            "lsb_release -sr 2>/dev/null"
        );
        // uname -r only runs once, for the kernel fact, not as a version fallback.
        let issued = transport.issued();
        assert_eq!(issued.iter().filter(|c| c.as_str() == "uname -r").count(), 1);
        assert_eq!(info.kernel, "6.1.0-17-amd64");
    }

    #[tokio::test]
    async fn test_unanswered_facts_are_unknown() {
        let transport = ScriptedTransport::new().ok("uname -s", "Linux");
        let info = SystemDetector::new(&transport, TIMEOUT).detect_all().await;

        // The kernel name probe backs the last OS name candidate.
        assert_eq!(info.os, "Linux");
        assert_eq!(info.version, UNKNOWN);
        assert_eq!(info.cpu, UNKNOWN);
        assert!(!info.evidence.contains_key(keys::CPU));
    }

    #[tokio::test]
    async fn test_unrecognized_kernel_is_generic_unix() {
        let transport = ScriptedTransport::new()
            .ok("uname -s", "FreeBSD")
            .ok("uname -v", "FreeBSD 14.0-RELEASE")
            .ok("uname -p", "amd64");
        let (family, info) = SystemDetector::new(&transport, TIMEOUT).detect().await;

        assert_eq!(family, OsFamily::GenericUnix);
        assert_eq!(info.os, "FreeBSD");
        assert_eq!(info.version, "FreeBSD 14.0-RELEASE");
        assert_eq!(info.cpu, "amd64");
    }

    #[tokio::test]
    async fn test_failed_uname_falls_back_to_unix_marker() {
        let transport = ScriptedTransport::new().ok("test -d /etc && echo unix", "unix");
        let mut info = SystemInfo::default();
        let family = SystemDetector::new(&transport, TIMEOUT)
            .resolve_family(&mut info)
            .await;

        assert_eq!(family, OsFamily::GenericUnix);
        assert_eq!(info.evidence[keys::OS_TYPE].command_run, "test -d /etc && echo unix");
        assert!(!transport.issued().contains(&"ver".to_string()));
    }

    #[tokio::test]
    async fn test_windows_is_last_resort() {
        let transport = ScriptedTransport::new();
        let mut info = SystemInfo::default();
        let family = SystemDetector::new(&transport, TIMEOUT)
            .resolve_family(&mut info)
            .await;

        assert_eq!(family, OsFamily::Windows);
        assert_eq!(
            transport.issued(),
            vec!["uname -s", "test -d /etc && echo unix", "ver"]
        );
        assert!(!info.evidence[keys::OS_TYPE].success);
    }

    #[tokio::test]
    async fn test_windows_labeled_fields() {
        let transport = windows_host();
        let info = SystemDetector::new(&transport, TIMEOUT).detect_all().await;

        assert_eq!(info.os, "Microsoft Windows 11 Pro");
        assert_eq!(info.version, "10.0.22631 N/A Build 22631");
        assert_eq!(info.kernel, "Microsoft Windows [Version 10.0.22631.2861]");
        assert_eq!(info.cpu, "AMD Ryzen 7 5800X 8-Core Processor");
        assert_eq!(info.architecture, "AMD64");
    }

    #[tokio::test]
    async fn test_darwin_name_confirmed_by_kernel_probe() {
        let transport = ScriptedTransport::new()
            .ok("uname -s", "Darwin")
            .fail("sw_vers -productName", "");
        let info = SystemDetector::new(&transport, TIMEOUT).detect_all().await;

        assert_eq!(info.os, "macOS");
        assert_eq!(info.evidence[keys::OS_NAME].command_run, "uname -s");
    }

    #[tokio::test]
    async fn test_exhausted_budget_skips_facts() {
        let transport = linux_host();
        let info = SystemDetector::new(&transport, TIMEOUT)
            .with_budget(ScanBudget::new(Some(Duration::ZERO)))
            .detect_all()
            .await;

        assert_eq!(info.os, UNKNOWN);
        assert_eq!(transport.issued(), vec!["uname -s"]);
    }
}
