//! Probe commands per operating system family.
//!
//! Each family lists, per fact, its candidate commands from most to least
//! authoritative. This is the single source of truth for what the system
//! detector runs.

use hostprint_common::OsFamily;
use hostprint_report_schema::keys;

/// A system fact derived by probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fact {
    OsName,
    OsVersion,
    Kernel,
    Cpu,
    Architecture,
    Hostname,
}

impl Fact {
    pub const ALL: [Fact; 6] = [
        Fact::OsName,
        Fact::OsVersion,
        Fact::Kernel,
        Fact::Cpu,
        Fact::Architecture,
        Fact::Hostname,
    ];

    /// Evidence key for this fact.
    pub fn key(&self) -> &'static str {
        match self {
            Fact::OsName => keys::OS_NAME,
            Fact::OsVersion => keys::OS_VERSION,
            Fact::Kernel => keys::KERNEL,
            Fact::Cpu => keys::CPU,
            Fact::Architecture => keys::ARCHITECTURE,
            Fact::Hostname => keys::HOSTNAME,
        }
    }
}

/// How a value is pulled out of probe output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// The whole output, trimmed.
    Trimmed,
    /// First whitespace-delimited token.
    FirstToken,
    /// Second non-empty line (table output with a header row).
    SecondLine,
    /// Value of a `Label: value` line.
    Labeled(&'static str),
    /// A successful probe confirms a constant.
    Fixed(&'static str),
}

impl Extract {
    /// Apply to raw output. Empty results count as no value.
    pub fn apply(&self, output: &str) -> Option<String> {
        let value = match self {
            Extract::Trimmed => output.trim().to_string(),
            Extract::FirstToken => output.split_whitespace().next()?.to_string(),
            Extract::SecondLine => output
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .nth(1)?
                .to_string(),
            Extract::Labeled(label) => labeled_value(output, label)?,
            Extract::Fixed(value) => value.to_string(),
        };
        (!value.is_empty()).then_some(value)
    }
}

/// Scan `Label:   value` lines, as printed by `systeminfo`.
fn labeled_value(output: &str, label: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        (name.trim() == label).then(|| value.trim().to_string())
    })
}

/// One candidate probe for a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub command: &'static str,
    pub extract: Extract,
}

const fn candidate(command: &'static str, extract: Extract) -> Candidate {
    Candidate { command, extract }
}

/// Kernel name probe used to resolve the family.
pub const KERNEL_NAME_PROBE: &str = "uname -s";

/// Succeeds on any Unix-like shell, fails under cmd.exe and PowerShell.
pub const UNIX_MARKER_PROBE: &str = "test -d /etc && echo unix";

/// Last-resort Windows probe.
pub const WINDOWS_PROBE: &str = "ver";

const OS_RELEASE_NAME: &str =
    "cat /etc/os-release 2>/dev/null | grep '^NAME=' | cut -d'=' -f2 | tr -d '\"'";
const OS_RELEASE_VERSION: &str =
    "cat /etc/os-release 2>/dev/null | grep '^VERSION_ID=' | cut -d'=' -f2 | tr -d '\"'";
const SYSTEMINFO: &str = "systeminfo | findstr /B /C:\"OS Name\" /C:\"OS Version\"";

/// Trait for per-family probe sets.
pub trait PlatformProbes: Send + Sync {
    fn family(&self) -> OsFamily;

    /// Candidates for a fact, most authoritative first.
    fn candidates(&self, fact: Fact) -> Vec<Candidate>;
}

/// Kernel, architecture and hostname probes shared by Unix families.
fn unix_common(fact: Fact) -> Vec<Candidate> {
    match fact {
        Fact::Kernel => vec![candidate("uname -r", Extract::Trimmed)],
        Fact::Architecture => vec![candidate("uname -m", Extract::Trimmed)],
        Fact::Hostname => vec![
            candidate("hostname", Extract::Trimmed),
            candidate("uname -n", Extract::Trimmed),
        ],
        _ => Vec::new(),
    }
}

/// macOS probes.
pub struct DarwinProbes;

impl PlatformProbes for DarwinProbes {
    fn family(&self) -> OsFamily {
        OsFamily::Darwin
    }

    fn candidates(&self, fact: Fact) -> Vec<Candidate> {
        match fact {
            Fact::OsName => vec![
                candidate("sw_vers -productName", Extract::Trimmed),
                candidate(KERNEL_NAME_PROBE, Extract::Fixed("macOS")),
            ],
            Fact::OsVersion => vec![candidate("sw_vers -productVersion", Extract::Trimmed)],
            Fact::Cpu => vec![
                candidate("sysctl -n machdep.cpu.brand_string", Extract::Trimmed),
                candidate("sysctl -n hw.model", Extract::Trimmed),
            ],
            other => unix_common(other),
        }
    }
}

/// Linux probes. The distribution name is resolved apart from its version.
pub struct LinuxProbes;

impl PlatformProbes for LinuxProbes {
    fn family(&self) -> OsFamily {
        OsFamily::Linux
    }

    fn candidates(&self, fact: Fact) -> Vec<Candidate> {
        match fact {
            Fact::OsName => vec![
                candidate(OS_RELEASE_NAME, Extract::FirstToken),
                candidate("lsb_release -si 2>/dev/null", Extract::FirstToken),
                candidate("head -n 1 /etc/issue 2>/dev/null", Extract::FirstToken),
                candidate(KERNEL_NAME_PROBE, Extract::FirstToken),
            ],
            Fact::OsVersion => vec![
                candidate(OS_RELEASE_VERSION, Extract::Trimmed),
                candidate("lsb_release -sr 2>/dev/null", Extract::Trimmed),
                candidate("uname -r", Extract::Trimmed),
            ],
            Fact::Cpu => vec![
                candidate(
                    "grep -m 1 'model name' /proc/cpuinfo | cut -d':' -f2",
                    Extract::Trimmed,
                ),
                candidate("lscpu | grep 'Model name' | cut -d':' -f2", Extract::Trimmed),
                candidate("uname -p", Extract::Trimmed),
            ],
            other => unix_common(other),
        }
    }
}

/// Windows probes (cmd.exe syntax).
pub struct WindowsProbes;

impl PlatformProbes for WindowsProbes {
    fn family(&self) -> OsFamily {
        OsFamily::Windows
    }

    fn candidates(&self, fact: Fact) -> Vec<Candidate> {
        match fact {
            Fact::OsName => vec![
                candidate(SYSTEMINFO, Extract::Labeled("OS Name")),
                candidate(WINDOWS_PROBE, Extract::Fixed("Windows")),
            ],
            Fact::OsVersion => vec![
                candidate(SYSTEMINFO, Extract::Labeled("OS Version")),
                candidate(WINDOWS_PROBE, Extract::Trimmed),
            ],
            Fact::Kernel => vec![candidate(WINDOWS_PROBE, Extract::Trimmed)],
            Fact::Cpu => vec![
                candidate("wmic cpu get name", Extract::SecondLine),
                candidate("echo %PROCESSOR_IDENTIFIER%", Extract::Trimmed),
            ],
            Fact::Architecture => vec![candidate("echo %PROCESSOR_ARCHITECTURE%", Extract::Trimmed)],
            Fact::Hostname => vec![candidate("hostname", Extract::Trimmed)],
        }
    }
}

/// Probes for Unix systems that are neither macOS nor Linux.
pub struct GenericUnixProbes;

impl PlatformProbes for GenericUnixProbes {
    fn family(&self) -> OsFamily {
        OsFamily::GenericUnix
    }

    fn candidates(&self, fact: Fact) -> Vec<Candidate> {
        match fact {
            Fact::OsName => vec![candidate(KERNEL_NAME_PROBE, Extract::Trimmed)],
            Fact::OsVersion => vec![
                candidate("uname -v", Extract::Trimmed),
                candidate("uname -r", Extract::Trimmed),
            ],
            Fact::Cpu => vec![
                candidate("uname -p", Extract::Trimmed),
                candidate("sysctl -n hw.model", Extract::Trimmed),
            ],
            other => unix_common(other),
        }
    }
}

/// Strategy lookup for a resolved family.
pub fn probes_for(family: OsFamily) -> Box<dyn PlatformProbes> {
    match family {
        OsFamily::Darwin => Box::new(DarwinProbes),
        OsFamily::Linux => Box::new(LinuxProbes),
        OsFamily::Windows => Box::new(WindowsProbes),
        OsFamily::GenericUnix => Box::new(GenericUnixProbes),
    }
}
