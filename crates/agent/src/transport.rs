//! Command transports: the local shell and the system `ssh` client.
//!
//! A transport never fails: process errors, timeouts and a missing ssh
//! binary all come back as an unsuccessful [`CommandOutput`].

use async_trait::async_trait;
use hostprint_report_schema::ScanType;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Default per-command timeout for local probes.
pub const LOCAL_TIMEOUT: Duration = Duration::from_secs(15);

/// Default per-command timeout for remote probes.
pub const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default ssh `ConnectTimeout`.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Standard SSH port; `-p` is only emitted for other ports.
pub const DEFAULT_SSH_PORT: u16 = 22;

const SENTINEL_COMMAND: &str = "echo \"SSH_TEST_OK\"";
const SENTINEL_MARKER: &str = "SSH_TEST_OK";

/// Result of running one command through a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Trimmed stdout, or trimmed stderr when stdout is empty.
    pub output: String,
    /// The command exactly as issued.
    pub issued_command: String,
    /// The probe before wrapping, when the transport wrapped it.
    pub remote_command: Option<String>,
}

impl CommandOutput {
    pub fn failed(issued_command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            issued_command: issued_command.into(),
            remote_command: None,
        }
    }
}

/// Trait for command execution.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a command, waiting at most `timeout`.
    async fn execute(&self, command: &str, timeout: Duration) -> CommandOutput;

    /// Verify the target is reachable.
    async fn connect(&self) -> bool {
        true
    }

    fn scan_type(&self) -> ScanType;

    fn default_timeout(&self) -> Duration;
}

/// Runs commands through the host shell.
pub struct LocalTransport {
    timeout: Duration,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self {
            timeout: LOCAL_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn shell_command(command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn execute(&self, command: &str, timeout: Duration) -> CommandOutput {
        debug!("Local exec: {}", command);

        let run = Self::shell_command(command).output();
        match tokio::time::timeout(timeout, run).await {
            Ok(Ok(output)) => CommandOutput {
                success: output.status.success(),
                output: combined_output(&output, false),
                issued_command: command.to_string(),
                remote_command: None,
            },
            Ok(Err(e)) => CommandOutput::failed(command, format!("Error executing command: {}", e)),
            Err(_) => CommandOutput::failed(
                command,
                format!("Command timed out after {} seconds", seconds(timeout)),
            ),
        }
    }

    fn scan_type(&self) -> ScanType {
        ScanType::Local
    }

    fn default_timeout(&self) -> Duration {
        self.timeout
    }
}

/// Where and as whom to connect over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub username: Option<String>,
    pub port: u16,
    pub key_file: Option<PathBuf>,
}

impl SshTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: None,
            port: DEFAULT_SSH_PORT,
            key_file: None,
        }
    }

    /// `user@host`, or just the host when no username is set.
    pub fn destination(&self) -> String {
        match &self.username {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

/// Runs commands through the system `ssh` client in batch mode.
pub struct SshTransport {
    target: SshTarget,
    timeout: Duration,
    connect_timeout: Duration,
    connected: AtomicBool,
    program: PathBuf,
}

impl SshTransport {
    pub fn new(target: SshTarget) -> Self {
        Self {
            target,
            timeout: REMOTE_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
            connected: AtomicBool::new(false),
            program: PathBuf::from("ssh"),
        }
    }

    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }

    /// Use another ssh client binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Full argument vector, program name first.
    pub fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args: Vec<String> = vec![
            self.program.display().to_string(),
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            "StrictHostKeyChecking=no".into(),
            "-o".into(),
            "UserKnownHostsFile=/dev/null".into(),
            "-o".into(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
        ];

        if self.target.port != DEFAULT_SSH_PORT {
            args.push("-p".into());
            args.push(self.target.port.to_string());
        }

        if let Some(key) = &self.target.key_file {
            args.push("-i".into());
            args.push(key.display().to_string());
        }

        args.push(self.target.destination());
        args.push(command.to_string());
        args
    }

    async fn run_ssh(&self, command: &str, timeout: Duration) -> CommandOutput {
        let args = self.ssh_args(command);
        let issued = args.join(" ");
        debug!("SSH exec: {}", issued);

        let run = Command::new(&args[0])
            .args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let mut result = match tokio::time::timeout(timeout, run).await {
            Ok(Ok(output)) => CommandOutput {
                success: output.status.success(),
                output: combined_output(&output, true),
                issued_command: issued,
                remote_command: None,
            },
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                CommandOutput::failed(issued, "SSH client not found. Install OpenSSH.")
            }
            Ok(Err(e)) => CommandOutput::failed(issued, format!("SSH error: {}", e)),
            Err(_) => CommandOutput::failed(
                issued,
                format!("SSH command timed out after {} seconds", seconds(timeout)),
            ),
        };
        result.remote_command = Some(command.to_string());
        result
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn execute(&self, command: &str, timeout: Duration) -> CommandOutput {
        if !self.is_connected() {
            warn!("Not connected to remote host");
            if !self.connect().await {
                return CommandOutput::failed("", "Cannot connect to remote host");
            }
        }
        self.run_ssh(command, timeout).await
    }

    async fn connect(&self) -> bool {
        info!(
            "Testing SSH connection to {}:{}...",
            self.target.destination(),
            self.target.port
        );

        let result = self.run_ssh(SENTINEL_COMMAND, self.timeout).await;
        let ok = result.success && result.output.contains(SENTINEL_MARKER);
        self.connected.store(ok, Ordering::SeqCst);

        if ok {
            info!("Successfully connected to {}", self.target.host);
        } else {
            error!("SSH connection test failed: {}", result.output);
        }
        ok
    }

    fn scan_type(&self) -> ScanType {
        ScanType::Remote
    }

    fn default_timeout(&self) -> Duration {
        self.timeout
    }
}

/// Whole seconds when exact, otherwise up to millisecond precision.
fn seconds(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        timeout.as_secs().to_string()
    } else {
        let text = format!("{:.3}", timeout.as_secs_f64());
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Trimmed stdout, falling back to trimmed stderr.
///
/// For ssh, stderr lines starting with `Warning:` (known-hosts chatter) are dropped.
fn combined_output(output: &Output, filter_ssh_warnings: bool) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stdout.is_empty() {
        return stdout;
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if filter_ssh_warnings {
        stderr
            .lines()
            .filter(|line| !line.starts_with("Warning:"))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        stderr.to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for deterministic tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers commands from a fixed script; anything unscripted fails.
    pub struct ScriptedTransport {
        responses: HashMap<String, (bool, String)>,
        issued: Mutex<Vec<String>>,
        scan_type: ScanType,
        reachable: bool,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self {
                responses: HashMap::new(),
                issued: Mutex::new(Vec::new()),
                scan_type: ScanType::Local,
                reachable: true,
            }
        }

        pub fn remote() -> Self {
            Self {
                scan_type: ScanType::Remote,
                ..Self::new()
            }
        }

        pub fn unreachable(mut self) -> Self {
            self.reachable = false;
            self
        }

        pub fn ok(mut self, command: &str, output: &str) -> Self {
            self.responses
                .insert(command.to_string(), (true, output.to_string()));
            self
        }

        pub fn fail(mut self, command: &str, output: &str) -> Self {
            self.responses
                .insert(command.to_string(), (false, output.to_string()));
            self
        }

        /// Commands in the order they were issued.
        pub fn issued(&self) -> Vec<String> {
            self.issued.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, command: &str, _timeout: Duration) -> CommandOutput {
            self.issued.lock().unwrap().push(command.to_string());
            let (success, output) = self
                .responses
                .get(command)
                .cloned()
                .unwrap_or((false, format!("sh: {}: command not found", command)));

            let (issued_command, remote_command) = match self.scan_type {
                ScanType::Local => (command.to_string(), None),
                ScanType::Remote => (
                    format!("ssh -o BatchMode=yes scripted-host {}", command),
                    Some(command.to_string()),
                ),
            };

            CommandOutput {
                success,
                output: output.trim().to_string(),
                issued_command,
                remote_command,
            }
        }

        async fn connect(&self) -> bool {
            self.reachable
        }

        fn scan_type(&self) -> ScanType {
            self.scan_type
        }

        fn default_timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }
}
