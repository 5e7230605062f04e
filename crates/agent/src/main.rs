//! Hostprint CLI - evidence-backed host fingerprinting.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hostprint_agent::report::{default_report_path, write_report};
use hostprint_agent::{ScanConfig, Scanner, SshTarget};
use hostprint_report_schema::{validate_report, validate_report_value, Report, ValidationResult};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hostprint")]
#[command(author, version, about = "Evidence-backed host fingerprinting agent")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Local,
    Remote,
}

#[derive(Subcommand)]
enum Commands {
    /// Fingerprint the local machine or a remote host
    Scan {
        /// Scan mode
        #[arg(long, value_enum, default_value = "local")]
        mode: Mode,

        /// Remote host (hostname or IP address)
        #[arg(long, required_if_eq("mode", "remote"))]
        host: Option<String>,

        /// SSH user
        #[arg(short, long)]
        username: Option<String>,

        /// SSH private key path
        #[arg(short, long)]
        key_file: Option<PathBuf>,

        /// SSH port
        #[arg(short, long, default_value = "22")]
        port: u16,

        /// Software target document (JSON or YAML)
        #[arg(long, default_value = hostprint_agent::config::DEFAULT_SOFTWARE_CONFIG)]
        config: PathBuf,

        /// Report file path (default: fingerprint_<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Per-command timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// SSH connect timeout in seconds
        #[arg(long, default_value = "10")]
        connect_timeout: u64,

        /// Wall-clock budget for the whole scan, in seconds
        #[arg(long)]
        budget: Option<u64>,

        /// Do not print the report to stdout
        #[arg(short, long)]
        quiet: bool,
    },

    /// Validate a report file
    Validate {
        /// Input report file path
        #[arg(long, short = 'i')]
        r#in: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let (text, json) = match cli.log_format {
        LogFormat::Text => (
            Some(fmt::layer().with_target(false).with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(std::io::stderr))),
    };

    tracing_subscriber::registry()
        .with(text)
        .with(json)
        .with(filter)
        .init();

    match cli.command {
        Commands::Scan {
            mode,
            host,
            username,
            key_file,
            port,
            config,
            output,
            timeout,
            connect_timeout,
            budget,
            quiet,
        } => {
            let scan_config = ScanConfig {
                software_config: config,
                command_timeout: timeout.map(Duration::from_secs),
                connect_timeout: Duration::from_secs(connect_timeout),
                scan_budget: budget.map(Duration::from_secs),
            };
            let scanner = Scanner::new(scan_config);

            let report = match mode {
                Mode::Local => scanner.run_local_scan().await,
                Mode::Remote => {
                    let host = host.context("--host is required for remote scans")?;
                    let target = SshTarget {
                        username,
                        port,
                        key_file,
                        ..SshTarget::new(host)
                    };
                    match scanner.run_remote_scan(target).await {
                        Ok(report) => report,
                        Err(e) => {
                            error!("Scan failed: {}", e);
                            std::process::exit(1);
                        }
                    }
                }
            };

            let out = output.unwrap_or_else(|| default_report_path(&report));
            write_report(&report, &out)?;
            info!("Report written to {:?}", out);

            if !quiet {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }

        Commands::Validate { r#in: input } => {
            info!("Validating report: {:?}", input);
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read report {}", input.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse report {}", input.display()))?;

            // Documents that do not deserialize still get the schema errors.
            let result = match serde_json::from_value::<Report>(value.clone()) {
                Ok(report) => validate_report(&report)?,
                Err(_) => validate_report_value(&value)?,
            };
            print_validation(&result);

            if !result.valid {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_validation(result: &ValidationResult) {
    if result.valid {
        println!("Report is valid");
    } else {
        println!("Report validation failed:");
        for error in &result.errors {
            println!("  - {}", error);
        }
    }

    if !result.warnings.is_empty() {
        println!("Warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }
}
