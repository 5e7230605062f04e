//! Hostprint agent - evidence-backed host fingerprinting.
//!
//! Probes a machine through a [`transport::Transport`], records every command
//! as evidence, and assembles a [`hostprint_report_schema::Report`].

pub mod budget;
pub mod config;
pub mod platform;
pub mod recorder;
pub mod report;
pub mod scan;
pub mod software;
pub mod system;
pub mod transport;

pub use config::{ScanConfig, SoftwareConfig};
pub use scan::{FixedIdentity, ScanIdentity, Scanner, SystemIdentity};
pub use transport::{LocalTransport, SshTarget, SshTransport, Transport};
