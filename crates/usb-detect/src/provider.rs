//! Information providers
//!
//! An information provider runs a line-oriented query (such as `lsusb` or
//! `lsblk`) and hands back its standard output. The describer depends only on
//! the [`InfoProvider`] trait, so tests and alternative sources (a sysfs
//! reader, a static table) can stand in for external tools.

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::runtime::Runtime;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::DetectError;

/// A synchronous line-oriented lookup
///
/// Implementations return the query's standard output, or an empty string
/// if nothing is known or the query failed. They must not panic.
pub trait InfoProvider: Send + Sync {
    /// Run a command line and return its standard output
    fn run(&self, command_line: &str) -> String;
}

impl<F> InfoProvider for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn run(&self, command_line: &str) -> String {
        self(command_line)
    }
}

/// Configuration for external lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Upper bound on a single lookup, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Command that lists USB devices; `-d vendor:product` is appended
    #[serde(default = "default_usb_list_command")]
    pub usb_list_command: String,
    /// Command that lists block devices, one per line
    #[serde(default = "default_block_list_command")]
    pub block_list_command: String,
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_usb_list_command() -> String {
    "lsusb".to_string()
}

fn default_block_list_command() -> String {
    "lsblk -o NAME,MODEL,SIZE,FSTYPE,TRAN -l".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            usb_list_command: default_usb_list_command(),
            block_list_command: default_block_list_command(),
        }
    }
}

impl ProviderConfig {
    /// Lookup timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Provider that executes external programs
///
/// The command line is split on whitespace and executed directly, without a
/// shell. Standard error is discarded. Each call is bounded by a timeout;
/// a command that overruns it is killed.
pub struct CommandProvider {
    runtime: Runtime,
    timeout: Duration,
}

impl CommandProvider {
    /// Create a provider with the given per-call timeout
    pub fn new(timeout: Duration) -> Result<Self, DetectError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(DetectError::Runtime)?;

        Ok(Self { runtime, timeout })
    }

    /// Create a provider from configuration
    pub fn with_config(config: &ProviderConfig) -> Result<Self, DetectError> {
        Self::new(config.timeout())
    }

    /// Run a command line, reporting failures
    pub fn try_run(&self, command_line: &str) -> Result<String, DetectError> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or(DetectError::EmptyCommand)?;
        let args: Vec<&str> = parts.collect();

        trace!("Running lookup: {} {:?}", program, args);

        self.runtime.block_on(async {
            let output = Command::new(program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .output();

            match timeout(self.timeout, output).await {
                Ok(Ok(output)) => {
                    if !output.status.success() {
                        debug!("{} exited with {}", program, output.status);
                    }
                    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
                }
                Ok(Err(e)) => Err(DetectError::SpawnFailed {
                    program: program.to_string(),
                    reason: e.to_string(),
                }),
                Err(_) => Err(DetectError::Timeout {
                    program: program.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }),
            }
        })
    }
}

impl InfoProvider for CommandProvider {
    fn run(&self, command_line: &str) -> String {
        match self.try_run(command_line) {
            Ok(output) => output,
            Err(e) => {
                warn!("Device lookup failed: {}", e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_provider() {
        let provider = |cmd: &str| format!("ran {cmd}");
        assert_eq!(provider.run("lsusb"), "ran lsusb");
    }

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.usb_list_command, "lsusb");
        assert!(config.block_list_command.starts_with("lsblk"));
    }

    #[test]
    fn test_command_provider_captures_stdout() {
        let provider = CommandProvider::new(Duration::from_secs(5)).unwrap();
        assert_eq!(provider.run("echo ID 046d:c52b Receiver"), "ID 046d:c52b Receiver\n");
    }

    #[test]
    fn test_command_provider_empty_command() {
        let provider = CommandProvider::new(Duration::from_secs(1)).unwrap();
        assert!(matches!(provider.try_run("   "), Err(DetectError::EmptyCommand)));
        assert_eq!(provider.run(""), "");
    }

    #[test]
    fn test_command_provider_missing_program() {
        let provider = CommandProvider::new(Duration::from_secs(1)).unwrap();
        assert!(matches!(
            provider.try_run("definitely-not-a-real-lookup-tool --list"),
            Err(DetectError::SpawnFailed { .. })
        ));
        assert_eq!(provider.run("definitely-not-a-real-lookup-tool"), "");
    }

    #[test]
    fn test_command_provider_timeout() {
        let provider = CommandProvider::new(Duration::from_millis(100)).unwrap();
        assert!(matches!(
            provider.try_run("sleep 5"),
            Err(DetectError::Timeout { timeout_ms: 100, .. })
        ));
    }
}
