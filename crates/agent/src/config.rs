//! Daemon settings and policy-file loading.
//!
//! Runtime settings come from environment variables (see the table in
//! `main.rs`); the monitoring policy itself is a JSON file declaring the
//! devices to watch. Anything wrong here is fatal at startup: the daemon
//! never evaluates a device against a policy it could not fully load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use diskwatch_core::policy::DeviceRecord;

/// Default seconds between evaluation cycles.
const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default per-device evaluation timeout in seconds. Covers the slowest
/// legitimate path: a sleeping disk woken for hddtemp plus a smartctl run.
const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 120;

/// Errors loading settings or the policy file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{name} environment variable is required")]
    MissingVar { name: &'static str },

    #[error("{name} must be a positive integer, got \"{value}\"")]
    InvalidVar { name: &'static str, value: String },

    #[error("Cannot read policy file {path}: {source}")]
    PolicyIo {
        path: String,
        source: std::io::Error,
    },

    #[error("Cannot parse policy file {path}: {source}")]
    PolicyFormat {
        path: String,
        source: serde_json::Error,
    },
}

/// Daemon runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub policy_path: PathBuf,
    /// Time between evaluation cycles.
    pub interval: Duration,
    /// Overall timeout applied to each device's evaluation.
    pub device_timeout: Duration,
}

impl Settings {
    /// Read settings from the environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        let policy_path = std::env::var("DISKWATCH_POLICY")
            .map_err(|_| SettingsError::MissingVar {
                name: "DISKWATCH_POLICY",
            })?
            .into();

        Ok(Self {
            policy_path,
            interval: Duration::from_secs(seconds_var(
                "DISKWATCH_INTERVAL_SECS",
                DEFAULT_INTERVAL_SECS,
            )?),
            device_timeout: Duration::from_secs(seconds_var(
                "DISKWATCH_DEVICE_TIMEOUT_SECS",
                DEFAULT_DEVICE_TIMEOUT_SECS,
            )?),
        })
    }
}

/// Read an optional positive-seconds variable with a default.
fn seconds_var(name: &'static str, default: u64) -> Result<u64, SettingsError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(SettingsError::InvalidVar { name, value }),
        },
    }
}

/// Top-level shape of the policy file.
#[derive(Debug, Deserialize)]
struct PolicyFile {
    devices: Vec<DeviceRecord>,
}

/// Load and deserialize the policy file into device records.
///
/// Field-level validation happens later in `DeviceRegistry::build`; this
/// layer only enforces JSON well-formedness and the record shape.
pub fn load_policy(path: &Path) -> Result<Vec<DeviceRecord>, SettingsError> {
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::PolicyIo {
        path: path.display().to_string(),
        source,
    })?;
    let file: PolicyFile =
        serde_json::from_str(&text).map_err(|source| SettingsError::PolicyFormat {
            path: path.display().to_string(),
            source,
        })?;
    Ok(file.devices)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
