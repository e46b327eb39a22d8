//! Probe contracts between the evaluation engine and the host's tools.
//!
//! The engine never shells out itself; it asks these traits. Soft failures
//! ("no temperature known this cycle") are `None`, never errors; callers
//! cannot accidentally treat missing data as something to catch. The agent
//! crate provides the concrete smartctl / hddtemp / mdadm bindings.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;

use serde::Serialize;

use crate::types::AttributeId;

/// A full SMART attribute snapshot: attribute number to raw value.
pub type AttributeTable = BTreeMap<AttributeId, i64>;

/// Per-device probes used by every health evaluation.
pub trait DeviceProbe: Send + Sync {
    /// Whether the device node exists and supports a small bounded read.
    fn reachable(&self, path: &Path) -> impl Future<Output = bool> + Send;

    /// Current temperature in °C, or `None` when no source can report one.
    ///
    /// Implementations document their own fallback order; the reference
    /// binding tries a direct temperature reader first (waking a sleeping
    /// disk once), then a protocol-specific SMART extraction keyed by
    /// `kind_tag`.
    fn temperature(&self, path: &Path, kind_tag: &str) -> impl Future<Output = Option<i64>> + Send;

    /// The device's SMART attribute snapshot, or `None` when it cannot be
    /// read this cycle.
    fn attributes(
        &self,
        path: &Path,
        kind_tag: &str,
    ) -> impl Future<Output = Option<AttributeTable>> + Send;
}

/// Reported state of a software-RAID array.
#[derive(Debug, Clone, Serialize)]
pub struct ArrayState {
    /// The state text as reported by the array tool, e.g. "clean" or
    /// "active, degraded".
    pub state: String,
    /// Derived from the state vocabulary: state word lists containing
    /// "clean" or "active" are healthy, everything else is not.
    pub healthy: bool,
}

impl ArrayState {
    /// Classify a raw state string from the array tool. Matching is on
    /// whole words, so "inactive" does not read as "active".
    pub fn from_state_text(state: &str) -> Self {
        let lower = state.to_ascii_lowercase();
        let healthy = lower
            .split(|c: char| c == ',' || c.is_whitespace())
            .any(|word| word == "clean" || word == "active");
        Self {
            state: state.to_string(),
            healthy,
        }
    }
}

/// Array-level probes, consulted only for RAID members.
pub trait ArrayStatusProbe: Send + Sync {
    /// The array's reported state, or `None` when the report is missing or
    /// unparseable (which the caller treats as unhealthy with the raw text
    /// unavailable).
    fn array_state(&self, path: &Path) -> impl Future<Output = Option<ArrayState>> + Send;

    /// Best-effort human-readable dump for operator troubleshooting. Tool
    /// failures are embedded as text rather than propagated.
    fn diagnostic_report(&self, path: &Path) -> impl Future<Output = String> + Send;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
