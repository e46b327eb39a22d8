//! The resolved device entity and its health evaluation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::condition::ConditionExpression;
use crate::probe::{ArrayStatusProbe, DeviceProbe};
use crate::types::AttributeId;
use crate::verdict::{HealthReason, HealthVerdict};

/// A device under watch: identity resolved at startup plus the compiled
/// policy for it. Holds no mutable runtime state; probe results live only
/// for the duration of one [`evaluate_health`](Device::evaluate_health) call.
#[derive(Debug, Clone)]
pub struct Device {
    name: String,
    code: String,
    path: PathBuf,
    kind_tag: String,
    raid_member: bool,
    max_temp: Option<i64>,
    rules: BTreeMap<AttributeId, ConditionExpression>,
}

impl Device {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        code: String,
        path: PathBuf,
        kind_tag: String,
        raid_member: bool,
        max_temp: Option<i64>,
        rules: BTreeMap<AttributeId, ConditionExpression>,
    ) -> Self {
        Self {
            name,
            code,
            path,
            kind_tag,
            raid_member,
            max_temp,
            rules,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// The resolved device path evaluations probe.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Probe kind tag from the policy ("ata", "nvme", "mdadm", ...).
    pub fn kind_tag(&self) -> &str {
        &self.kind_tag
    }

    pub fn is_raid_member(&self) -> bool {
        self.raid_member
    }

    pub fn max_temp(&self) -> Option<i64> {
        self.max_temp
    }

    /// Run the full health check sequence for this device.
    ///
    /// Accumulates every concurrent problem rather than stopping at the
    /// first, with one exception: an unreachable device short-circuits
    /// immediately, since no probe can say anything meaningful about a
    /// device that is not there. Never panics and never returns an error;
    /// all failures become reasons in the verdict.
    pub async fn evaluate_health(
        &self,
        probe: &impl DeviceProbe,
        arrays: &impl ArrayStatusProbe,
    ) -> HealthVerdict {
        let mut reasons = Vec::new();

        // 1. Liveness. Everything after this needs a present device.
        if !probe.reachable(&self.path).await {
            tracing::debug!(device = %self.name, path = %self.path.display(), "Device unreachable");
            return HealthVerdict::new(&self.name, &self.code, vec![HealthReason::Unreachable]);
        }

        // 2. Array state, for RAID members only. An unhealthy array does not
        // stop the member's own checks.
        if self.raid_member {
            match arrays.array_state(&self.path).await {
                Some(state) if state.healthy => {
                    tracing::debug!(device = %self.name, state = %state.state, "Array healthy");
                }
                Some(state) => {
                    reasons.push(HealthReason::ArrayDegraded {
                        array: self.path.display().to_string(),
                        state: state.state,
                    });
                }
                None => {
                    reasons.push(HealthReason::ArrayStateUnknown {
                        array: self.path.display().to_string(),
                    });
                }
            }
        }

        // 3. Temperature, when the policy sets a limit and a source reports one.
        if let Some(limit) = self.max_temp {
            match probe.temperature(&self.path, &self.kind_tag).await {
                Some(celsius) if celsius > limit => {
                    reasons.push(HealthReason::Overheated { celsius, limit });
                }
                Some(celsius) => {
                    tracing::debug!(device = %self.name, celsius, limit, "Temperature within limit");
                }
                None => {
                    tracing::debug!(device = %self.name, "No temperature source available");
                }
            }
        }

        // 4. SMART attribute checks.
        if !self.rules.is_empty() {
            match probe.attributes(&self.path, &self.kind_tag).await {
                Some(table) => {
                    for (attribute, rule) in &self.rules {
                        match table.get(attribute) {
                            None => {
                                // Policy/device inconsistency, reported
                                // distinctly from a failed check.
                                reasons.push(HealthReason::AttributeNotReported {
                                    attribute: *attribute,
                                });
                            }
                            Some(value) if rule.is_problem(*value) => {
                                reasons.push(HealthReason::AttributeProblem {
                                    attribute: *attribute,
                                    value: *value,
                                });
                            }
                            Some(_) => {}
                        }
                    }
                }
                None => {
                    reasons.push(HealthReason::SmartUnavailable);
                }
            }
        }

        HealthVerdict::new(&self.name, &self.code, reasons)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
