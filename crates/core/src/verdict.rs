//! Health verdicts, the output of a single device evaluation.

use std::fmt;

use serde::Serialize;

use crate::types::{AttributeId, Timestamp};

/// One accumulated failure reason. Variants are machine-distinguishable so
/// the reporting layer can tell "device is unhealthy" apart from "policy
/// references an attribute the device does not report".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HealthReason {
    /// The device node is missing or refuses a bounded read. Short-circuits
    /// all other checks.
    Unreachable,

    /// The RAID array containing this member reported an unhealthy state.
    ArrayDegraded { array: String, state: String },

    /// The RAID array's state could not be determined at all.
    ArrayStateUnknown { array: String },

    /// Measured temperature exceeds the policy limit.
    Overheated { celsius: i64, limit: i64 },

    /// SMART data could not be read this cycle; attribute checks skipped.
    SmartUnavailable,

    /// The policy declares a check for an attribute the live SMART table
    /// does not contain. A policy/device inconsistency, not a failed check.
    AttributeNotReported { attribute: AttributeId },

    /// An attribute's `problem_if` condition held for the observed value.
    AttributeProblem { attribute: AttributeId, value: i64 },

    /// The evaluation did not finish within the per-device timeout.
    TimedOut { seconds: u64 },
}

impl fmt::Display for HealthReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "device unreachable"),
            Self::ArrayDegraded { array, state } => {
                write!(f, "problem with RAID {array}: state \"{state}\"")
            }
            Self::ArrayStateUnknown { array } => {
                write!(f, "cannot understand state of RAID {array}")
            }
            Self::Overheated { celsius, limit } => {
                write!(f, "temperature {celsius} °C exceeds limit {limit} °C")
            }
            Self::SmartUnavailable => write!(f, "cannot read S.M.A.R.T. data"),
            Self::AttributeNotReported { attribute } => write!(
                f,
                "policy checks attribute {attribute}, but the device does not report it"
            ),
            Self::AttributeProblem { attribute, value } => {
                write!(f, "S.M.A.R.T. attribute {attribute} check failed, value is {value}")
            }
            Self::TimedOut { seconds } => {
                write!(f, "evaluation timed out after {seconds}s")
            }
        }
    }
}

/// Pass/fail result of one evaluation cycle for one device. Produced fresh
/// every cycle; never persisted by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct HealthVerdict {
    /// Device name from the policy record.
    pub device: String,
    /// Device code from the policy record.
    pub code: String,
    /// `true` iff `reasons` is empty.
    pub passed: bool,
    /// Every problem found this cycle, in check order.
    pub reasons: Vec<HealthReason>,
    pub checked_at: Timestamp,
}

impl HealthVerdict {
    /// Build a verdict from accumulated reasons; `passed` is derived.
    pub fn new(device: &str, code: &str, reasons: Vec<HealthReason>) -> Self {
        Self {
            device: device.to_string(),
            code: code.to_string(),
            passed: reasons.is_empty(),
            reasons,
            checked_at: chrono::Utc::now(),
        }
    }

    /// All reasons joined into one operator-facing line.
    pub fn summary(&self) -> String {
        if self.passed {
            "ok".to_string()
        } else {
            self.reasons
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passed_is_derived_from_reasons() {
        assert!(HealthVerdict::new("d", "c", vec![]).passed);
        assert!(!HealthVerdict::new("d", "c", vec![HealthReason::Unreachable]).passed);
    }

    #[test]
    fn overheated_reason_names_both_values() {
        let text = HealthReason::Overheated {
            celsius: 45,
            limit: 40,
        }
        .to_string();
        assert!(text.contains("45"));
        assert!(text.contains("40"));
    }

    #[test]
    fn attribute_problem_names_attribute_and_value() {
        let text = HealthReason::AttributeProblem {
            attribute: 5,
            value: 100,
        }
        .to_string();
        assert!(text.contains('5'));
        assert!(text.contains("100"));
    }

    #[test]
    fn missing_attribute_is_distinct_from_failed_check() {
        let missing = HealthReason::AttributeNotReported { attribute: 9 };
        let failed = HealthReason::AttributeProblem {
            attribute: 9,
            value: 1,
        };
        assert_ne!(missing, failed);
        assert!(missing.to_string().contains("does not report"));
    }

    #[test]
    fn summary_joins_reasons_in_order() {
        let verdict = HealthVerdict::new(
            "d",
            "c",
            vec![
                HealthReason::Overheated {
                    celsius: 50,
                    limit: 40,
                },
                HealthReason::SmartUnavailable,
            ],
        );
        let summary = verdict.summary();
        let temp_pos = summary.find("temperature").unwrap();
        let smart_pos = summary.find("S.M.A.R.T.").unwrap();
        assert!(temp_pos < smart_pos);
    }

    #[test]
    fn verdict_serializes_with_tagged_reasons() {
        let verdict = HealthVerdict::new("d", "c", vec![HealthReason::Unreachable]);
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["passed"], false);
        assert_eq!(json["reasons"][0]["reason"], "unreachable");
    }
}
