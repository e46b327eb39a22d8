//! Operator-declared monitoring policy records.
//!
//! A policy is an ordered list of [`DeviceRecord`]s, one per physical device
//! under watch. Records arrive from an operator-authored configuration file;
//! every field is validated here with an error that names the offending field
//! and device, and validation failure is fatal at startup.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::AttributeId;

/// How a device reference in the policy should be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ReferenceKind {
    /// A raw device node, e.g. `/dev/sda`.
    #[serde(rename = "dev")]
    Dev,
    /// A persistent udev symlink, e.g. `/dev/disk/by-id/ata-Samsung_...`.
    #[serde(rename = "by-id")]
    ById,
    /// A filesystem UUID looked up in the block-device catalog.
    #[serde(rename = "uuid")]
    Uuid,
}

/// Whether a device is a plain disk or a software-RAID array member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Plain,
    RaidMember,
}

/// Kind tag value that marks a device as a software-RAID array.
const KIND_MDADM: &str = "mdadm";

/// One SMART attribute check: flag a problem when `problem_if` holds for the
/// attribute's runtime value.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeCheck {
    pub attribute: AttributeId,
    pub problem_if: String,
}

/// Maximum-temperature policy: either a limit in °C or the literal "none".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaxTemp {
    Celsius(i64),
    Keyword(String),
}

impl MaxTemp {
    /// Resolve to `Some(limit)` or `None` ("none", case-insensitive).
    ///
    /// Any other keyword is a validation error naming the device.
    pub fn resolve(&self, device: &str) -> Result<Option<i64>, ConfigError> {
        match self {
            Self::Celsius(limit) => Ok(Some(*limit)),
            Self::Keyword(word) => {
                if word.trim().eq_ignore_ascii_case("none") {
                    Ok(None)
                } else {
                    Err(ConfigError::Validation(format!(
                        "Cannot understand \"max_temp\" = \"{word}\" of device \"{device}\""
                    )))
                }
            }
        }
    }
}

/// One declared device, as read from the policy file. Immutable once parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    /// Human-readable label used in logs and error messages.
    pub name: String,
    /// Short stable identifier used by the reporting layer.
    pub code: String,
    /// How `reference` should be interpreted.
    pub reference_kind: ReferenceKind,
    /// The path or UUID identifying the device.
    pub reference: String,
    /// Probe kind tag selecting tool behavior ("ata", "nvme", "mdadm", ...).
    /// `"mdadm"` also marks the device as a RAID array.
    pub kind: String,
    /// Temperature limit in °C, or the literal "none".
    pub max_temp: MaxTemp,
    /// SMART attribute checks, evaluated in order.
    #[serde(default)]
    pub smart_checks: Vec<AttributeCheck>,
}

impl DeviceRecord {
    /// The normalized probe kind tag (trimmed, lowercase).
    pub fn kind_tag(&self) -> String {
        self.kind.trim().to_ascii_lowercase()
    }

    /// Plain disk or RAID member, derived from the kind tag.
    pub fn device_class(&self) -> DeviceClass {
        if self.kind_tag() == KIND_MDADM {
            DeviceClass::RaidMember
        } else {
            DeviceClass::Plain
        }
    }

    /// Check every field for values the rest of the pipeline cannot work
    /// with. Serde has already enforced presence and basic types; this layer
    /// catches empty strings, unknown keywords, and duplicate attributes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "\"name\" not defined for device".to_string(),
            ));
        }
        if self.code.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "\"code\" not defined for device \"{}\". Make it the same as \
                 the name if unsure why it is needed",
                self.name
            )));
        }
        if self.reference.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "\"reference\" not defined for device \"{}\" ({})",
                self.name, self.code
            )));
        }
        if self.kind_tag().is_empty() {
            return Err(ConfigError::Validation(format!(
                "\"kind\" not defined for device \"{}\" ({})",
                self.name, self.code
            )));
        }

        // Surfaces the error for an unknown max_temp keyword.
        self.max_temp.resolve(&self.name)?;

        // Each attribute may carry at most one condition.
        let mut seen = std::collections::HashSet::with_capacity(self.smart_checks.len());
        for check in &self.smart_checks {
            if !seen.insert(check.attribute) {
                return Err(ConfigError::Validation(format!(
                    "Attribute {} listed twice in \"smart_checks\" of device \"{}\" ({})",
                    check.attribute, self.name, self.code
                )));
            }
            if check.problem_if.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "\"problem_if\" not defined for attribute {} of device \"{}\" ({})",
                    check.attribute, self.name, self.code
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
