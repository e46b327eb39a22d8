//! The device registry: every policy record compiled, resolved, and checked
//! for cross-record invariants.
//!
//! Built explicitly once at process start (or policy reload). Construction
//! is all-or-nothing: any bad record aborts with a [`ConfigError`] and no
//! device is ever evaluated against a partially-validated policy.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::condition::ConditionExpression;
use crate::device::Device;
use crate::error::ConfigError;
use crate::policy::{DeviceClass, DeviceRecord};
use crate::resolve::{self, DeviceCatalog};

/// The full set of devices under watch, in policy order.
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    /// Validate, compile, and resolve every record into a [`Device`].
    ///
    /// Enforces the global invariant that no two records resolve to the same
    /// physical device. Paths are compared after symlink canonicalization,
    /// so a by-id reference and its `/dev/sdX` target collide.
    pub fn build(
        records: &[DeviceRecord],
        catalog: &dyn DeviceCatalog,
    ) -> Result<Self, ConfigError> {
        let mut devices = Vec::with_capacity(records.len());
        // Canonical path -> device name, for duplicate reporting.
        let mut seen: HashMap<PathBuf, String> = HashMap::with_capacity(records.len());

        for record in records {
            record.validate()?;

            let rules = compile_rules(record)?;
            let path = resolve::resolve(
                &record.name,
                record.reference_kind,
                &record.reference,
                catalog,
            )?;

            let canonical = catalog.canonical(&path);
            if seen.insert(canonical.clone(), record.name.clone()).is_some() {
                return Err(ConfigError::DuplicateDevice {
                    path: canonical.display().to_string(),
                });
            }

            tracing::debug!(
                device = %record.name,
                path = %path.display(),
                kind = %record.kind_tag(),
                rules = rules.len(),
                "Device resolved"
            );

            devices.push(Device::new(
                record.name.clone(),
                record.code.clone(),
                path,
                record.kind_tag(),
                record.device_class() == DeviceClass::RaidMember,
                record.max_temp.resolve(&record.name)?,
                rules,
            ));
        }

        Ok(Self { devices })
    }

    /// All devices, in policy order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Compile a record's `problem_if` texts, attaching device/attribute context
/// to any grammar error.
fn compile_rules(
    record: &DeviceRecord,
) -> Result<BTreeMap<u32, ConditionExpression>, ConfigError> {
    record
        .smart_checks
        .iter()
        .map(|check| {
            let expr = ConditionExpression::parse(&check.problem_if).map_err(|source| {
                ConfigError::Condition {
                    device: record.name.clone(),
                    attribute: check.attribute,
                    source,
                }
            })?;
            Ok((check.attribute, expr))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
