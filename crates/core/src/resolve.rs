//! Resolution of declared device references to live block-device paths.
//!
//! A policy record names its device one of three ways: a raw `/dev` node, a
//! persistent `/dev/disk/by-id` symlink, or a filesystem UUID. Each form is
//! shape-checked and then resolved against the host through the
//! [`DeviceCatalog`] seam, so resolution is testable without a live `/dev`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::policy::ReferenceKind;

/// One row of the host's block-device listing. Devices without a filesystem
/// (whole disks, empty partitions) carry no UUID.
#[derive(Debug, Clone)]
pub struct BlockDevice {
    /// Kernel name without the `/dev/` prefix, e.g. `sda1`.
    pub name: String,
    pub uuid: Option<String>,
}

/// Read-only view of the block devices visible on the host.
///
/// The agent binds this to `lsblk` plus `std::fs`; tests substitute a fixed
/// in-memory host.
pub trait DeviceCatalog {
    /// All visible block devices with their filesystem UUIDs.
    fn block_devices(&self) -> &[BlockDevice];

    /// Whether `path` exists on the host.
    fn exists(&self, path: &Path) -> bool;

    /// Symlink-resolved form of `path`, used for duplicate detection. When
    /// the host cannot canonicalize (already canonical, or a test double),
    /// implementations return the path unchanged.
    fn canonical(&self, path: &Path) -> PathBuf;
}

fn dev_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/dev/[a-zA-Z0-9]+$").expect("pattern is valid"))
}

fn by_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/dev/disk/by-id/[a-zA-Z0-9_-]+$").expect("pattern is valid"))
}

/// Resolve a declared reference to a live device path.
///
/// `device` is the policy record's name, used only for error messages. All
/// failure modes here are configuration-fatal.
pub fn resolve(
    device: &str,
    kind: ReferenceKind,
    reference: &str,
    catalog: &dyn DeviceCatalog,
) -> Result<PathBuf, ConfigError> {
    match kind {
        ReferenceKind::Dev => resolve_path(device, reference, dev_pattern(), catalog),
        ReferenceKind::ById => resolve_path(device, reference, by_id_pattern(), catalog),
        ReferenceKind::Uuid => resolve_uuid(device, reference, catalog),
    }
}

/// Shared logic for the two path-shaped reference kinds: shape check, then
/// existence check.
fn resolve_path(
    device: &str,
    reference: &str,
    shape: &Regex,
    catalog: &dyn DeviceCatalog,
) -> Result<PathBuf, ConfigError> {
    if !shape.is_match(reference) {
        return Err(ConfigError::InvalidReference {
            device: device.to_string(),
            reference: reference.to_string(),
        });
    }
    let path = PathBuf::from(reference);
    if catalog.exists(&path) {
        Ok(path)
    } else {
        Err(ConfigError::NotFound {
            device: device.to_string(),
            reference: reference.to_string(),
        })
    }
}

/// Look a filesystem UUID up in the block-device catalog. The match is
/// case-insensitive and must be unique across the host.
fn resolve_uuid(
    device: &str,
    uuid: &str,
    catalog: &dyn DeviceCatalog,
) -> Result<PathBuf, ConfigError> {
    let wanted = uuid.trim().to_ascii_lowercase();

    let matches: Vec<&BlockDevice> = catalog
        .block_devices()
        .iter()
        .filter(|dev| {
            dev.uuid
                .as_deref()
                .is_some_and(|u| u.trim().to_ascii_lowercase() == wanted)
        })
        .collect();

    match matches.as_slice() {
        [] => Err(ConfigError::NotFound {
            device: device.to_string(),
            reference: uuid.to_string(),
        }),
        [only] => Ok(PathBuf::from(format!("/dev/{}", only.name))),
        _ => Err(ConfigError::AmbiguousUuid {
            device: device.to_string(),
            uuid: uuid.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
