//! The host's block-device catalog, discovered once at startup via `lsblk`.
//!
//! [`HostCatalog`] snapshots the `lsblk -ln -o NAME,UUID` listing and binds
//! the [`DeviceCatalog`] seam with real filesystem existence and symlink
//! canonicalization. Discovery failure is configuration-fatal: without a
//! catalog, UUID references cannot be resolved at all.

use std::path::{Path, PathBuf};
use std::time::Duration;

use diskwatch_core::error::ConfigError;
use diskwatch_core::resolve::{BlockDevice, DeviceCatalog};

use crate::subprocess::run_tool;

/// Timeout for the lsblk invocation.
const TOOL_TIMEOUT: Duration = Duration::from_secs(15);

/// Snapshot of the host's block devices plus live filesystem access.
#[derive(Debug)]
pub struct HostCatalog {
    devices: Vec<BlockDevice>,
}

impl HostCatalog {
    /// Query `lsblk` and capture the current block-device listing.
    pub async fn discover() -> Result<Self, ConfigError> {
        let output = run_tool("lsblk", &["-ln", "-o", "NAME,UUID"], TOOL_TIMEOUT)
            .await
            .map_err(|e| ConfigError::CatalogUnavailable(e.to_string()))?;

        if !output.success() {
            return Err(ConfigError::CatalogUnavailable(format!(
                "lsblk exited with code {}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }

        let devices = parse_listing(&output.stdout);
        tracing::debug!(devices = devices.len(), "Block-device catalog discovered");
        Ok(Self { devices })
    }

    #[cfg(test)]
    fn from_listing(stdout: &str) -> Self {
        Self {
            devices: parse_listing(stdout),
        }
    }
}

impl DeviceCatalog for HostCatalog {
    fn block_devices(&self) -> &[BlockDevice] {
        &self.devices
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn canonical(&self, path: &Path) -> PathBuf {
        // Fall back to the path itself when canonicalization fails; the
        // existence check has already run by the time this is called.
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Parse `lsblk -ln -o NAME,UUID` output: one device per line, name first,
/// UUID second when the device carries a filesystem.
fn parse_listing(stdout: &str) -> Vec<BlockDevice> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            Some(BlockDevice {
                name: name.to_string(),
                uuid: parts.next().map(str::to_string),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_SAMPLE: &str = "\
sda
sda1 ABCD-1234
sda2 9c0c3dfc-74d8-4f1e-a3e9-6d4b2c5e7f10
sdb
md0  1e3a5c7b-0000-4b2d-8888-aaaaaaaaaaaa
";

    #[test]
    fn parses_names_and_uuids() {
        let catalog = HostCatalog::from_listing(LISTING_SAMPLE);
        let devices = catalog.block_devices();

        assert_eq!(devices.len(), 5);
        assert_eq!(devices[0].name, "sda");
        assert_eq!(devices[0].uuid, None);
        assert_eq!(devices[1].name, "sda1");
        assert_eq!(devices[1].uuid.as_deref(), Some("ABCD-1234"));
        assert_eq!(devices[4].name, "md0");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let catalog = HostCatalog::from_listing("\n\nsda\n\n");
        assert_eq!(catalog.block_devices().len(), 1);
    }

    #[test]
    fn empty_listing_is_empty_catalog() {
        let catalog = HostCatalog::from_listing("");
        assert!(catalog.block_devices().is_empty());
    }
}
