//! Shared test doubles for resolver, registry, and device tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::resolve::{BlockDevice, DeviceCatalog};

/// Fixed in-memory host: a block-device listing, a set of existing paths,
/// and an optional symlink map applied by `canonical`.
pub(crate) struct FakeHost {
    pub devices: Vec<BlockDevice>,
    pub existing: Vec<PathBuf>,
    pub links: HashMap<PathBuf, PathBuf>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            existing: Vec::new(),
            links: HashMap::new(),
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.existing.push(PathBuf::from(path));
        self
    }

    pub fn with_uuid(mut self, name: &str, uuid: &str) -> Self {
        self.devices.push(BlockDevice {
            name: name.to_string(),
            uuid: Some(uuid.to_string()),
        });
        self
    }

    /// Declare `link` as a symlink to `target` for canonicalization.
    pub fn with_link(mut self, link: &str, target: &str) -> Self {
        self.existing.push(PathBuf::from(link));
        self.links
            .insert(PathBuf::from(link), PathBuf::from(target));
        self
    }
}

impl DeviceCatalog for FakeHost {
    fn block_devices(&self) -> &[BlockDevice] {
        &self.devices
    }

    fn exists(&self, path: &Path) -> bool {
        self.existing.iter().any(|p| p == path)
    }

    fn canonical(&self, path: &Path) -> PathBuf {
        self.links
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.to_path_buf())
    }
}
