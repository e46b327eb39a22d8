//! Concrete probe bindings over the platform's storage tools.
//!
//! Each module binds one external tool and satisfies part of the core probe
//! contracts: `smartctl` (SMART tables + fallback temperature, liveness),
//! `hddtemp` (primary temperature with the sleeping-disk wake protocol),
//! `mdadm` (RAID array state and diagnostics), `lsblk` (block-device
//! catalog for UUID resolution).

pub mod hddtemp;
pub mod lsblk;
pub mod mdadm;
pub mod smartctl;
