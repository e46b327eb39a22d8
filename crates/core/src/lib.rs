//! `diskwatch-core` -- device identity resolution and health evaluation.
//!
//! Pure domain logic for the disk-health daemon: the `problem_if` condition
//! language, policy record validation, device reference resolution, the
//! per-device health check sequence, and the registry that owns the full
//! device set. All host access (subprocess tools, `/dev`) goes through the
//! trait seams in [`probe`] and [`resolve`]; the concrete bindings live in
//! `diskwatch-agent`.

pub mod condition;
pub mod device;
pub mod error;
pub mod policy;
pub mod probe;
pub mod registry;
pub mod resolve;
pub mod types;
pub mod verdict;

#[cfg(test)]
mod testutil;

pub use condition::ConditionExpression;
pub use device::Device;
pub use error::ConfigError;
pub use registry::DeviceRegistry;
pub use verdict::{HealthReason, HealthVerdict};
