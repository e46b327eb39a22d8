//! Configuration-fatal errors raised while building the device registry.
//!
//! Everything in this enum aborts startup before any device is evaluated.
//! Failures that occur *during* evaluation are never errors; they are
//! captured as reasons inside a [`HealthVerdict`](crate::verdict::HealthVerdict).

use crate::condition::ConditionError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A policy record is missing a field or carries an unusable value.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A `problem_if` condition does not match the supported grammar.
    #[error("Invalid condition for attribute {attribute} of device \"{device}\": {source}")]
    Condition {
        device: String,
        attribute: u32,
        source: ConditionError,
    },

    /// A declared reference has the wrong shape for its kind.
    #[error("Cannot understand reference \"{reference}\" of device \"{device}\"")]
    InvalidReference { device: String, reference: String },

    /// A declared path does not exist, or no block device carries the UUID.
    #[error("Device \"{device}\": reference \"{reference}\" does not match any block device")]
    NotFound { device: String, reference: String },

    /// More than one block device carries the declared UUID.
    #[error("Device \"{device}\": multiple block devices carry UUID \"{uuid}\"")]
    AmbiguousUuid { device: String, uuid: String },

    /// Two policy records resolve to the same physical device.
    #[error("Several policy entries resolve to the same device \"{path}\"")]
    DuplicateDevice { path: String },

    /// The block-device catalog itself could not be queried.
    #[error("Block-device catalog unavailable: {0}")]
    CatalogUnavailable(String),
}
