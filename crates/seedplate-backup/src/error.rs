//! Backup planning errors.

use thiserror::Error;

use seedplate_ur::{NoEncoding, UrError};
use seedplate_urtypes::DescriptorError;

/// Errors from planning the fragments of one plate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The plate index does not name a co-signer.
    #[error("key index {key_idx} out of range for {keys} keys")]
    KeyIndexOutOfRange {
        /// Requested plate index.
        key_idx: usize,
        /// Number of co-signer keys.
        keys: usize,
    },

    /// The descriptor's (M, N) pair is not a valid threshold.
    #[error("threshold {threshold} incompatible with {keys} keys")]
    InvalidThreshold {
        /// Signing threshold M.
        threshold: usize,
        /// Number of keys N.
        keys: usize,
    },

    /// The descriptor failed to encode.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The sequence-number search hit its probe bound. Indicates a planner
    /// bug, never a property of user input.
    #[error(transparent)]
    NoEncoding(#[from] NoEncoding),

    /// UR assembly failed.
    #[error(transparent)]
    Encoding(#[from] UrError),
}

/// Top-level backup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackupError {
    /// The planned fragments cannot fit inside the plate's safe area.
    /// Reported by the engraving consumer and propagated unchanged;
    /// recovery is picking a larger plate or a simpler descriptor.
    #[error("output descriptor is too large to back up")]
    DescriptorTooLarge,

    /// Planning failed before any engraving was attempted.
    #[error(transparent)]
    Plan(#[from] PlanError),
}
