//! Error types for the grove engine.
//!
//! Every failure is local, synchronous and non-retryable: there is no I/O
//! or network boundary inside the engine, so the taxonomy is small and
//! each variant carries the identifiers needed to act on it. Variants
//! have stable `E0xx` codes for log correlation.
//!
//! Two conditions that look like errors deliberately are not:
//! a unique-mode insert that finds the key already present returns the
//! existing position with a `false` flag, and a failed lookup returns the
//! end position. Both leave the tree untouched.

use crate::types::NodeIndex;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for grove operations.
#[derive(Error, Debug)]
pub enum GroveError {
    /// Failed to create or open a segment file.
    #[error("E001: Failed to create segment at {path}: {cause}")]
    SegmentCreate {
        /// The path where segment creation failed.
        path: PathBuf,
        /// Reason for the failure.
        cause: String,
    },

    /// Failed to memory-map a segment.
    #[error("E002: Failed to map segment at {path}: {cause}")]
    SegmentMap {
        /// The path of the segment file.
        path: PathBuf,
        /// Reason for the mapping failure.
        cause: String,
    },

    /// Segment geometry does not fit the engine's node layout.
    #[error("E003: Segment geometry mismatch: expected {expected}, found {found}")]
    SegmentGeometry {
        /// The geometry the engine requires.
        expected: String,
        /// The geometry the segment actually has.
        found: String,
    },

    /// Segment contents failed validation.
    #[error("E004: Segment corruption detected: {cause}")]
    SegmentCorruption {
        /// Description of the corruption.
        cause: String,
    },

    /// The slot arena is exhausted.
    #[error("E005: Capacity exhausted: all {capacity} slots are in use")]
    CapacityExhausted {
        /// The fixed capacity of the engine.
        capacity: u32,
    },

    /// An operation was given a position it must reject.
    #[error("E006: Invalid position {index}: {cause}")]
    InvalidPosition {
        /// The rejected position.
        index: NodeIndex,
        /// Why the position was rejected.
        cause: String,
    },

    /// A structural invariant does not hold.
    #[error("E007: Invariant violation: {cause}")]
    InvariantViolation {
        /// The violated invariant.
        cause: String,
    },
}

impl GroveError {
    /// Get the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SegmentCreate { .. } => "E001",
            Self::SegmentMap { .. } => "E002",
            Self::SegmentGeometry { .. } => "E003",
            Self::SegmentCorruption { .. } => "E004",
            Self::CapacityExhausted { .. } => "E005",
            Self::InvalidPosition { .. } => "E006",
            Self::InvariantViolation { .. } => "E007",
        }
    }

    /// Whether this error indicates a damaged or mismatched segment, as
    /// opposed to a rejected operation on a healthy one.
    pub fn is_segment_error(&self) -> bool {
        matches!(
            self,
            Self::SegmentCreate { .. }
                | Self::SegmentMap { .. }
                | Self::SegmentGeometry { .. }
                | Self::SegmentCorruption { .. }
        )
    }
}

/// Result type alias using `GroveError`.
pub type Result<T> = std::result::Result<T, GroveError>;
