//! Segment identity.

use std::fmt;
use uuid::Uuid;

/// Unique identifier stamped into a segment header at creation time.
///
/// The id has no structural meaning; it exists so that logs, summaries and
/// operators can tell two segments apart after files get moved around.
/// Stored as raw bytes so it can live inside the `#[repr(C)]` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct SegmentId {
    /// UUID bytes in big-endian format.
    bytes: [u8; 16],
}

impl SegmentId {
    /// Create a new random segment ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: *Uuid::new_v4().as_bytes(),
        }
    }

    /// Create a segment ID from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            bytes: *uuid.as_bytes(),
        }
    }

    /// Create a segment ID from raw header bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes for header storage.
    #[must_use]
    pub const fn as_bytes(&self) -> [u8; 16] {
        self.bytes
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.bytes)
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg_{}", self.as_uuid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_id_uniqueness() {
        assert_ne!(SegmentId::new(), SegmentId::new());
    }

    #[test]
    fn segment_id_roundtrip() {
        let id = SegmentId::new();
        assert_eq!(SegmentId::from_bytes(id.as_bytes()), id);
        assert_eq!(SegmentId::from_uuid(id.as_uuid()), id);
    }

    #[test]
    fn segment_id_display() {
        let display = format!("{}", SegmentId::new());
        assert!(display.starts_with("seg_"));
    }
}
