//! Slot index and node color primitives.

use std::fmt;

/// Index of a node slot inside a segment's slot array.
///
/// All structural links in the engine are `NodeIndex` values rather than
/// pointers, which keeps the whole structure valid at whatever address a
/// process happens to map the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// The reserved "no such link" value.
    pub const INVALID: Self = Self(u32::MAX);

    /// Create a new index from a raw slot number.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw slot number.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Get the raw slot number widened for array indexing.
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Check whether this is the reserved invalid index.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            write!(f, "slot_-")
        } else {
            write!(f, "slot_{}", self.0)
        }
    }
}

impl From<u32> for NodeIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

/// Node color for red-black rebalancing.
///
/// Colors are stored in slots as a raw `u8` (see [`Color::from_raw`]) so
/// that a re-mapped byte image can never materialize an invalid enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    /// Red node.
    Red = 0,
    /// Black node.
    Black = 1,
}

impl Color {
    /// Decode a color byte. Anything that is not exactly `Red` reads as
    /// `Black`, which matches the convention that absent children are black.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Red,
            _ => Self::Black,
        }
    }

    /// Encode this color as its storage byte.
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        self as u8
    }
}
