//! Memory-mapped segments and their in-place header.
//!
//! A grove engine lives inside one contiguous block of memory. The block
//! can be a plain anonymous mapping or a file-backed mapping shared by
//! multiple processes; either way, persistence is achieved purely by the
//! bytes themselves being remapped; nothing is ever encoded or decoded.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ SegmentHeader (128 bytes: magic, geometry, state, free list, │
//! │                element count, order-list ends)               │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Slot array: capacity element slots + 1 sentinel slot, each   │
//! │ a fixed-size node addressed by NodeIndex                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod header;
mod mapping;

pub use header::{
    SegmentHeader, FLAG_LRU, HEADER_SIZE, SEGMENT_MAGIC, SEGMENT_VERSION, STATE_READY,
    STATE_UNFORMATTED,
};
pub use mapping::Segment;
