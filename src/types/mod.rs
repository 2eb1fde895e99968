//! Strongly-typed primitives shared by every engine component.

mod index;
mod order;
mod persist;
mod segment_id;

pub use index::{Color, NodeIndex};
pub use order::{Comparator, NaturalOrder};
pub use persist::Persist;
pub use segment_id::SegmentId;
