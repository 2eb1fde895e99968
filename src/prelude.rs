//! Prelude for convenient imports.
//!
//! ```ignore
//! use grove::prelude::*;
//! ```

// Core types
pub use crate::types::{Color, Comparator, NaturalOrder, NodeIndex, Persist, SegmentId};

// Error handling
pub use crate::error::{GroveError, Result};

// Segments
pub use crate::segment::Segment;

// Engines
pub use crate::lru::{ListIter, LruIter, LruOrdTree};
pub use crate::tree::{Iter, OrdTree};
