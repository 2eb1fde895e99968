//! Grove: fixed-capacity ordered storage inside a shared memory segment.
//!
//! This crate provides an ordered associative engine (a red-black tree)
//! whose entire state, links and payloads alike, lives inside one
//! contiguous memory segment. Structure is expressed in slot indices
//! rather than pointers, so the same bytes are valid wherever the
//! segment is mapped: persistence and cross-process sharing are a
//! `mmap`, never a serialization step.
//!
//! # Key components
//!
//! - **Segment**: memory-mapped backing storage, anonymous or file-backed
//! - **OrdTree**: the plain ordered engine with set/multiset semantics
//! - **LruOrdTree**: the same engine plus an intrusive recency list and
//!   opt-in LRU policy
//! - **Types**: `NodeIndex` positions, the `Persist` resume trait,
//!   `Comparator` ordering
//!
//! # Example
//!
//! ```no_run
//! use grove::prelude::*;
//!
//! # fn main() -> grove::Result<()> {
//! // Cold path: create a file-backed engine for 1024 u64 elements.
//! let bytes = OrdTree::<u64>::segment_bytes(1024);
//! let segment = Segment::create("/tmp/grove.seg", bytes)?;
//! let mut tree = OrdTree::<u64>::create_in(segment, 1024)?;
//!
//! tree.insert_unique(42)?;
//! tree.flush()?;
//! drop(tree);
//!
//! // Warm path: a later process re-attaches to the same bytes.
//! let tree = OrdTree::<u64>::resume_in(Segment::open("/tmp/grove.seg")?)?;
//! assert!(tree.contains(&42));
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! The engines do no internal locking. A segment shared between
//! processes needs external serialization (a cross-process mutex or a
//! single-writer discipline); within a process the usual `&`/`&mut`
//! rules are the whole story.

#![warn(missing_docs)]

pub mod error;
pub mod lru;
pub(crate) mod pool;
pub mod prelude;
pub mod segment;
pub mod tree;
pub mod types;

// Re-export key types at crate root for convenience
pub use error::{GroveError, Result};
pub use lru::{ListIter, LruIter, LruOrdTree};
pub use segment::Segment;
pub use tree::{Iter, OrdTree};
pub use types::{Color, Comparator, NaturalOrder, NodeIndex, Persist, SegmentId};
