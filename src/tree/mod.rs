//! The plain ordered engine: a red-black tree over the slot arena.
//!
//! All structure lives in slot indices inside the segment, so the engine
//! can be dropped and resumed (or remapped by another process) without
//! any encode/decode step. Elements are stored in comparator order;
//! duplicates are supported through the `_equal` insert family.

mod balance;
mod debug;
mod engine;
mod iter;
mod node;

pub use engine::OrdTree;
pub use iter::Iter;
