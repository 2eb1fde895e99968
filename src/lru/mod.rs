//! The list-augmented engine: the same ordered storage with a secondary
//! intrusive list in insertion order, and an opt-in LRU mode where
//! lookups refresh recency. The list head is then the least recently
//! used element, which makes `erase_at(list_first())` an O(log n)
//! eviction.

mod balance;
mod debug;
mod engine;
mod iter;
mod node;

pub use engine::LruOrdTree;
pub use iter::{Iter as LruIter, ListIter};
