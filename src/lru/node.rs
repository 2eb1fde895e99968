//! Node shape for the list-augmented engine.

use crate::pool::{Links, PoolNode};
use crate::types::NodeIndex;
use std::mem::MaybeUninit;

/// Intrusive order-list threading, separate from the tree links.
#[derive(Debug)]
#[repr(C)]
pub(crate) struct ListLinks {
    /// Previous node in list order, or `INVALID` at the head.
    pub prev: NodeIndex,
    /// Next node in list order, or `INVALID` at the tail.
    pub next: NodeIndex,
}

/// One slot of the list-augmented engine: tree links, order-list links
/// and the payload. Wider than the plain node, which is why the two
/// engines are distinct instantiations and a segment formatted for one
/// is rejected by the other's geometry check.
#[derive(Debug)]
#[repr(C)]
pub(crate) struct LruNode<T> {
    pub links: Links,
    pub order: ListLinks,
    pub value: MaybeUninit<T>,
}

impl<T> PoolNode for LruNode<T> {
    type Elem = T;

    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }

    fn elem_ptr(&self) -> *const T {
        self.value.as_ptr()
    }

    fn elem_mut_ptr(&mut self) -> *mut T {
        self.value.as_mut_ptr()
    }

    fn reset_aux(&mut self) {
        self.order.prev = NodeIndex::INVALID;
        self.order.next = NodeIndex::INVALID;
    }
}
