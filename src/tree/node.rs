//! Node shape for the plain tree engine.

use crate::pool::{Links, PoolNode};
use std::mem::MaybeUninit;

/// One slot of the plain engine: structural links plus the payload.
///
/// The payload area is `MaybeUninit` because free slots hold no element;
/// the pool tracks liveness through the `in_use` bit in [`Links`].
#[derive(Debug)]
#[repr(C)]
pub(crate) struct TreeNode<T> {
    pub links: Links,
    pub value: MaybeUninit<T>,
}

impl<T> PoolNode for TreeNode<T> {
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

    fn reset_aux(&mut self) {}
}
