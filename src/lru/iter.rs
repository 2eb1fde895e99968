//! Tree-order and list-order iteration over a list-augmented engine.

use super::engine::LruOrdTree;
use crate::types::{Comparator, NodeIndex};

/// Double-ended in-order iterator over an [`LruOrdTree`]. Iteration is a
/// read of the tree structure and never refreshes recency.
pub struct Iter<'a, T, C> {
    tree: &'a LruOrdTree<T, C>,
    front: NodeIndex,
    back: NodeIndex,
    remaining: u32,
}

impl<'a, T, C> Iter<'a, T, C>
where
    C: Comparator<T>,
{
    pub(super) fn new(tree: &'a LruOrdTree<T, C>) -> Self {
        Self {
            tree,
            front: tree.first(),
            back: tree.last(),
            remaining: tree.len(),
        }
    }
}

impl<'a, T, C> Iterator for Iter<'a, T, C>
where
    C: Comparator<T>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.front;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.front = self.tree.successor(idx);
        }
        Some(self.tree.pool.value(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl<T, C> DoubleEndedIterator for Iter<'_, T, C>
where
    C: Comparator<T>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.back;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.back = self.tree.predecessor(idx);
        }
        Some(self.tree.pool.value(idx))
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> where C: Comparator<T> {}

impl<'a, T, C> IntoIterator for &'a LruOrdTree<T, C>
where
    C: Comparator<T>,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Double-ended iterator in list order, oldest element first. Each step
/// is O(1) through the intrusive links.
pub struct ListIter<'a, T, C> {
    tree: &'a LruOrdTree<T, C>,
    front: NodeIndex,
    back: NodeIndex,
    remaining: u32,
}

impl<'a, T, C> ListIter<'a, T, C>
where
    C: Comparator<T>,
{
    pub(super) fn new(tree: &'a LruOrdTree<T, C>) -> Self {
        Self {
            tree,
            front: tree.pool.header().list_head(),
            back: tree.pool.header().list_tail(),
            remaining: tree.len(),
        }
    }
}

impl<'a, T, C> Iterator for ListIter<'a, T, C>
where
    C: Comparator<T>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.front;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.front = self.tree.pool.node(idx).order.next;
        }
        Some(self.tree.pool.value(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl<T, C> DoubleEndedIterator for ListIter<'_, T, C>
where
    C: Comparator<T>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.back;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.back = self.tree.pool.node(idx).order.prev;
        }
        Some(self.tree.pool.value(idx))
    }
}

impl<T, C> ExactSizeIterator for ListIter<'_, T, C> where C: Comparator<T> {}
