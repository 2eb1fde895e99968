//! The list-augmented ordered-storage engine.

use super::iter::{Iter, ListIter};
use super::node::LruNode;
use crate::error::{GroveError, Result};
use crate::pool::NodePool;
use crate::segment::Segment;
use crate::types::{Comparator, NaturalOrder, NodeIndex, Persist, SegmentId};
use std::cmp::Ordering;

/// Fixed-capacity ordered storage with a secondary insertion/recency
/// order list.
///
/// Tree semantics are identical to [`OrdTree`](crate::OrdTree); on top of
/// them every live element is threaded onto an intrusive doubly linked
/// list whose ends live in the segment header. Allocation appends to the
/// list tail and erasure unthreads, so by default the list reads in
/// insertion order.
///
/// With LRU mode enabled ([`LruOrdTree::set_lru`], persisted in the
/// header flags) a successful [`find`](LruOrdTree::find),
/// [`count`](LruOrdTree::count) or [`equal_range`](LruOrdTree::equal_range)
/// also moves every matched element to the list tail, which makes the
/// list head the least-recently-used element, i.e. the eviction candidate.
/// Lookup misses and tree-order traversal never disturb the list.
#[derive(Debug)]
pub struct LruOrdTree<T, C = NaturalOrder> {
    pub(super) pool: NodePool<LruNode<T>>,
    pub(super) cmp: C,
}

impl<T> LruOrdTree<T, NaturalOrder>
where
    T: Ord,
{
    /// Create an engine in a fresh anonymous segment.
    pub fn create(capacity: u32) -> Result<Self> {
        let segment = Segment::anonymous(Self::segment_bytes(capacity))?;
        Self::create_in(segment, capacity)
    }
}

impl<T, C> LruOrdTree<T, C>
where
    C: Comparator<T>,
{
    /// Bytes a segment must provide to hold an engine of `capacity`
    /// elements of this type.
    #[must_use]
    pub fn segment_bytes(capacity: u32) -> usize {
        NodePool::<LruNode<T>>::segment_bytes(capacity)
    }

    /// Create an engine in a brand-new segment (cold path). Formatting
    /// is unconditional; a segment that already holds an engine is
    /// reformatted and its contents destroyed.
    pub fn create_in(segment: Segment, capacity: u32) -> Result<Self>
    where
        C: Default,
    {
        Self::create_with(segment, capacity, C::default())
    }

    /// Like [`LruOrdTree::create_in`] with an explicit comparator.
    pub fn create_with(segment: Segment, capacity: u32, cmp: C) -> Result<Self> {
        let pool = NodePool::create(segment, capacity)?;
        Ok(Self { pool, cmp })
    }

    /// Attach to an existing populated segment (warm path).
    ///
    /// On top of the usual validation, the order list is walked once and
    /// cross-checked against the element count. LRU mode comes back in
    /// whatever state the header flags recorded.
    pub fn resume_in(segment: Segment) -> Result<Self>
    where
        T: Persist,
        C: Default,
    {
        Self::resume_with(segment, C::default())
    }

    /// Like [`LruOrdTree::resume_in`] with an explicit comparator.
    pub fn resume_with(segment: Segment, cmp: C) -> Result<Self>
    where
        T: Persist,
    {
        let pool = NodePool::resume(segment)?;
        let engine = Self { pool, cmp };
        engine.check_list_accounting()?;
        Ok(engine)
    }

    fn check_list_accounting(&self) -> Result<()> {
        let mut threaded = 0u32;
        let mut idx = self.pool.header().list_head();
        while !idx.is_invalid() && threaded <= self.pool.capacity() {
            if !self.pool.in_bounds(idx) || idx == self.end() || !self.pool.links(idx).in_use() {
                return Err(GroveError::SegmentCorruption {
                    cause: format!("order list reaches bad slot {}", idx),
                });
            }
            threaded += 1;
            idx = self.pool.node(idx).order.next;
        }
        if threaded != self.pool.len() {
            return Err(GroveError::SegmentCorruption {
                cause: format!(
                    "order list threads {} nodes but {} elements are live",
                    threaded,
                    self.pool.len()
                ),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Capacity queries
    // ------------------------------------------------------------------

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.pool.len()
    }

    /// Whether the engine holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Whether every slot is in use.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.pool.is_full()
    }

    /// The fixed element capacity.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.pool.capacity()
    }

    /// Identity of the backing segment.
    #[must_use]
    pub fn segment_id(&self) -> SegmentId {
        self.pool.header().segment_id()
    }

    /// Flush the backing segment's dirty pages, if file-backed.
    pub fn flush(&self) -> Result<()> {
        self.pool.segment().flush()
    }

    // ------------------------------------------------------------------
    // LRU policy
    // ------------------------------------------------------------------

    /// Whether lookups currently refresh recency.
    #[must_use]
    pub fn lru_enabled(&self) -> bool {
        self.pool.header().lru_enabled()
    }

    /// Switch LRU mode on or off. The setting is stored in the header
    /// flags, so it survives drop and resume along with the data.
    pub fn set_lru(&mut self, enabled: bool) {
        self.pool.header_mut().set_lru_enabled(enabled);
        tracing::debug!(segment = %self.segment_id(), enabled, "lru mode changed");
    }

    /// Move a live element to the list tail (most recent). O(1); no-op
    /// when the element already is the tail.
    pub fn touch(&mut self, idx: NodeIndex) -> Result<()> {
        if !self.is_live(idx) {
            return Err(GroveError::InvalidPosition {
                index: idx,
                cause: "touch target is not a live element".to_string(),
            });
        }
        self.move_to_tail(idx);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Positions (tree order)
    // ------------------------------------------------------------------

    /// The past-the-end position (the sentinel slot).
    #[must_use]
    pub fn end(&self) -> NodeIndex {
        self.pool.sentinel()
    }

    /// Position of the smallest element, or `end()` when empty.
    #[must_use]
    pub fn first(&self) -> NodeIndex {
        self.pool.links(self.end()).left
    }

    /// Position of the largest element, or `end()` when empty.
    #[must_use]
    pub fn last(&self) -> NodeIndex {
        self.pool.links(self.end()).right
    }

    /// Structural successor of `idx`; `end()` past the last element.
    #[must_use]
    pub fn next(&self, idx: NodeIndex) -> NodeIndex {
        if !self.is_live(idx) {
            return self.end();
        }
        self.successor(idx)
    }

    /// Structural predecessor of `idx`; `prev(end())` is the maximum.
    #[must_use]
    pub fn prev(&self, idx: NodeIndex) -> NodeIndex {
        if idx == self.end() {
            return self.last();
        }
        if !self.is_live(idx) {
            return self.end();
        }
        self.predecessor(idx)
    }

    /// Borrow the element at a position, if it is live. Never refreshes
    /// recency; positions are for structural access.
    #[must_use]
    pub fn get(&self, idx: NodeIndex) -> Option<&T> {
        if self.is_live(idx) {
            Some(self.pool.value(idx))
        } else {
            None
        }
    }

    /// Borrow the element at a position mutably, if it is live.
    ///
    /// In-place mutation must not change how the element compares.
    #[must_use]
    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut T> {
        if self.is_live(idx) {
            Some(self.pool.value_mut(idx))
        } else {
            None
        }
    }

    /// Iterate elements in comparator order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter::new(self)
    }

    // ------------------------------------------------------------------
    // Positions (list order)
    // ------------------------------------------------------------------

    /// Oldest element in list order (the eviction candidate under LRU),
    /// or `end()` when empty.
    #[must_use]
    pub fn list_first(&self) -> NodeIndex {
        let head = self.pool.header().list_head();
        if head.is_invalid() {
            self.end()
        } else {
            head
        }
    }

    /// Most recent element in list order, or `end()` when empty.
    #[must_use]
    pub fn list_last(&self) -> NodeIndex {
        let tail = self.pool.header().list_tail();
        if tail.is_invalid() {
            self.end()
        } else {
            tail
        }
    }

    /// Iterate elements in list order, oldest first.
    #[must_use]
    pub fn list_iter(&self) -> ListIter<'_, T, C> {
        ListIter::new(self)
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Position of some element equal to `probe`, if any.
    ///
    /// Takes `&mut self`: with LRU mode on, a hit moves the matched
    /// element to the list tail. A miss changes nothing.
    pub fn find(&mut self, probe: &T) -> Option<NodeIndex> {
        let lb = self.lower_bound(probe);
        if lb != self.end() && self.cmp.compare(probe, self.pool.value(lb)) == Ordering::Equal {
            if self.lru_enabled() {
                self.move_to_tail(lb);
            }
            Some(lb)
        } else {
            None
        }
    }

    /// Whether an element equal to `probe` is stored. Never refreshes
    /// recency.
    #[must_use]
    pub fn contains(&self, probe: &T) -> bool {
        let lb = self.lower_bound(probe);
        lb != self.end() && self.cmp.compare(probe, self.pool.value(lb)) == Ordering::Equal
    }

    /// Number of elements equal to `probe`. With LRU mode on, every
    /// counted element is refreshed in list order.
    pub fn count(&mut self, probe: &T) -> u32 {
        let (lo, hi) = self.equal_range(probe);
        let mut n = 0;
        let mut cur = lo;
        while cur != hi {
            n += 1;
            cur = self.successor(cur);
        }
        n
    }

    /// First position whose element is not less than `probe`.
    #[must_use]
    pub fn lower_bound(&self, probe: &T) -> NodeIndex {
        let mut cur = self.root();
        let mut best = self.end();
        while !cur.is_invalid() {
            if self.cmp.compare(self.pool.value(cur), probe) != Ordering::Less {
                best = cur;
                cur = self.pool.links(cur).left;
            } else {
                cur = self.pool.links(cur).right;
            }
        }
        best
    }

    /// First position whose element is greater than `probe`.
    #[must_use]
    pub fn upper_bound(&self, probe: &T) -> NodeIndex {
        let mut cur = self.root();
        let mut best = self.end();
        while !cur.is_invalid() {
            if self.cmp.compare(self.pool.value(cur), probe) == Ordering::Greater {
                best = cur;
                cur = self.pool.links(cur).left;
            } else {
                cur = self.pool.links(cur).right;
            }
        }
        best
    }

    /// The contiguous span of elements equal to `probe`, as
    /// `(lower_bound, upper_bound)`. With LRU mode on, every element in
    /// the span is refreshed, oldest-first in tree order.
    pub fn equal_range(&mut self, probe: &T) -> (NodeIndex, NodeIndex) {
        let lo = self.lower_bound(probe);
        let hi = self.upper_bound(probe);
        if self.lru_enabled() {
            let mut cur = lo;
            while cur != hi {
                self.move_to_tail(cur);
                cur = self.successor(cur);
            }
        }
        (lo, hi)
    }

    // ------------------------------------------------------------------
    // Inserts
    // ------------------------------------------------------------------

    /// Insert rejecting duplicates; see [`OrdTree::insert_unique`].
    ///
    /// A rejected duplicate is not an access: the existing element keeps
    /// its list position.
    ///
    /// [`OrdTree::insert_unique`]: crate::OrdTree::insert_unique
    pub fn insert_unique(&mut self, value: T) -> Result<(NodeIndex, bool)> {
        match self.descend_unique(&value) {
            Some(idx) => Ok((idx, false)),
            None => {
                let idx = self.insert_threaded(value)?;
                Ok((idx, true))
            }
        }
    }

    /// Insert keeping duplicates; the new element becomes the list tail.
    pub fn insert_equal(&mut self, value: T) -> Result<NodeIndex> {
        self.insert_threaded(value)
    }

    /// [`LruOrdTree::insert_unique`] with a position hint.
    pub fn insert_unique_hint(&mut self, hint: NodeIndex, value: T) -> Result<(NodeIndex, bool)> {
        if let Some((parent, as_left)) = self.hint_position(hint, &value, true) {
            let idx = self.allocate_threaded(value)?;
            self.link_node(idx, parent, as_left);
            return Ok((idx, true));
        }
        self.insert_unique(value)
    }

    /// [`LruOrdTree::insert_equal`] with a position hint.
    pub fn insert_equal_hint(&mut self, hint: NodeIndex, value: T) -> Result<NodeIndex> {
        if let Some((parent, as_left)) = self.hint_position(hint, &value, false) {
            let idx = self.allocate_threaded(value)?;
            self.link_node(idx, parent, as_left);
            return Ok(idx);
        }
        self.insert_equal(value)
    }

    /// Batch insert rejecting duplicates; returns the inserted count and
    /// logs an advisory when slots run out.
    pub fn insert_many_unique<I>(&mut self, values: I) -> u32
    where
        I: IntoIterator<Item = T>,
    {
        let mut inserted = 0;
        let mut rejected = 0u32;
        for value in values {
            match self.insert_unique(value) {
                Ok((_, true)) => inserted += 1,
                Ok((_, false)) => {}
                Err(_) => rejected += 1,
            }
        }
        if rejected > 0 {
            tracing::warn!(
                segment = %self.segment_id(),
                inserted,
                rejected,
                capacity = self.capacity(),
                "batch insert ran out of slots"
            );
        }
        inserted
    }

    /// Batch insert keeping duplicates.
    pub fn insert_many_equal<I>(&mut self, values: I) -> u32
    where
        I: IntoIterator<Item = T>,
    {
        let mut inserted = 0;
        let mut rejected = 0u32;
        for value in values {
            match self.insert_equal(value) {
                Ok(_) => inserted += 1,
                Err(_) => rejected += 1,
            }
        }
        if rejected > 0 {
            tracing::warn!(
                segment = %self.segment_id(),
                inserted,
                rejected,
                capacity = self.capacity(),
                "batch insert ran out of slots"
            );
        }
        inserted
    }

    // ------------------------------------------------------------------
    // Erase
    // ------------------------------------------------------------------

    /// Erase the element at a position, returning its tree-order
    /// successor. The element is unthreaded from the list before its
    /// payload is destroyed.
    pub fn erase_at(&mut self, idx: NodeIndex) -> Result<NodeIndex> {
        if !self.is_live(idx) {
            return Err(GroveError::InvalidPosition {
                index: idx,
                cause: if self.pool.in_bounds(idx) {
                    if idx == self.end() {
                        "cannot erase the end position".to_string()
                    } else {
                        "slot is free".to_string()
                    }
                } else {
                    "index is out of range for this engine".to_string()
                },
            });
        }
        let next = self.successor(idx);
        self.unthread(idx);
        self.unlink_node(idx);
        self.pool.release(idx);
        Ok(next)
    }

    /// Erase every element equal to `probe`; returns how many were
    /// removed. Erasure is not an access, so nothing is refreshed.
    pub fn erase(&mut self, probe: &T) -> u32 {
        let lo = self.lower_bound(probe);
        let hi = self.upper_bound(probe);
        let mut cur = lo;
        let mut erased = 0;
        while cur != hi {
            let next = self.successor(cur);
            self.unthread(cur);
            self.unlink_node(cur);
            self.pool.release(cur);
            erased += 1;
            cur = next;
        }
        erased
    }

    /// Remove every element and reset the list; LRU mode is preserved.
    pub fn clear(&mut self) {
        let lru = self.lru_enabled();
        self.pool.drop_payloads();
        self.pool.format_slots();
        let header = self.pool.header_mut();
        header.set_lru_enabled(lru);
        header.mark_ready();
        tracing::debug!(segment = %self.segment_id(), "cleared engine");
    }

    // ------------------------------------------------------------------
    // Internal: list threading
    // ------------------------------------------------------------------

    /// Append a node to the list tail. The node must not be threaded.
    fn thread_tail(&mut self, idx: NodeIndex) {
        let tail = self.pool.header().list_tail();
        {
            let order = &mut self.pool.node_mut(idx).order;
            order.prev = tail;
            order.next = NodeIndex::INVALID;
        }
        if tail.is_invalid() {
            self.pool.header_mut().set_list_head(idx);
        } else {
            self.pool.node_mut(tail).order.next = idx;
        }
        self.pool.header_mut().set_list_tail(idx);
    }

    /// Remove a node from the list, leaving its order links reset.
    fn unthread(&mut self, idx: NodeIndex) {
        let prev = self.pool.node(idx).order.prev;
        let next = self.pool.node(idx).order.next;

        if prev.is_invalid() {
            self.pool.header_mut().set_list_head(next);
        } else {
            self.pool.node_mut(prev).order.next = next;
        }
        if next.is_invalid() {
            self.pool.header_mut().set_list_tail(prev);
        } else {
            self.pool.node_mut(next).order.prev = prev;
        }

        let order = &mut self.pool.node_mut(idx).order;
        order.prev = NodeIndex::INVALID;
        order.next = NodeIndex::INVALID;
    }

    fn move_to_tail(&mut self, idx: NodeIndex) {
        if self.pool.header().list_tail() == idx {
            return;
        }
        self.unthread(idx);
        self.thread_tail(idx);
    }

    /// Allocate a slot and thread it onto the list tail.
    fn allocate_threaded(&mut self, value: T) -> Result<NodeIndex> {
        let idx = self
            .pool
            .allocate(value)
            .ok_or(GroveError::CapacityExhausted {
                capacity: self.pool.capacity(),
            })?;
        self.thread_tail(idx);
        Ok(idx)
    }

    fn insert_threaded(&mut self, value: T) -> Result<NodeIndex> {
        let (parent, as_left) = self.attach_point(&value);
        let idx = self.allocate_threaded(value)?;
        self.link_node(idx, parent, as_left);
        Ok(idx)
    }

    // ------------------------------------------------------------------
    // Internal: structure helpers
    // ------------------------------------------------------------------

    pub(super) fn root(&self) -> NodeIndex {
        self.pool.links(self.end()).parent
    }

    pub(super) fn is_live(&self, idx: NodeIndex) -> bool {
        self.pool.in_bounds(idx) && idx != self.end() && self.pool.links(idx).in_use()
    }

    pub(super) fn subtree_min(&self, mut idx: NodeIndex) -> NodeIndex {
        while !self.pool.links(idx).left.is_invalid() {
            idx = self.pool.links(idx).left;
        }
        idx
    }

    pub(super) fn subtree_max(&self, mut idx: NodeIndex) -> NodeIndex {
        while !self.pool.links(idx).right.is_invalid() {
            idx = self.pool.links(idx).right;
        }
        idx
    }

    pub(super) fn successor(&self, idx: NodeIndex) -> NodeIndex {
        let right = self.pool.links(idx).right;
        if !right.is_invalid() {
            return self.subtree_min(right);
        }
        let mut cur = idx;
        let mut parent = self.pool.links(cur).parent;
        while parent != self.end() && cur == self.pool.links(parent).right {
            cur = parent;
            parent = self.pool.links(cur).parent;
        }
        parent
    }

    pub(super) fn predecessor(&self, idx: NodeIndex) -> NodeIndex {
        let left = self.pool.links(idx).left;
        if !left.is_invalid() {
            return self.subtree_max(left);
        }
        let mut cur = idx;
        let mut parent = self.pool.links(cur).parent;
        while parent != self.end() && cur == self.pool.links(parent).left {
            cur = parent;
            parent = self.pool.links(cur).parent;
        }
        parent
    }

    // ------------------------------------------------------------------
    // Internal: descent and linking
    // ------------------------------------------------------------------

    /// Full descent in unique mode; `Some` when an equal element exists.
    fn descend_unique(&self, value: &T) -> Option<NodeIndex> {
        let mut cur = self.root();
        while !cur.is_invalid() {
            match self.cmp.compare(value, self.pool.value(cur)) {
                Ordering::Less => cur = self.pool.links(cur).left,
                Ordering::Greater => cur = self.pool.links(cur).right,
                Ordering::Equal => return Some(cur),
            }
        }
        None
    }

    /// Full descent to an attach point, ties descending rightward. The
    /// unique path only gets here after ruling out an equal element, so
    /// the tie rule never applies to it.
    fn attach_point(&self, value: &T) -> (NodeIndex, bool) {
        let mut cur = self.root();
        let mut parent = self.end();
        let mut as_left = true;
        while !cur.is_invalid() {
            parent = cur;
            if self.cmp.compare(value, self.pool.value(cur)) == Ordering::Less {
                as_left = true;
                cur = self.pool.links(cur).left;
            } else {
                as_left = false;
                cur = self.pool.links(cur).right;
            }
        }
        (parent, as_left)
    }

    /// Try to turn a hint into an O(1) attach point; same bracketing
    /// rules as the plain engine.
    fn hint_position(&self, hint: NodeIndex, value: &T, unique: bool) -> Option<(NodeIndex, bool)> {
        if self.is_empty() {
            return None;
        }
        if hint == self.end() {
            let max = self.last();
            let order = self.cmp.compare(self.pool.value(max), value);
            let fits = if unique {
                order == Ordering::Less
            } else {
                order != Ordering::Greater
            };
            return fits.then_some((max, false));
        }
        if !self.is_live(hint) {
            return None;
        }
        if self.cmp.compare(value, self.pool.value(hint)) != Ordering::Less {
            return None;
        }

        let prev = self.predecessor(hint);
        if prev == self.end() {
            return Some((hint, true));
        }
        let order = self.cmp.compare(self.pool.value(prev), value);
        let fits = if unique {
            order == Ordering::Less
        } else {
            order != Ordering::Greater
        };
        if !fits {
            return None;
        }
        if self.pool.links(hint).left.is_invalid() {
            Some((hint, true))
        } else {
            Some((prev, false))
        }
    }

    pub(super) fn link_node(&mut self, idx: NodeIndex, parent: NodeIndex, as_left: bool) {
        let end = self.end();
        self.pool.links_mut(idx).parent = parent;

        if parent == end {
            let sentinel = self.pool.links_mut(end);
            sentinel.parent = idx;
            sentinel.left = idx;
            sentinel.right = idx;
        } else if as_left {
            self.pool.links_mut(parent).left = idx;
            if self.pool.links(end).left == parent {
                self.pool.links_mut(end).left = idx;
            }
        } else {
            self.pool.links_mut(parent).right = idx;
            if self.pool.links(end).right == parent {
                self.pool.links_mut(end).right = idx;
            }
        }

        self.insert_fixup(idx);
    }

    pub(super) fn unlink_node(&mut self, z: NodeIndex) {
        let end = self.end();

        let new_min = (self.pool.links(end).left == z).then(|| self.successor(z));
        let new_max = (self.pool.links(end).right == z).then(|| self.predecessor(z));

        let z_left = self.pool.links(z).left;
        let z_right = self.pool.links(z).right;

        let removed_black;
        let x;
        let x_parent;

        if z_left.is_invalid() || z_right.is_invalid() {
            let child = if z_left.is_invalid() { z_right } else { z_left };
            removed_black = self.pool.links(z).color() == crate::types::Color::Black;
            x = child;
            x_parent = self.pool.links(z).parent;
            self.transplant(z, child);
        } else {
            let y = self.subtree_min(z_right);
            removed_black = self.pool.links(y).color() == crate::types::Color::Black;
            x = self.pool.links(y).right;

            if self.pool.links(y).parent == z {
                x_parent = y;
            } else {
                x_parent = self.pool.links(y).parent;
                self.transplant(y, self.pool.links(y).right);
                self.pool.links_mut(y).right = z_right;
                self.pool.links_mut(z_right).parent = y;
            }

            self.transplant(z, y);
            self.pool.links_mut(y).left = z_left;
            self.pool.links_mut(z_left).parent = y;
            let z_color = self.pool.links(z).color();
            self.pool.links_mut(y).set_color(z_color);
        }

        if removed_black {
            self.erase_fixup(x, x_parent);
        }

        if let Some(min) = new_min {
            self.pool.links_mut(end).left = if min == end || self.root().is_invalid() {
                end
            } else {
                min
            };
        }
        if let Some(max) = new_max {
            self.pool.links_mut(end).right = if max == end || self.root().is_invalid() {
                end
            } else {
                max
            };
        }
    }

    pub(super) fn transplant(&mut self, u: NodeIndex, v: NodeIndex) {
        let parent = self.pool.links(u).parent;
        if parent == self.end() {
            self.pool.links_mut(self.end()).parent = v;
        } else if self.pool.links(parent).left == u {
            self.pool.links_mut(parent).left = v;
        } else {
            self.pool.links_mut(parent).right = v;
        }
        if !v.is_invalid() {
            self.pool.links_mut(v).parent = parent;
        }
    }
}
