//! The plain ordered-storage engine.

use super::iter::Iter;
use super::node::TreeNode;
use crate::error::{GroveError, Result};
use crate::pool::NodePool;
use crate::segment::Segment;
use crate::types::{Comparator, NaturalOrder, NodeIndex, Persist, SegmentId};
use std::cmp::Ordering;

/// Fixed-capacity ordered storage over a memory-mapped segment.
///
/// `OrdTree` keeps its elements in comparator order inside a red-black
/// tree whose links are slot indices into the segment, never pointers, so
/// the same bytes are valid in every process that maps the segment.
/// Capacity is fixed at creation; when every slot is in use, inserts fail
/// with [`GroveError::CapacityExhausted`] instead of growing.
///
/// Positions are [`NodeIndex`] values. The sentinel slot (index
/// `capacity`) is the `end()` position returned by [`OrdTree::end`],
/// bound lookups that run off the tree, and stepping past the last
/// element. A position stays valid until the element it names is erased.
///
/// The engine performs no internal synchronization; see [`Segment`].
#[derive(Debug)]
pub struct OrdTree<T, C = NaturalOrder> {
    pub(super) pool: NodePool<TreeNode<T>>,
    pub(super) cmp: C,
}

impl<T> OrdTree<T, NaturalOrder>
where
    T: Ord,
{
    /// Create an engine in a fresh anonymous segment.
    pub fn create(capacity: u32) -> Result<Self> {
        let segment = Segment::anonymous(Self::segment_bytes(capacity))?;
        Self::create_in(segment, capacity)
    }
}

impl<T, C> OrdTree<T, C>
where
    C: Comparator<T>,
{
    /// Bytes a segment must provide to hold an engine of `capacity`
    /// elements of this type.
    #[must_use]
    pub fn segment_bytes(capacity: u32) -> usize {
        NodePool::<TreeNode<T>>::segment_bytes(capacity)
    }

    /// Create an engine in a brand-new segment (cold path).
    ///
    /// Formats the segment: builds the free list over all element slots,
    /// initializes the sentinel and zeroes the element count. Formatting
    /// is unconditional, so calling this on a segment that already holds
    /// an engine destroys its contents; attaching to an existing
    /// populated segment goes through [`OrdTree::resume_in`] instead.
    pub fn create_in(segment: Segment, capacity: u32) -> Result<Self>
    where
        C: Default,
    {
        Self::create_with(segment, capacity, C::default())
    }

    /// Like [`OrdTree::create_in`] with an explicit comparator instance.
    pub fn create_with(segment: Segment, capacity: u32, cmp: C) -> Result<Self> {
        let pool = NodePool::create(segment, capacity)?;
        Ok(Self { pool, cmp })
    }

    /// Attach to an existing populated segment (warm path).
    ///
    /// Validates header, geometry and live-slot accounting, re-runs
    /// [`Persist::resume`] on every live element, and changes nothing
    /// structural. Resuming a segment that was never created is rejected
    /// by the state word in the header; the reverse mistake is not
    /// detectable, since [`OrdTree::create_in`] reformats whatever it is
    /// given.
    pub fn resume_in(segment: Segment) -> Result<Self>
    where
        T: Persist,
        C: Default,
    {
        Self::resume_with(segment, C::default())
    }

    /// Like [`OrdTree::resume_in`] with an explicit comparator instance.
    ///
    /// The comparator must order elements identically to the one the
    /// segment was populated with; the engine has no way to check this.
    pub fn resume_with(segment: Segment, cmp: C) -> Result<Self>
    where
        T: Persist,
    {
        let pool = NodePool::resume(segment)?;
        Ok(Self { pool, cmp })
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
    // Positions
    // ------------------------------------------------------------------

    /// The past-the-end position (the sentinel slot).
    #[must_use]
    pub fn end(&self) -> NodeIndex {
        self.pool.sentinel()
    }

    /// Position of the smallest element, or `end()` when empty. O(1): the
    /// sentinel caches the minimum.
    #[must_use]
    pub fn first(&self) -> NodeIndex {
        self.pool.links(self.end()).left
    }

    /// Position of the largest element, or `end()` when empty. O(1).
    #[must_use]
    pub fn last(&self) -> NodeIndex {
        self.pool.links(self.end()).right
    }

    /// Structural successor of `idx`; `end()` past the last element or
    /// for a position that is not live.
    #[must_use]
    pub fn next(&self, idx: NodeIndex) -> NodeIndex {
        if !self.is_live(idx) {
            return self.end();
        }
        self.successor(idx)
    }

    /// Structural predecessor of `idx`. Stepping back from `end()` yields
    /// the largest element; stepping back from the first yields `end()`.
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

    /// Borrow the element at a position, if it is live.
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
    /// In-place mutation must not change how the element compares; the
    /// tree is not re-sorted.
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
    // Lookups
    // ------------------------------------------------------------------

    /// Position of some element equal to `probe`, if any.
    #[must_use]
    pub fn find(&self, probe: &T) -> Option<NodeIndex> {
        let lb = self.lower_bound(probe);
        if lb != self.end() && self.cmp.compare(probe, self.pool.value(lb)) == Ordering::Equal {
            Some(lb)
        } else {
            None
        }
    }

    /// Whether an element equal to `probe` is stored.
    #[must_use]
    pub fn contains(&self, probe: &T) -> bool {
        self.find(probe).is_some()
    }

    /// Number of elements equal to `probe`.
    #[must_use]
    pub fn count(&self, probe: &T) -> u32 {
        let (mut lo, hi) = self.equal_range(probe);
        let mut n = 0;
        while lo != hi {
            n += 1;
            lo = self.successor(lo);
        }
        n
    }

    /// First position whose element is not less than `probe`; `end()` if
    /// no such element exists.
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

    /// First position whose element is greater than `probe`; `end()` if
    /// no such element exists.
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
    /// `(lower_bound, upper_bound)`.
    #[must_use]
    pub fn equal_range(&self, probe: &T) -> (NodeIndex, NodeIndex) {
        (self.lower_bound(probe), self.upper_bound(probe))
    }

    // ------------------------------------------------------------------
    // Inserts
    // ------------------------------------------------------------------

    /// Insert rejecting duplicates.
    ///
    /// Returns the position and `true` on insertion, or the position of
    /// the already-stored equal element and `false` (the tree is left
    /// unmodified). Fails only when the arena is full.
    pub fn insert_unique(&mut self, value: T) -> Result<(NodeIndex, bool)> {
        if let Some(existing) = self.descend_unique(&value) {
            return Ok((existing, false));
        }
        let (parent, as_left) = self.attach_point(&value);
        let idx = self.allocate(value)?;
        self.link_node(idx, parent, as_left);
        Ok((idx, true))
    }

    /// Insert keeping duplicates.
    ///
    /// Equal elements descend rightward, so a new duplicate always lands
    /// after every structurally-prior equal element.
    pub fn insert_equal(&mut self, value: T) -> Result<NodeIndex> {
        let (parent, as_left) = self.attach_point(&value);
        let idx = self.allocate(value)?;
        self.link_node(idx, parent, as_left);
        Ok(idx)
    }

    /// [`OrdTree::insert_unique`] with a position hint.
    ///
    /// When the hint's neighbors strictly bracket the value the new node
    /// is spliced in O(1); any other hint falls back to the full descent.
    /// The resulting tree is always identical to the unhinted insert.
    pub fn insert_unique_hint(&mut self, hint: NodeIndex, value: T) -> Result<(NodeIndex, bool)> {
        if let Some((parent, as_left)) = self.hint_position(hint, &value, true) {
            let idx = self.allocate(value)?;
            self.link_node(idx, parent, as_left);
            return Ok((idx, true));
        }
        self.insert_unique(value)
    }

    /// [`OrdTree::insert_equal`] with a position hint.
    pub fn insert_equal_hint(&mut self, hint: NodeIndex, value: T) -> Result<NodeIndex> {
        if let Some((parent, as_left)) = self.hint_position(hint, &value, false) {
            let idx = self.allocate(value)?;
            self.link_node(idx, parent, as_left);
            return Ok(idx);
        }
        self.insert_equal(value)
    }

    /// Insert a batch, rejecting duplicates. Inserts as many as fit in
    /// call order and returns the number actually inserted; capacity
    /// exhaustion is reported with an advisory log instead of an error.
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

    /// Insert a batch, keeping duplicates. Same capacity behavior as
    /// [`OrdTree::insert_many_unique`].
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

    /// Erase the element at a position, returning the successor position.
    ///
    /// `end()`, out-of-range and free positions are rejected without
    /// mutating anything.
    pub fn erase_at(&mut self, idx: NodeIndex) -> Result<NodeIndex> {
        self.check_erasable(idx)?;
        let next = self.successor(idx);
        self.unlink_node(idx);
        self.pool.release(idx);
        Ok(next)
    }

    /// Erase every element equal to `probe`, returning how many were
    /// removed.
    pub fn erase(&mut self, probe: &T) -> u32 {
        let (lo, hi) = self.equal_range(probe);
        let mut cur = lo;
        let mut erased = 0;
        while cur != hi {
            let next = self.successor(cur);
            self.unlink_node(cur);
            self.pool.release(cur);
            erased += 1;
            cur = next;
        }
        erased
    }

    /// Remove every element. O(n): destroys each payload once, then
    /// re-runs the same slot formatting as creation.
    pub fn clear(&mut self) {
        self.pool.drop_payloads();
        self.pool.format_slots();
        self.pool.header_mut().mark_ready();
        tracing::debug!(segment = %self.segment_id(), "cleared engine");
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

    fn check_erasable(&self, idx: NodeIndex) -> Result<()> {
        if !self.pool.in_bounds(idx) {
            return Err(GroveError::InvalidPosition {
                index: idx,
                cause: "index is out of range for this engine".to_string(),
            });
        }
        if idx == self.end() {
            return Err(GroveError::InvalidPosition {
                index: idx,
                cause: "cannot erase the end position".to_string(),
            });
        }
        if !self.pool.links(idx).in_use() {
            return Err(GroveError::InvalidPosition {
                index: idx,
                cause: "slot is free".to_string(),
            });
        }
        Ok(())
    }

    fn allocate(&mut self, value: T) -> Result<NodeIndex> {
        self.pool
            .allocate(value)
            .ok_or(GroveError::CapacityExhausted {
                capacity: self.pool.capacity(),
            })
    }

    /// Smallest index in the subtree rooted at `idx`.
    pub(super) fn subtree_min(&self, mut idx: NodeIndex) -> NodeIndex {
        while !self.pool.links(idx).left.is_invalid() {
            idx = self.pool.links(idx).left;
        }
        idx
    }

    /// Largest index in the subtree rooted at `idx`.
    pub(super) fn subtree_max(&self, mut idx: NodeIndex) -> NodeIndex {
        while !self.pool.links(idx).right.is_invalid() {
            idx = self.pool.links(idx).right;
        }
        idx
    }

    /// In-order successor; `end()` past the maximum.
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

    /// In-order predecessor; `end()` before the minimum.
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

    /// Full descent to an attach point, ties descending rightward so a
    /// duplicate lands after every prior equal element. The unique path
    /// only gets here after ruling out an equal element.
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

    /// Try to turn a hint into an O(1) attach point.
    ///
    /// Splices only when the hint's neighbors bracket the value tightly
    /// enough that the attach point provably equals the full descent's:
    /// `prev < v < hint` for unique inserts, `prev <= v < hint` for equal
    /// inserts (and the mirrored end-of-tree cases). Anything else
    /// returns `None` and the caller falls back.
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
            // Hint is the minimum and the value sorts before it.
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
        // Between prev and hint: exactly one of the two attach points is
        // open, and it is the one the full descent would reach.
        if self.pool.links(hint).left.is_invalid() {
            Some((hint, true))
        } else {
            Some((prev, false))
        }
    }

    /// Attach a freshly allocated node below `parent` and rebalance.
    pub(super) fn link_node(&mut self, idx: NodeIndex, parent: NodeIndex, as_left: bool) {
        let end = self.end();
        self.pool.links_mut(idx).parent = parent;

        if parent == end {
            // First element: root, minimum and maximum all at once.
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

    /// Detach `idx` from the tree, rebalancing as needed. The slot is
    /// left for the caller to release; its payload is never copied or
    /// moved: a two-child victim is replaced by relinking its in-order
    /// successor into the victim's structural position.
    pub(super) fn unlink_node(&mut self, z: NodeIndex) {
        let end = self.end();

        // Min/max cache maintenance, decided while the tree is intact.
        let new_min = (self.pool.links(end).left == z).then(|| self.successor(z));
        let new_max = (self.pool.links(end).right == z).then(|| self.predecessor(z));

        let z_left = self.pool.links(z).left;
        let z_right = self.pool.links(z).right;

        let removed_black;
        let x;
        let x_parent;

        if z_left.is_invalid() || z_right.is_invalid() {
            // At most one child replaces z directly.
            let child = if z_left.is_invalid() { z_right } else { z_left };
            removed_black = self.node_color_is_black(z);
            x = child;
            x_parent = self.pool.links(z).parent;
            self.transplant(z, child);
        } else {
            // Two children: relink the successor y into z's position.
            let y = self.subtree_min(z_right);
            removed_black = self.node_color_is_black(y);
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

    fn node_color_is_black(&self, idx: NodeIndex) -> bool {
        self.pool.links(idx).color() == crate::types::Color::Black
    }

    /// Replace the subtree rooted at `u` with the one rooted at `v`
    /// (which may be absent) in u's parent.
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
