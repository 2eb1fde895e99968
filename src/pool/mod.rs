//! Typed slot arena and O(1) free-list allocator.
//!
//! A [`NodePool`] interprets a [`Segment`] as a header plus a fixed array
//! of `capacity + 1` node slots. Slot `capacity` is the permanent
//! sentinel: it is never allocated, never freed, and serves the tree
//! engines as root anchor, `end()` position and min/max cache.
//!
//! Free slots are threaded into a singly linked chain through their own
//! `right` link, rooted at the header's `free_start`. Allocation pops the
//! chain head and constructs the payload in place; release destroys the
//! payload and pushes the slot back. Slot identity (its index) is stable
//! for the whole lifetime of an element, which is what keeps positions
//! valid across unrelated insertions and erasures.

use crate::error::{GroveError, Result};
use crate::segment::{Segment, SegmentHeader, HEADER_SIZE};
use crate::types::{Color, NodeIndex, Persist, SegmentId};
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

/// Structural link fields common to every node shape.
///
/// `#[repr(C)]` with index and byte fields only, so any byte image found
/// in a re-attached segment is a representable value.
#[derive(Debug)]
#[repr(C)]
pub(crate) struct Links {
    /// Parent index, or `INVALID` at the root's parent anchor.
    pub parent: NodeIndex,
    /// Left child index, or `INVALID`.
    pub left: NodeIndex,
    /// Right child index, or `INVALID`. Doubles as the "next free" link
    /// while the slot sits on the free chain.
    pub right: NodeIndex,
    /// This slot's own index; lets link surgery answer "am I my parent's
    /// left or right child" and gives resume a cheap placement check.
    pub own: NodeIndex,
    color: u8,
    in_use: u8,
    _pad: [u8; 2],
}

impl Links {
    /// Node color.
    pub fn color(&self) -> Color {
        Color::from_raw(self.color)
    }

    /// Set the node color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color.as_raw();
    }

    /// Whether the slot holds a live element (or is the sentinel).
    pub fn in_use(&self) -> bool {
        self.in_use != 0
    }

    /// Mark the slot live or free.
    pub fn set_in_use(&mut self, in_use: bool) {
        self.in_use = u8::from(in_use);
    }
}

/// A fixed-size slot shape usable by [`NodePool`].
pub(crate) trait PoolNode {
    /// The stored element type.
    type Elem;

    /// Structural links.
    fn links(&self) -> &Links;
    /// Structural links, mutable.
    fn links_mut(&mut self) -> &mut Links;
    /// Pointer to the (possibly uninitialized) payload.
    fn elem_ptr(&self) -> *const Self::Elem;
    /// Mutable pointer to the (possibly uninitialized) payload.
    fn elem_mut_ptr(&mut self) -> *mut Self::Elem;
    /// Reset any links beyond [`Links`] (e.g. order-list threading).
    fn reset_aux(&mut self);
}

/// Typed view of a segment as a slot arena.
#[derive(Debug)]
pub(crate) struct NodePool<N: PoolNode> {
    segment: Segment,
    header: NonNull<SegmentHeader>,
    slots: NonNull<N>,
    capacity: u32,
    _marker: PhantomData<N>,
}

// The pool owns its mapping; raw pointers are interior to it.
unsafe impl<N: PoolNode> Send for NodePool<N> where N::Elem: Send {}

impl<N: PoolNode> NodePool<N> {
    /// Byte offset of the slot array inside the segment.
    fn slots_offset() -> usize {
        let align = mem::align_of::<N>();
        (HEADER_SIZE + align - 1) & !(align - 1)
    }

    /// Total segment size required for `capacity` elements.
    pub fn segment_bytes(capacity: u32) -> usize {
        Self::slots_offset() + (capacity as usize + 1) * mem::size_of::<N>()
    }

    fn check_geometry(segment: &Segment, capacity: u32) -> Result<()> {
        if capacity == 0 || capacity >= u32::MAX - 1 {
            return Err(GroveError::SegmentGeometry {
                expected: "1 <= capacity < u32::MAX - 1".to_string(),
                found: format!("capacity={}", capacity),
            });
        }
        if mem::align_of::<N>() > 4096 {
            return Err(GroveError::SegmentGeometry {
                expected: "node alignment <= 4096".to_string(),
                found: format!("node_align={}", mem::align_of::<N>()),
            });
        }
        let required = Self::segment_bytes(capacity);
        if segment.len() < required {
            return Err(GroveError::SegmentGeometry {
                expected: format!("segment >= {} bytes", required),
                found: format!("segment = {} bytes", segment.len()),
            });
        }
        Ok(())
    }

    fn derive(mut segment: Segment, capacity: u32) -> Self {
        let base = segment.as_mut_ptr();
        // Both pointers stay valid for the pool's lifetime: the mapping's
        // address is fixed until `segment` is dropped, and the pool owns it.
        let header = unsafe { NonNull::new_unchecked(base.cast::<SegmentHeader>()) };
        let slots = unsafe { NonNull::new_unchecked(base.add(Self::slots_offset()).cast::<N>()) };
        Self {
            segment,
            header,
            slots,
            capacity,
            _marker: PhantomData,
        }
    }

    /// Format a brand-new segment and attach to it.
    pub fn create(segment: Segment, capacity: u32) -> Result<Self> {
        Self::check_geometry(&segment, capacity)?;

        let mut pool = Self::derive(segment, capacity);
        pool.header_mut().format(
            SegmentId::new(),
            mem::size_of::<N>() as u32,
            mem::align_of::<N>() as u32,
            capacity,
        );
        pool.format_slots();
        pool.header_mut().mark_ready();

        tracing::info!(
            segment = %pool.header().segment_id(),
            capacity,
            bytes = pool.segment.len(),
            "formatted segment"
        );
        Ok(pool)
    }

    /// Attach to an already-populated segment after a restart.
    ///
    /// Performs no structural changes: it validates the header, checks
    /// that the recorded node geometry matches this instantiation, then
    /// makes a single pass over the slot array to re-establish every live
    /// payload via [`Persist::resume`] and cross-check the live count.
    pub fn resume(mut segment: Segment) -> Result<Self>
    where
        N::Elem: Persist,
    {
        if segment.len() < HEADER_SIZE {
            return Err(GroveError::SegmentGeometry {
                expected: format!("segment >= {} bytes", HEADER_SIZE),
                found: format!("segment = {} bytes", segment.len()),
            });
        }

        let header = unsafe { &*segment.as_mut_ptr().cast::<SegmentHeader>() };
        header
            .validate()
            .map_err(|cause| GroveError::SegmentCorruption { cause })?;
        if !header.geometry_matches(mem::size_of::<N>() as u32, mem::align_of::<N>() as u32) {
            return Err(GroveError::SegmentGeometry {
                expected: format!(
                    "node_size={} node_align={}",
                    mem::size_of::<N>(),
                    mem::align_of::<N>()
                ),
                found: header.geometry(),
            });
        }

        let capacity = header.capacity();
        Self::check_geometry(&segment, capacity)?;
        let mut pool = Self::derive(segment, capacity);

        let sentinel = pool.sentinel();
        {
            let links = pool.links(sentinel);
            if !links.in_use() || links.own != sentinel {
                return Err(GroveError::SegmentCorruption {
                    cause: "sentinel slot is damaged".to_string(),
                });
            }
        }

        let mut live = 0u32;
        for i in 0..capacity {
            let idx = NodeIndex::new(i);
            if !pool.links(idx).in_use() {
                continue;
            }
            if pool.links(idx).own != idx {
                return Err(GroveError::SegmentCorruption {
                    cause: format!("slot {} carries self index {}", idx, pool.links(idx).own),
                });
            }
            live += 1;
            // The byte image is trusted; only state that cannot survive a
            // bare remap gets re-established.
            unsafe { (*pool.node_mut(idx).elem_mut_ptr()).resume() };
        }
        if live != pool.header().size() {
            return Err(GroveError::SegmentCorruption {
                cause: format!(
                    "header records {} elements but {} slots are live",
                    pool.header().size(),
                    live
                ),
            });
        }

        tracing::info!(
            segment = %pool.header().segment_id(),
            capacity,
            size = live,
            "resumed segment"
        );
        Ok(pool)
    }

    /// Rebuild the free list over all element slots and reset the
    /// sentinel. Used by creation and by `clear()`; any payloads must
    /// already have been destroyed.
    pub fn format_slots(&mut self) {
        let capacity = self.capacity;
        for i in 0..capacity {
            let idx = NodeIndex::new(i);
            let next = if i + 1 < capacity {
                NodeIndex::new(i + 1)
            } else {
                NodeIndex::INVALID
            };
            let node = self.node_mut(idx);
            node.reset_aux();
            let links = node.links_mut();
            links.parent = NodeIndex::INVALID;
            links.left = NodeIndex::INVALID;
            links.right = next;
            links.own = idx;
            links.set_color(Color::Black);
            links.set_in_use(false);
        }

        let sentinel = self.sentinel();
        {
            let node = self.node_mut(sentinel);
            node.reset_aux();
            let links = node.links_mut();
            links.parent = NodeIndex::INVALID;
            links.left = sentinel;
            links.right = sentinel;
            links.own = sentinel;
            links.set_color(Color::Black);
            links.set_in_use(true);
        }

        let free_start = if capacity > 0 {
            NodeIndex::new(0)
        } else {
            NodeIndex::INVALID
        };
        let header = self.header_mut();
        header.set_free_start(free_start);
        header.set_size(0);
        header.set_list_head(NodeIndex::INVALID);
        header.set_list_tail(NodeIndex::INVALID);
    }

    /// The sentinel slot index (`capacity`).
    pub fn sentinel(&self) -> NodeIndex {
        NodeIndex::new(self.capacity)
    }

    /// Fixed element capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of live elements.
    pub fn len(&self) -> u32 {
        self.header().size()
    }

    /// Whether no element slot is in use.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every element slot is in use.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// The segment header.
    pub fn header(&self) -> &SegmentHeader {
        unsafe { self.header.as_ref() }
    }

    /// The segment header, mutable.
    pub fn header_mut(&mut self) -> &mut SegmentHeader {
        unsafe { self.header.as_mut() }
    }

    /// The underlying segment.
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Whether `idx` addresses a slot (element or sentinel).
    pub fn in_bounds(&self, idx: NodeIndex) -> bool {
        idx.as_u32() <= self.capacity
    }

    /// Borrow a slot.
    pub fn node(&self, idx: NodeIndex) -> &N {
        debug_assert!(self.in_bounds(idx), "index {idx} out of bounds");
        unsafe { &*self.slots.as_ptr().add(idx.as_usize()) }
    }

    /// Borrow a slot mutably.
    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut N {
        debug_assert!(self.in_bounds(idx), "index {idx} out of bounds");
        unsafe { &mut *self.slots.as_ptr().add(idx.as_usize()) }
    }

    /// Borrow a slot's links.
    pub fn links(&self, idx: NodeIndex) -> &Links {
        self.node(idx).links()
    }

    /// Borrow a slot's links mutably.
    pub fn links_mut(&mut self, idx: NodeIndex) -> &mut Links {
        self.node_mut(idx).links_mut()
    }

    /// Borrow a live element.
    pub fn value(&self, idx: NodeIndex) -> &N::Elem {
        debug_assert!(self.links(idx).in_use(), "slot {idx} is not live");
        debug_assert!(idx != self.sentinel(), "sentinel holds no element");
        unsafe { &*self.node(idx).elem_ptr() }
    }

    /// Borrow a live element mutably.
    pub fn value_mut(&mut self, idx: NodeIndex) -> &mut N::Elem {
        debug_assert!(self.links(idx).in_use(), "slot {idx} is not live");
        debug_assert!(idx != self.sentinel(), "sentinel holds no element");
        unsafe { &mut *self.node_mut(idx).elem_mut_ptr() }
    }

    /// Pop the free chain and construct `elem` in place.
    ///
    /// Returns `None` when every element slot is in use. The new node
    /// comes back red with all structural links reset to `INVALID`.
    pub fn allocate(&mut self, elem: N::Elem) -> Option<NodeIndex> {
        let idx = self.header().free_start();
        if idx.is_invalid() {
            return None;
        }

        let next_free = self.links(idx).right;
        self.header_mut().set_free_start(next_free);

        let node = self.node_mut(idx);
        unsafe { ptr::write(node.elem_mut_ptr(), elem) };
        node.reset_aux();
        let links = node.links_mut();
        links.parent = NodeIndex::INVALID;
        links.left = NodeIndex::INVALID;
        links.right = NodeIndex::INVALID;
        links.set_color(Color::Red);
        links.set_in_use(true);

        let size = self.header().size() + 1;
        self.header_mut().set_size(size);
        tracing::trace!(index = %idx, size, "allocated slot");
        Some(idx)
    }

    /// Destroy a live element and push its slot onto the free chain.
    pub fn release(&mut self, idx: NodeIndex) {
        debug_assert!(idx != self.sentinel(), "cannot release the sentinel");
        debug_assert!(self.links(idx).in_use(), "slot {idx} is not live");

        unsafe { ptr::drop_in_place(self.node_mut(idx).elem_mut_ptr()) };

        let free_start = self.header().free_start();
        let links = self.links_mut(idx);
        links.parent = NodeIndex::INVALID;
        links.left = NodeIndex::INVALID;
        links.right = free_start;
        links.set_in_use(false);
        self.header_mut().set_free_start(idx);

        let size = self.header().size() - 1;
        self.header_mut().set_size(size);
        tracing::trace!(index = %idx, size, "released slot");
    }

    /// Destroy every live payload without touching header or link state.
    /// Used by teardown paths before a re-format or drop.
    pub fn drop_payloads(&mut self) {
        for i in 0..self.capacity {
            let idx = NodeIndex::new(i);
            if self.links(idx).in_use() {
                unsafe { ptr::drop_in_place(self.node_mut(idx).elem_mut_ptr()) };
            }
        }
    }

    /// Walk the free chain and count its length. Diagnostics only; the
    /// walk is bounded by `capacity + 1` so a cyclic chain cannot hang it.
    pub fn free_chain_len(&self) -> u32 {
        let mut count = 0u32;
        let mut idx = self.header().free_start();
        while !idx.is_invalid() && count <= self.capacity {
            count += 1;
            idx = self.links(idx).right;
        }
        count
    }
}

impl<N: PoolNode> Drop for NodePool<N> {
    fn drop(&mut self) {
        // Payloads are destroyed in this process, but header and link
        // state stay untouched: a file-backed segment must remain
        // resumable, and persistable element types drop trivially.
        self.drop_payloads();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::MaybeUninit;

    #[derive(Debug)]
    #[repr(C)]
    struct TestNode {
        links: Links,
        value: MaybeUninit<u64>,
    }

    impl PoolNode for TestNode {
        type Elem = u64;

        fn links(&self) -> &Links {
            &self.links
        }
        fn links_mut(&mut self) -> &mut Links {
            &mut self.links
        }
        fn elem_ptr(&self) -> *const u64 {
            self.value.as_ptr()
        }
        fn elem_mut_ptr(&mut self) -> *mut u64 {
            self.value.as_mut_ptr()
        }
        fn reset_aux(&mut self) {}
    }

    fn pool(capacity: u32) -> NodePool<TestNode> {
        let bytes = NodePool::<TestNode>::segment_bytes(capacity);
        NodePool::create(Segment::anonymous(bytes).unwrap(), capacity).unwrap()
    }

    #[test]
    fn fresh_pool_state() {
        let pool = pool(4);
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.len(), 0);
        assert!(pool.is_empty());
        assert!(!pool.is_full());
        assert_eq!(pool.free_chain_len(), 4);
        assert_eq!(pool.sentinel(), NodeIndex::new(4));
        assert!(pool.links(pool.sentinel()).in_use());
    }

    #[test]
    fn allocate_release_cycle() {
        let mut pool = pool(2);

        let a = pool.allocate(10).unwrap();
        let b = pool.allocate(20).unwrap();
        assert!(pool.is_full());
        assert!(pool.allocate(30).is_none());
        assert_eq!(*pool.value(a), 10);
        assert_eq!(*pool.value(b), 20);
        assert_eq!(pool.free_chain_len(), 0);

        pool.release(a);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.free_chain_len(), 1);

        // The released slot is reused.
        let c = pool.allocate(30).unwrap();
        assert_eq!(c, a);
        assert_eq!(*pool.value(c), 30);
    }

    #[test]
    fn allocate_resets_links() {
        let mut pool = pool(3);
        let idx = pool.allocate(5).unwrap();
        let links = pool.links(idx);
        assert!(links.parent.is_invalid());
        assert!(links.left.is_invalid());
        assert!(links.right.is_invalid());
        assert_eq!(links.color(), Color::Red);
        assert!(links.in_use());
        assert_eq!(links.own, idx);
    }

    #[test]
    fn free_chain_tracks_size() {
        let mut pool = pool(8);
        let mut held = Vec::new();
        for i in 0..5 {
            held.push(pool.allocate(i).unwrap());
        }
        assert_eq!(pool.free_chain_len(), pool.capacity() - pool.len());
        pool.release(held[1]);
        pool.release(held[3]);
        assert_eq!(pool.free_chain_len(), pool.capacity() - pool.len());
    }

    #[test]
    fn undersized_segment_rejected() {
        let bytes = NodePool::<TestNode>::segment_bytes(16) - 1;
        let err = NodePool::<TestNode>::create(Segment::anonymous(bytes).unwrap(), 16).unwrap_err();
        assert_eq!(err.code(), "E003");
    }

    #[test]
    fn resume_roundtrip() {
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let path = dir.path().join("pool.seg");
        let bytes = NodePool::<TestNode>::segment_bytes(4);

        let (a, b);
        {
            let mut pool: NodePool<TestNode> =
                NodePool::create(Segment::create(&path, bytes).unwrap(), 4).unwrap();
            a = pool.allocate(11).unwrap();
            b = pool.allocate(22).unwrap();
            pool.segment().flush().unwrap();
        }

        let pool: NodePool<TestNode> = NodePool::resume(Segment::open(&path).unwrap()).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(*pool.value(a), 11);
        assert_eq!(*pool.value(b), 22);
        assert_eq!(pool.free_chain_len(), 2);
    }

    #[test]
    fn resume_rejects_unformatted() {
        let bytes = NodePool::<TestNode>::segment_bytes(4);
        let err = NodePool::<TestNode>::resume(Segment::anonymous(bytes).unwrap()).unwrap_err();
        assert_eq!(err.code(), "E004");
    }

    #[test]
    fn resume_rejects_geometry_mismatch() {
        use tempfile::tempdir;

        #[derive(Debug)]
        #[repr(C)]
        struct WideNode {
            links: Links,
            value: MaybeUninit<[u64; 4]>,
        }
        impl PoolNode for WideNode {
            type Elem = [u64; 4];
            fn links(&self) -> &Links {
                &self.links
            }
            fn links_mut(&mut self) -> &mut Links {
                &mut self.links
            }
            fn elem_ptr(&self) -> *const [u64; 4] {
                self.value.as_ptr()
            }
            fn elem_mut_ptr(&mut self) -> *mut [u64; 4] {
                self.value.as_mut_ptr()
            }
            fn reset_aux(&mut self) {}
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("pool.seg");
        let bytes = NodePool::<TestNode>::segment_bytes(4);
        {
            let pool: NodePool<TestNode> =
                NodePool::create(Segment::create(&path, bytes).unwrap(), 4).unwrap();
            pool.segment().flush().unwrap();
        }

        let err = NodePool::<WideNode>::resume(Segment::open(&path).unwrap()).unwrap_err();
        assert_eq!(err.code(), "E003");
    }
}
