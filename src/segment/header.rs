//! In-place segment header.

use crate::types::{NodeIndex, SegmentId};

/// Magic number identifying grove segments.
pub const SEGMENT_MAGIC: u64 = 0x4752_4f56_4553_4547; // "GROVESEG"

/// Current segment format version.
pub const SEGMENT_VERSION: u32 = 1;

/// Fixed size of the segment header in bytes. The slot array starts at
/// this offset (rounded up to the node alignment).
pub const HEADER_SIZE: usize = 128;

/// Header state word: segment bytes have never been formatted.
pub const STATE_UNFORMATTED: u32 = 0;
/// Header state word: the segment holds a formatted engine.
pub const STATE_READY: u32 = 1;

/// Flags bit: the secondary order list applies recency reordering.
pub const FLAG_LRU: u32 = 1;

/// The fixed header at the start of every segment.
///
/// Unlike a file-format header this struct is never encoded or decoded:
/// it lives in place inside the mapping and the fields below *are* the
/// persistent representation. Everything the engine needs to wake up in a
/// re-attached segment (the free-list head, the element count, the order
/// list ends and the initialization state) is here; the tree root and the
/// min/max caches live in the sentinel slot.
#[derive(Debug)]
#[repr(C)]
pub struct SegmentHeader {
    /// Magic number for segment identification.
    magic: u64,
    /// Segment format version.
    version: u32,
    /// Behavior flags (`FLAG_*`).
    flags: u32,
    /// Identity stamped at creation time.
    segment_id: [u8; 16],
    /// Size in bytes of one node slot.
    node_size: u32,
    /// Alignment in bytes of one node slot.
    node_align: u32,
    /// Number of element slots (the sentinel slot is not counted).
    capacity: u32,
    /// Initialization state (`STATE_*`).
    state: u32,
    /// Head of the free-slot chain.
    free_start: u32,
    /// Number of live elements.
    size: u32,
    /// Head of the secondary order list.
    list_head: u32,
    /// Tail of the secondary order list.
    list_tail: u32,
    /// Reserved for future use.
    _reserved: [u8; 64],
}

const _: () = assert!(std::mem::size_of::<SegmentHeader>() == HEADER_SIZE);

impl SegmentHeader {
    /// Format this header in place for a brand-new segment.
    pub fn format(&mut self, segment_id: SegmentId, node_size: u32, node_align: u32, capacity: u32) {
        self.magic = SEGMENT_MAGIC;
        self.version = SEGMENT_VERSION;
        self.flags = 0;
        self.segment_id = segment_id.as_bytes();
        self.node_size = node_size;
        self.node_align = node_align;
        self.capacity = capacity;
        self.state = STATE_UNFORMATTED;
        self.free_start = NodeIndex::INVALID.as_u32();
        self.size = 0;
        self.list_head = NodeIndex::INVALID.as_u32();
        self.list_tail = NodeIndex::INVALID.as_u32();
        self._reserved = [0u8; 64];
    }

    /// Validate a header found in an existing segment.
    pub fn validate(&self) -> Result<(), String> {
        if self.magic != SEGMENT_MAGIC {
            return Err(format!("bad magic 0x{:016x}", self.magic));
        }
        if self.version != SEGMENT_VERSION {
            return Err(format!("unsupported segment version {}", self.version));
        }
        if self.state != STATE_READY {
            return Err(format!("segment was never formatted (state {})", self.state));
        }
        if self.size > self.capacity {
            return Err(format!(
                "size {} exceeds capacity {}",
                self.size, self.capacity
            ));
        }
        Ok(())
    }

    /// Describe the node geometry recorded in this header.
    pub fn geometry(&self) -> String {
        format!(
            "node_size={} node_align={} capacity={}",
            self.node_size, self.node_align, self.capacity
        )
    }

    /// Check the recorded node geometry against the attaching engine's.
    pub fn geometry_matches(&self, node_size: u32, node_align: u32) -> bool {
        self.node_size == node_size && self.node_align == node_align
    }

    /// The segment identity.
    pub fn segment_id(&self) -> SegmentId {
        SegmentId::from_bytes(self.segment_id)
    }

    /// The fixed element capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of live elements.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Set the live element count.
    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// Head of the free-slot chain.
    pub fn free_start(&self) -> NodeIndex {
        NodeIndex::new(self.free_start)
    }

    /// Set the head of the free-slot chain.
    pub fn set_free_start(&mut self, index: NodeIndex) {
        self.free_start = index.as_u32();
    }

    /// Head of the secondary order list.
    pub fn list_head(&self) -> NodeIndex {
        NodeIndex::new(self.list_head)
    }

    /// Set the head of the secondary order list.
    pub fn set_list_head(&mut self, index: NodeIndex) {
        self.list_head = index.as_u32();
    }

    /// Tail of the secondary order list.
    pub fn list_tail(&self) -> NodeIndex {
        NodeIndex::new(self.list_tail)
    }

    /// Set the tail of the secondary order list.
    pub fn set_list_tail(&mut self, index: NodeIndex) {
        self.list_tail = index.as_u32();
    }

    /// Whether recency reordering is enabled.
    pub fn lru_enabled(&self) -> bool {
        self.flags & FLAG_LRU != 0
    }

    /// Enable or disable recency reordering.
    pub fn set_lru_enabled(&mut self, enabled: bool) {
        if enabled {
            self.flags |= FLAG_LRU;
        } else {
            self.flags &= !FLAG_LRU;
        }
    }

    /// Mark the segment as holding a formatted engine.
    pub fn mark_ready(&mut self) {
        self.state = STATE_READY;
    }
}
