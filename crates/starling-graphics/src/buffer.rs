//! Slot sub-allocation inside shared attribute buffers.
//!
//! A [`RegionAllocator`] manages a contiguous element region as a pool of
//! variable-length runs ([`Slot`]s): allocation is deterministic first-fit
//! over a sorted free list, freed slots are coalesced with their
//! neighbors, and growth is geometric so repeated adds amortize to O(1).
//! Capacity never shrinks; fragmentation from add/remove churn is
//! accepted and mitigated by coalescing.
//!
//! A state group runs *one* allocator across all of its vertex
//! attributes, with one [`AttributeStorage`] byte array per attribute:
//! a primitive's position, color and texture-coordinate runs all share
//! the same element offset, so a single vertex range covers the whole
//! primitive in every buffer. [`AttributeBuffer`] pairs one allocator
//! with one storage for the standalone cases (index data, immediate
//! mode).
//!
//! Slots are offset/length pairs in element units, never raw pointers, so
//! every outstanding slot survives a growth reallocation unchanged.
//! Writes mark byte-granular [`DirtyRanges`] that a GPU backend drains to
//! upload only what actually changed.

use starling_core::profiling::profile_function;
use std::ops::Range;
use tracing::trace;

use crate::error::{GraphicsError, Result};

/// An allocated element run inside a shared buffer region.
///
/// Stable across buffer growth; invalidated only by freeing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// First element of the run.
    pub offset: u32,
    /// Number of elements in the run.
    pub len: u32,
}

impl Slot {
    /// The empty slot, used for zero-length allocations.
    pub const EMPTY: Slot = Slot { offset: 0, len: 0 };

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Sorted, non-overlapping byte ranges awaiting GPU upload.
///
/// Overlapping and adjacent ranges are merged on insert, keeping the list
/// short even under heavy per-element mutation.
#[derive(Debug, Clone, Default)]
pub struct DirtyRanges {
    ranges: Vec<Range<usize>>,
}

impl DirtyRanges {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Mark `start..end` (bytes) as dirty.
    pub fn mark(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }

        let mut i = self.ranges.partition_point(|r| r.start < start);
        // The preceding range may reach into the new one
        if i > 0 && self.ranges[i - 1].end >= start {
            i -= 1;
        }

        let mut merged = start..end;
        while i < self.ranges.len() && self.ranges[i].start <= merged.end {
            merged.start = merged.start.min(self.ranges[i].start);
            merged.end = merged.end.max(self.ranges[i].end);
            self.ranges.remove(i);
        }
        self.ranges.insert(i, merged);
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Range<usize>> {
        self.ranges.iter()
    }

    /// Total dirty bytes across all ranges.
    pub fn total_bytes(&self) -> usize {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }
}

/// First-fit free-list allocator over a growable element region.
pub struct RegionAllocator {
    /// Capacity in elements.
    capacity: u32,
    /// Hard capacity limit in elements.
    max_elements: u32,
    /// Free runs sorted by offset, coalesced (no two adjacent).
    free: Vec<Slot>,
    /// Sum of live slot lengths, in elements.
    live: u32,
}

impl RegionAllocator {
    /// Smallest capacity a growing region jumps to.
    const MIN_CAPACITY: u32 = 16;

    pub fn new() -> Self {
        Self::with_limit(u32::MAX)
    }

    /// Create an allocator that will refuse to grow past `max_elements`.
    pub fn with_limit(max_elements: u32) -> Self {
        Self {
            capacity: 0,
            max_elements,
            free: Vec::new(),
            live: 0,
        }
    }

    /// Current capacity in elements.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Sum of live slot lengths, in elements.
    pub fn live_elements(&self) -> u32 {
        self.live
    }

    /// Allocate a run of `len` elements.
    ///
    /// First-fit: the lowest-offset free run large enough is split from
    /// the front. When no run fits, capacity grows to at least double
    /// (exactly enough for the request if that is more); the returned
    /// capacity tells the caller to resize its backing storage. Offsets
    /// of previously issued slots never change.
    pub fn allocate(&mut self, len: u32) -> Result<(Slot, Option<u32>)> {
        profile_function!();
        if len == 0 {
            return Ok((Slot::EMPTY, None));
        }

        if let Some(slot) = self.take_first_fit(len) {
            self.live += len;
            return Ok((slot, None));
        }

        let new_capacity = self.grow_for(len)?;

        let slot = self
            .take_first_fit(len)
            .ok_or(GraphicsError::AllocationFailed {
                requested: self.capacity as usize + len as usize,
                limit: self.max_elements as usize,
            })?;
        self.live += len;
        Ok((slot, Some(new_capacity)))
    }

    /// Return a slot to the free list, coalescing with both neighbors.
    pub fn free(&mut self, slot: Slot) {
        profile_function!();
        if slot.is_empty() {
            return;
        }
        debug_assert!(slot.offset + slot.len <= self.capacity);

        self.live -= slot.len;
        self.insert_free(slot);
    }

    fn insert_free(&mut self, slot: Slot) {
        let i = self.free.partition_point(|f| f.offset < slot.offset);
        debug_assert!(i == 0 || self.free[i - 1].offset + self.free[i - 1].len <= slot.offset);
        debug_assert!(i == self.free.len() || slot.offset + slot.len <= self.free[i].offset);

        let merges_prev = i > 0 && self.free[i - 1].offset + self.free[i - 1].len == slot.offset;
        let merges_next = i < self.free.len() && slot.offset + slot.len == self.free[i].offset;

        match (merges_prev, merges_next) {
            (true, true) => {
                self.free[i - 1].len += slot.len + self.free[i].len;
                self.free.remove(i);
            }
            (true, false) => self.free[i - 1].len += slot.len,
            (false, true) => {
                self.free[i].offset = slot.offset;
                self.free[i].len += slot.len;
            }
            (false, false) => self.free.insert(i, slot),
        }
    }

    fn take_first_fit(&mut self, len: u32) -> Option<Slot> {
        for i in 0..self.free.len() {
            if self.free[i].len >= len {
                let slot = Slot {
                    offset: self.free[i].offset,
                    len,
                };
                if self.free[i].len == len {
                    self.free.remove(i);
                } else {
                    self.free[i].offset += len;
                    self.free[i].len -= len;
                }
                return Some(slot);
            }
        }
        None
    }

    fn grow_for(&mut self, len: u32) -> Result<u32> {
        // A free run ending exactly at capacity extends into the new
        // tail, so only the shortfall needs new capacity.
        let tail_free = match self.free.last() {
            Some(f) if f.offset + f.len == self.capacity => f.len,
            _ => 0,
        };
        let needed = self.capacity as u64 + len as u64 - tail_free as u64;
        if needed > self.max_elements as u64 {
            return Err(GraphicsError::AllocationFailed {
                requested: needed as usize,
                limit: self.max_elements as usize,
            });
        }

        let new_capacity = (self.capacity as u64 * 2)
            .max(needed)
            .max(Self::MIN_CAPACITY as u64)
            .min(self.max_elements as u64) as u32;

        trace!(old = self.capacity, new = new_capacity, "growing buffer region");

        let grown = Slot {
            offset: self.capacity,
            len: new_capacity - self.capacity,
        };
        self.capacity = new_capacity;
        self.insert_free(grown);
        Ok(new_capacity)
    }
}

impl Default for RegionAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A byte array backing one attribute of a shared region.
///
/// Element offsets come from the region's [`RegionAllocator`]; the
/// storage only scales them by its per-element stride and bounds-checks
/// every access.
pub struct AttributeStorage {
    stride: usize,
    bytes: Vec<u8>,
    dirty: DirtyRanges,
}

impl AttributeStorage {
    pub fn new(stride: usize) -> Self {
        debug_assert!(stride > 0);
        Self {
            stride,
            bytes: Vec::new(),
            dirty: DirtyRanges::new(),
        }
    }

    /// Bytes per element.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The full backing storage, for GPU mirroring.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn dirty(&self) -> &DirtyRanges {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Grow to hold `elements`; existing contents keep their offsets.
    pub fn ensure_capacity(&mut self, elements: u32) {
        let len = elements as usize * self.stride;
        if len > self.bytes.len() {
            self.bytes.resize(len, 0);
        }
    }

    /// Overwrite a whole slot. `data` must be exactly the slot's size.
    pub fn write(&mut self, slot: Slot, data: &[u8]) -> Result<()> {
        let range = self.slot_bytes(slot)?;
        if data.len() != range.end - range.start {
            return Err(GraphicsError::OutOfRange {
                offset: slot.offset as usize,
                len: data.len() / self.stride,
                capacity: slot.len as usize,
            });
        }
        self.bytes[range.clone()].copy_from_slice(data);
        self.dirty.mark(range.start, range.end);
        Ok(())
    }

    /// Overwrite one element of a slot. `data` must be one element.
    pub fn write_element(&mut self, slot: Slot, element: u32, data: &[u8]) -> Result<()> {
        if element >= slot.len || data.len() != self.stride {
            return Err(GraphicsError::OutOfRange {
                offset: element as usize,
                len: 1,
                capacity: slot.len as usize,
            });
        }
        let start = (slot.offset + element) as usize * self.stride;
        let end = start + self.stride;
        self.bytes[start..end].copy_from_slice(data);
        self.dirty.mark(start, end);
        Ok(())
    }

    /// Read a whole slot back.
    pub fn read(&self, slot: Slot) -> Result<&[u8]> {
        let range = self.slot_bytes(slot)?;
        Ok(&self.bytes[range])
    }

    /// Byte range covered by `slot`.
    pub fn slot_bytes(&self, slot: Slot) -> Result<Range<usize>> {
        let start = slot.offset as usize * self.stride;
        let end = start + slot.len as usize * self.stride;
        if end > self.bytes.len() {
            return Err(GraphicsError::OutOfRange {
                offset: slot.offset as usize,
                len: slot.len as usize,
                capacity: self.bytes.len() / self.stride,
            });
        }
        Ok(start..end)
    }
}

/// One allocator paired with one storage: a self-contained growable
/// buffer of fixed-size elements, used for index data and immediate-mode
/// scratch.
pub struct AttributeBuffer {
    allocator: RegionAllocator,
    storage: AttributeStorage,
}

impl AttributeBuffer {
    pub fn new(stride: usize) -> Self {
        Self::with_limit(stride, u32::MAX)
    }

    pub fn with_limit(stride: usize, max_elements: u32) -> Self {
        Self {
            allocator: RegionAllocator::with_limit(max_elements),
            storage: AttributeStorage::new(stride),
        }
    }

    pub fn allocate(&mut self, len: u32) -> Result<Slot> {
        let (slot, grown) = self.allocator.allocate(len)?;
        if let Some(new_capacity) = grown {
            self.storage.ensure_capacity(new_capacity);
        }
        Ok(slot)
    }

    pub fn free(&mut self, slot: Slot) {
        self.allocator.free(slot);
    }

    pub fn allocator(&self) -> &RegionAllocator {
        &self.allocator
    }

    pub fn storage(&self) -> &AttributeStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut AttributeStorage {
        &mut self.storage
    }

    pub fn write(&mut self, slot: Slot, data: &[u8]) -> Result<()> {
        self.storage.write(slot, data)
    }

    pub fn write_element(&mut self, slot: Slot, element: u32, data: &[u8]) -> Result<()> {
        self.storage.write_element(slot, element, data)
    }

    pub fn read(&self, slot: Slot) -> Result<&[u8]> {
        self.storage.read(slot)
    }
}
