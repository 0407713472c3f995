//! State groups: the primitives sharing one render state, and the
//! buffers backing them.

use std::rc::Rc;

use starling_core::alloc::HashMap;
use starling_core::alloc::handle_map::{Handle, HandleMap};
use starling_core::profiling::profile_function;
use tracing::debug;

use crate::buffer::{AttributeBuffer, AttributeStorage, RegionAllocator, Slot};
use crate::convert::{self, AttributeData};
use crate::error::{GraphicsError, Result};
use crate::format::{AttributeKind, FormatSpec};
use crate::primitive::{DrawMode, Primitive};
use crate::sink::{AttributeBinding, BufferChannel, BufferId, DrawCall, DrawSink, IndexBinding};
use crate::state::{RenderState, StateKey};

/// Width of one index entry; indices are u32 throughout.
const INDEX_STRIDE: usize = std::mem::size_of::<u32>();

/// All primitives sharing one render state.
///
/// The group runs a single [`RegionAllocator`] across all of its vertex
/// attributes: each attribute format gets its own byte storage, but a
/// primitive occupies the same element run in every one of them. Index
/// data lives in a separate buffer with its own allocator, rebased to
/// absolute vertex offsets at write time.
pub struct StateGroup {
    key: StateKey,
    state: Option<Rc<dyn RenderState>>,
    allocator: RegionAllocator,
    buffers: HashMap<FormatSpec, AttributeStorage>,
    index_buffer: Option<AttributeBuffer>,
    primitives: HandleMap<Primitive>,
}

impl StateGroup {
    pub(crate) fn new(key: StateKey, state: Option<Rc<dyn RenderState>>) -> Self {
        debug!(?key, "creating state group");
        Self {
            key,
            state,
            allocator: RegionAllocator::new(),
            buffers: HashMap::new(),
            index_buffer: None,
            primitives: HandleMap::new(),
        }
    }

    pub fn key(&self) -> StateKey {
        self.key
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Capacity of the shared vertex region, in vertices.
    pub fn vertex_capacity(&self) -> u32 {
        self.allocator.capacity()
    }

    /// Live vertices across all primitives in the group.
    pub fn live_vertices(&self) -> u32 {
        self.allocator.live_elements()
    }

    /// Iterate the group's attribute buffers, for GPU mirroring.
    pub fn buffers(&self) -> impl Iterator<Item = (BufferChannel, &AttributeStorage)> {
        self.buffers
            .iter()
            .map(|(spec, storage)| (BufferChannel::Attribute(*spec), storage))
            .chain(
                self.index_buffer
                    .iter()
                    .map(|buf| (BufferChannel::Index, buf.storage())),
            )
    }

    /// Mutable buffer iteration, for draining dirty ranges after upload.
    pub fn buffers_mut(&mut self) -> impl Iterator<Item = (BufferChannel, &mut AttributeStorage)> {
        self.buffers
            .iter_mut()
            .map(|(spec, storage)| (BufferChannel::Attribute(*spec), storage))
            .chain(
                self.index_buffer
                    .iter_mut()
                    .map(|buf| (BufferChannel::Index, buf.storage_mut())),
            )
    }

    pub(crate) fn add(
        &mut self,
        mode: DrawMode,
        vertex_count: u32,
        attributes: &[(FormatSpec, AttributeData<'_>)],
        indices: Option<&[u32]>,
    ) -> Result<Handle> {
        profile_function!();
        // Validate everything up front; after the first buffer write
        // there is no failure path left.
        for (i, (spec, data)) in attributes.iter().enumerate() {
            if attributes[..i].iter().any(|(s, _)| s.kind == spec.kind) {
                return Err(GraphicsError::UnknownAttribute {
                    name: spec.kind.name(),
                });
            }
            convert::check_bulk(spec, vertex_count, data)?;
        }
        if let Some(indices) = indices {
            check_indices(indices, vertex_count)?;
        }

        let (slot, grown) = self.allocator.allocate(vertex_count)?;
        if let Some(capacity) = grown {
            for storage in self.buffers.values_mut() {
                storage.ensure_capacity(capacity);
            }
        }

        let index_slot = match indices {
            Some(indices) => {
                let index_buffer = self
                    .index_buffer
                    .get_or_insert_with(|| AttributeBuffer::new(INDEX_STRIDE));
                match index_buffer.allocate(indices.len() as u32) {
                    Ok(index_slot) => Some(index_slot),
                    Err(e) => {
                        // Roll back the vertex allocation; the add must
                        // leave the group unchanged on failure.
                        self.allocator.free(slot);
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let capacity = self.allocator.capacity();
        for (spec, data) in attributes {
            let storage = self.buffers.entry(*spec).or_insert_with(|| {
                let mut storage = AttributeStorage::new(spec.stride_bytes());
                storage.ensure_capacity(capacity);
                storage
            });
            storage.ensure_capacity(capacity);
            storage.write(slot, data.as_bytes())?;
        }

        if let (Some(indices), Some(index_slot)) = (indices, index_slot) {
            let rebased: Vec<u32> = indices.iter().map(|&i| i + slot.offset).collect();
            self.index_buffer
                .as_mut()
                .unwrap()
                .write(index_slot, bytemuck::cast_slice(&rebased))?;
        }

        Ok(self.primitives.insert(Primitive {
            mode,
            vertex_count,
            vertex_slot: slot,
            attributes: attributes.iter().map(|(spec, _)| *spec).collect(),
            index_slot,
            index_count: indices.map_or(0, |i| i.len() as u32),
        }))
    }

    pub(crate) fn remove(&mut self, handle: Handle) -> Result<()> {
        profile_function!();
        let primitive = self
            .primitives
            .remove(handle)
            .ok_or(GraphicsError::InvalidHandle)?;

        self.allocator.free(primitive.vertex_slot);
        if let (Some(index_slot), Some(index_buffer)) =
            (primitive.index_slot, self.index_buffer.as_mut())
        {
            index_buffer.free(index_slot);
        }
        Ok(())
    }

    pub(crate) fn set_attribute(
        &mut self,
        handle: Handle,
        kind: AttributeKind,
        data: &AttributeData<'_>,
    ) -> Result<()> {
        let (spec, slot, vertex_count) = self.lookup(handle, kind)?;
        convert::check_bulk(&spec, vertex_count, data)?;
        self.buffers
            .get_mut(&spec)
            .ok_or(GraphicsError::UnknownAttribute { name: kind.name() })?
            .write(slot, data.as_bytes())
    }

    pub(crate) fn set_attribute_element(
        &mut self,
        handle: Handle,
        kind: AttributeKind,
        element: u32,
        data: &AttributeData<'_>,
    ) -> Result<()> {
        let (spec, slot, vertex_count) = self.lookup(handle, kind)?;
        convert::check_element(&spec, vertex_count, element, data)?;
        self.buffers
            .get_mut(&spec)
            .ok_or(GraphicsError::UnknownAttribute { name: kind.name() })?
            .write_element(slot, element, data.as_bytes())
    }

    pub(crate) fn read_attribute(&self, handle: Handle, kind: AttributeKind) -> Result<&[u8]> {
        let (spec, slot, _) = self.lookup(handle, kind)?;
        self.buffers
            .get(&spec)
            .ok_or(GraphicsError::UnknownAttribute { name: kind.name() })?
            .read(slot)
    }

    pub(crate) fn attribute_spec(&self, handle: Handle, kind: AttributeKind) -> Result<FormatSpec> {
        Ok(self.lookup(handle, kind)?.0)
    }

    /// Rewrite a primitive's index list in place. The count is fixed at
    /// creation; only the values may change.
    pub(crate) fn set_indices(&mut self, handle: Handle, indices: &[u32]) -> Result<()> {
        let primitive = self
            .primitives
            .get(handle)
            .ok_or(GraphicsError::InvalidHandle)?;
        let index_slot = primitive.index_slot.ok_or(GraphicsError::UnknownAttribute {
            name: "index",
        })?;
        if indices.len() != primitive.index_count as usize {
            return Err(GraphicsError::LengthMismatch {
                expected: primitive.index_count as usize,
                actual: indices.len(),
            });
        }
        check_indices(indices, primitive.vertex_count)?;

        let base = primitive.vertex_slot.offset;
        let rebased: Vec<u32> = indices.iter().map(|&i| i + base).collect();
        self.index_buffer
            .as_mut()
            .ok_or(GraphicsError::UnknownAttribute { name: "index" })?
            .write(index_slot, bytemuck::cast_slice(&rebased))
    }

    /// Read a primitive's indices back, in primitive-local form.
    pub(crate) fn read_indices(&self, handle: Handle) -> Result<Vec<u32>> {
        let primitive = self
            .primitives
            .get(handle)
            .ok_or(GraphicsError::InvalidHandle)?;
        let index_slot = primitive.index_slot.ok_or(GraphicsError::UnknownAttribute {
            name: "index",
        })?;
        let base = primitive.vertex_slot.offset;
        let bytes = self
            .index_buffer
            .as_ref()
            .ok_or(GraphicsError::UnknownAttribute { name: "index" })?
            .read(index_slot)?;
        Ok(bytemuck::cast_slice::<u8, u32>(bytes)
            .iter()
            .map(|&i| i - base)
            .collect())
    }

    /// Activate the state, submit one draw call per primitive, then
    /// deactivate. Empty groups do nothing, hooks included.
    ///
    /// Returns the number of draw calls submitted.
    pub fn draw(&self, sink: &mut dyn DrawSink) -> u32 {
        profile_function!();
        if self.primitives.is_empty() {
            return 0;
        }

        if let Some(state) = &self.state {
            state.activate();
        }

        let mut submitted = 0;
        for primitive in self.primitives.values() {
            sink.submit(&self.draw_call(primitive));
            submitted += 1;
        }

        if let Some(state) = &self.state {
            state.deactivate();
        }
        submitted
    }

    /// Whether this group has hooks to invoke around its draw calls.
    pub fn has_state(&self) -> bool {
        self.state.is_some()
    }

    fn draw_call<'a>(&'a self, primitive: &'a Primitive) -> DrawCall<'a> {
        let slot = primitive.vertex_slot;
        let attributes = primitive
            .attributes
            .iter()
            .map(|spec| {
                let storage = &self.buffers[spec];
                // The slot was written through this storage; the range
                // cannot be out of bounds.
                let byte_range = storage.slot_bytes(slot).unwrap_or(0..0);
                AttributeBinding {
                    spec: *spec,
                    buffer: BufferId::Retained {
                        group: self.key,
                        channel: BufferChannel::Attribute(*spec),
                    },
                    bytes: &storage.bytes()[byte_range.clone()],
                    byte_range,
                }
            })
            .collect();

        let indices = primitive.index_slot.map(|index_slot| {
            let storage = self.index_buffer.as_ref().unwrap().storage();
            let byte_range = storage.slot_bytes(index_slot).unwrap_or(0..0);
            IndexBinding {
                buffer: BufferId::Retained {
                    group: self.key,
                    channel: BufferChannel::Index,
                },
                count: primitive.index_count,
                bytes: &storage.bytes()[byte_range.clone()],
                byte_range,
            }
        });

        DrawCall {
            mode: primitive.mode,
            first_vertex: slot.offset,
            vertex_count: primitive.vertex_count,
            attributes,
            indices,
        }
    }

    fn lookup(&self, handle: Handle, kind: AttributeKind) -> Result<(FormatSpec, Slot, u32)> {
        let primitive = self
            .primitives
            .get(handle)
            .ok_or(GraphicsError::InvalidHandle)?;
        let spec = primitive
            .attribute(kind)
            .ok_or(GraphicsError::UnknownAttribute { name: kind.name() })?;
        Ok((*spec, primitive.vertex_slot, primitive.vertex_count))
    }
}

fn check_indices(indices: &[u32], vertex_count: u32) -> Result<()> {
    for &index in indices {
        if index >= vertex_count {
            return Err(GraphicsError::OutOfRange {
                offset: index as usize,
                len: 1,
                capacity: vertex_count as usize,
            });
        }
    }
    Ok(())
}
