//! Primitive records and public handles.

use starling_core::alloc::handle_map::Handle;

use crate::buffer::Slot;
use crate::format::{AttributeKind, FormatSpec};
use crate::state::StateKey;

/// Primitive topology of a drawable unit.
///
/// Matches the topologies every graphics API exposes; the wgpu backend
/// maps these 1:1 onto `wgpu::PrimitiveTopology`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// One drawable unit retained inside a state group.
///
/// The draw mode, vertex count and owning group are fixed at creation;
/// only attribute contents (and index contents, within the fixed count)
/// mutate afterwards. To change a primitive's state, remove and re-add it.
#[derive(Debug)]
pub(crate) struct Primitive {
    pub mode: DrawMode,
    pub vertex_count: u32,
    /// The primitive's element run in the group's shared region; every
    /// attribute occupies this same run in its own buffer.
    pub vertex_slot: Slot,
    /// The attribute formats, in the caller's declaration order.
    pub attributes: Vec<FormatSpec>,
    /// Index slot, present for indexed primitives.
    pub index_slot: Option<Slot>,
    pub index_count: u32,
}

impl Primitive {
    pub fn attribute(&self, kind: AttributeKind) -> Option<&FormatSpec> {
        self.attributes.iter().find(|spec| spec.kind == kind)
    }
}

/// Public handle to a retained primitive.
///
/// Copyable and cheap; all operations on the primitive go through the
/// owning [`Batch`](crate::batch::Batch). Handles to removed primitives
/// are detectably stale and surface
/// [`InvalidHandle`](crate::error::GraphicsError::InvalidHandle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveHandle {
    pub(crate) group: StateKey,
    pub(crate) handle: Handle,
}
