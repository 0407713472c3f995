//! The draw submission boundary.
//!
//! The batching engine never talks to a graphics API directly: state
//! groups describe each draw as a [`DrawCall`] and hand it to a
//! [`DrawSink`]. A backend binds the referenced buffers and issues the
//! actual call; tests record the calls and assert on them.

use std::ops::Range;

use crate::format::FormatSpec;
use crate::primitive::DrawMode;
use crate::state::StateKey;

/// Which logical buffer of a group a binding refers to.
///
/// Keyed by the full format, not just the attribute kind: a group may
/// back `v2f` and `v3f` primitives with separate buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferChannel {
    Attribute(FormatSpec),
    Index,
}

/// Stable identity of a source buffer across draw calls.
///
/// Retained buffers keep their identity for the lifetime of their state
/// group, letting a backend maintain a persistent GPU mirror per id.
/// Transient buffers exist only for the one call carrying them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferId {
    Retained {
        group: StateKey,
        channel: BufferChannel,
    },
    Transient,
}

/// One attribute's slice of a draw call.
#[derive(Debug, Clone)]
pub struct AttributeBinding<'a> {
    pub spec: FormatSpec,
    pub buffer: BufferId,
    /// The slot's byte range within the source buffer.
    pub byte_range: Range<usize>,
    /// The slot's current contents; backends without persistent mirrors
    /// can consume these directly.
    pub bytes: &'a [u8],
}

/// The index slice of an indexed draw call.
///
/// Indices are u32, already rebased to absolute vertex offsets within
/// the group's shared region.
#[derive(Debug, Clone)]
pub struct IndexBinding<'a> {
    pub buffer: BufferId,
    pub byte_range: Range<usize>,
    pub count: u32,
    pub bytes: &'a [u8],
}

/// Everything a backend needs to render one primitive.
#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub mode: DrawMode,
    /// Element offset of the primitive's run in the group's region; the
    /// same offset is valid in every attribute buffer of the group.
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub attributes: Vec<AttributeBinding<'a>>,
    pub indices: Option<IndexBinding<'a>>,
}

/// Receiver for draw submissions.
pub trait DrawSink {
    fn submit(&mut self, call: &DrawCall<'_>);
}

/// Counters for one [`Batch::draw`](crate::batch::Batch::draw) pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Groups visited, empty ones included.
    pub groups: u32,
    /// Activate/deactivate pairs invoked.
    pub state_changes: u32,
    /// Draw calls submitted.
    pub draw_calls: u32,
}
