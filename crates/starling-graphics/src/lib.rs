//! Starling Graphics
//!
//! A retained-mode vertex batching engine: applications describe many
//! independently mutable primitives with compact attribute format
//! descriptors, and the batch packs their data into shared buffers,
//! groups them by render state, and emits one state-change/draw-call
//! pair per group.
//!
//! The crate is backend-agnostic: draws leave through the [`DrawSink`]
//! trait, and `starling-wgpu` provides the GPU side.

pub mod batch;
pub mod buffer;
pub mod convert;
pub mod error;
pub mod format;
pub mod group;
pub mod immediate;
pub mod primitive;
pub mod sink;
pub mod state;

pub use batch::Batch;
pub use buffer::{AttributeBuffer, AttributeStorage, DirtyRanges, RegionAllocator, Slot};
pub use convert::{AttributeData, Scalar};
pub use error::{GraphicsError, Result};
pub use format::{AttributeKind, ComponentType, FormatSpec, UsageHint};
pub use group::StateGroup;
pub use primitive::{DrawMode, PrimitiveHandle};
pub use sink::{
    AttributeBinding, BufferChannel, BufferId, DrawCall, DrawSink, DrawStats, IndexBinding,
};
pub use state::{RenderState, StateKey};
