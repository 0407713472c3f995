//! The retained-mode batch.
//!
//! A [`Batch`] accepts independently mutable primitives, groups them by
//! render state, packs their vertex data into shared buffers, and emits
//! the minimum number of state-change/draw-call pairs needed to render
//! everything. Applications add, mutate and remove primitives freely
//! between frames; one [`draw`](Batch::draw) covers every live primitive
//! exactly once.
//!
//! # Example
//!
//! ```ignore
//! use starling_graphics::*;
//!
//! let mut batch = Batch::new();
//! let tri = batch.add(
//!     3,
//!     DrawMode::Triangles,
//!     None,
//!     &[
//!         ("v2f", (&[0.0f32, 0.0, 1.0, 0.0, 0.5, 1.0][..]).into()),
//!         ("c3B", (&[255u8, 0, 0, 0, 255, 0, 0, 0, 255][..]).into()),
//!     ],
//! )?;
//!
//! // Mutate one vertex's position in place
//! batch.set_attribute_element(tri, AttributeKind::Position, 1, &(&[2.0f32, 0.0][..]).into())?;
//!
//! // Each frame
//! batch.draw(&mut sink);
//! # Ok::<(), starling_graphics::GraphicsError>(())
//! ```
//!
//! # Ordering
//!
//! Draw order across state groups is unspecified and may change between
//! calls; within a group every primitive is covered exactly once. The
//! engine performs no state-change minimization beyond the grouping
//! itself.

use std::rc::Rc;

use starling_core::alloc::HashMap;
use starling_core::profiling::profile_function;
use tracing::debug;

use crate::convert::{AttributeData, Scalar};
use crate::error::{GraphicsError, Result};
use crate::format::{AttributeKind, FormatSpec};
use crate::group::StateGroup;
use crate::primitive::{DrawMode, PrimitiveHandle};
use crate::sink::{DrawSink, DrawStats};
use crate::state::{RenderState, StateKey};

/// The top-level retained-mode container.
pub struct Batch {
    groups: HashMap<StateKey, StateGroup>,
}

impl Batch {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }

    /// Add a primitive.
    ///
    /// `attributes` pairs format descriptors (`"v2f"`, `"c3B"`, ...)
    /// with matching typed data for `vertex_count` vertices. Grouping is
    /// by allocation identity of `state`: value-equal states in distinct
    /// allocations form distinct groups, and `None` groups under a
    /// shared no-op state. A primitive's mode, vertex count and state
    /// are fixed; remove and re-add to change them.
    ///
    /// On error, no buffer is modified.
    pub fn add(
        &mut self,
        vertex_count: u32,
        mode: DrawMode,
        state: Option<Rc<dyn RenderState>>,
        attributes: &[(&str, AttributeData<'_>)],
    ) -> Result<PrimitiveHandle> {
        self.add_inner(vertex_count, mode, state, attributes, None)
    }

    /// Add an indexed primitive.
    ///
    /// Indices are primitive-local (`0..vertex_count`); the engine
    /// rebases them into the group's shared buffer. The index count is
    /// fixed at creation.
    pub fn add_indexed(
        &mut self,
        vertex_count: u32,
        mode: DrawMode,
        indices: &[u32],
        state: Option<Rc<dyn RenderState>>,
        attributes: &[(&str, AttributeData<'_>)],
    ) -> Result<PrimitiveHandle> {
        self.add_inner(vertex_count, mode, state, attributes, Some(indices))
    }

    fn add_inner(
        &mut self,
        vertex_count: u32,
        mode: DrawMode,
        state: Option<Rc<dyn RenderState>>,
        attributes: &[(&str, AttributeData<'_>)],
        indices: Option<&[u32]>,
    ) -> Result<PrimitiveHandle> {
        profile_function!();
        let mut parsed = Vec::with_capacity(attributes.len());
        for (descriptor, data) in attributes {
            parsed.push((FormatSpec::parse(descriptor)?, *data));
        }

        let key = state.as_ref().map_or(StateKey::NULL, StateKey::of);
        let group = self
            .groups
            .entry(key)
            .or_insert_with(|| StateGroup::new(key, state));

        match group.add(mode, vertex_count, &parsed, indices) {
            Ok(handle) => Ok(PrimitiveHandle { group: key, handle }),
            Err(e) => {
                // Don't keep a group a rejected add just created
                if self.groups.get(&key).is_some_and(StateGroup::is_empty) {
                    self.groups.remove(&key);
                }
                Err(e)
            }
        }
    }

    /// Remove a primitive, returning its buffer space to the free lists.
    ///
    /// The group survives its last primitive (cheap re-adds with the
    /// same state); [`prune_empty_groups`](Batch::prune_empty_groups)
    /// reclaims empty groups explicitly.
    pub fn remove(&mut self, handle: PrimitiveHandle) -> Result<()> {
        self.group_mut(handle.group)?.remove(handle.handle)
    }

    /// Overwrite a primitive's whole attribute.
    pub fn set_attribute(
        &mut self,
        handle: PrimitiveHandle,
        kind: AttributeKind,
        data: &AttributeData<'_>,
    ) -> Result<()> {
        self.group_mut(handle.group)?
            .set_attribute(handle.handle, kind, data)
    }

    /// Overwrite one vertex's worth of one attribute, in place.
    pub fn set_attribute_element(
        &mut self,
        handle: PrimitiveHandle,
        kind: AttributeKind,
        element: u32,
        data: &AttributeData<'_>,
    ) -> Result<()> {
        self.group_mut(handle.group)?
            .set_attribute_element(handle.handle, kind, element, data)
    }

    /// Rewrite a primitive's indices in place (fixed count).
    pub fn set_indices(&mut self, handle: PrimitiveHandle, indices: &[u32]) -> Result<()> {
        self.group_mut(handle.group)?
            .set_indices(handle.handle, indices)
    }

    /// Read an attribute back as typed scalars.
    pub fn attribute<T: Scalar>(
        &self,
        handle: PrimitiveHandle,
        kind: AttributeKind,
    ) -> Result<Vec<T>> {
        let group = self.group(handle.group)?;
        let spec = group.attribute_spec(handle.handle, kind)?;
        if spec.component != T::TYPE {
            return Err(GraphicsError::TypeMismatch {
                expected: spec.component,
                actual: T::TYPE,
            });
        }
        let bytes = group.read_attribute(handle.handle, kind)?;
        Ok(bytemuck::cast_slice(bytes).to_vec())
    }

    /// Read an attribute back as raw bytes.
    pub fn attribute_bytes(&self, handle: PrimitiveHandle, kind: AttributeKind) -> Result<&[u8]> {
        self.group(handle.group)?.read_attribute(handle.handle, kind)
    }

    /// Read a primitive's indices back, in primitive-local form.
    pub fn indices(&self, handle: PrimitiveHandle) -> Result<Vec<u32>> {
        self.group(handle.group)?.read_indices(handle.handle)
    }

    /// Live primitives across all groups.
    pub fn primitive_count(&self) -> usize {
        self.groups.values().map(StateGroup::primitive_count).sum()
    }

    /// Groups currently held, empty ones included.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Drop groups whose last primitive has been removed, releasing
    /// their buffers.
    pub fn prune_empty_groups(&mut self) {
        self.groups.retain(|key, group| {
            if group.is_empty() {
                debug!(?key, "reclaiming empty state group");
                false
            } else {
                true
            }
        });
    }

    /// Iterate the state groups, for GPU mirroring.
    ///
    /// Iteration order is unspecified.
    pub fn groups(&self) -> impl Iterator<Item = &StateGroup> {
        self.groups.values()
    }

    /// Mutable group iteration, for draining dirty ranges after upload.
    pub fn groups_mut(&mut self) -> impl Iterator<Item = &mut StateGroup> {
        self.groups.values_mut()
    }

    /// Draw every live primitive exactly once.
    ///
    /// Iterates state groups in unspecified order; for each non-empty
    /// group, invokes `activate()`, submits one draw call per primitive
    /// to `sink`, then invokes `deactivate()`.
    pub fn draw(&self, sink: &mut dyn DrawSink) -> DrawStats {
        profile_function!();
        let mut stats = DrawStats::default();
        for group in self.groups.values() {
            stats.groups += 1;
            let submitted = group.draw(sink);
            stats.draw_calls += submitted;
            if submitted > 0 && group.has_state() {
                stats.state_changes += 1;
            }
        }
        stats
    }

    fn group(&self, key: StateKey) -> Result<&StateGroup> {
        self.groups.get(&key).ok_or(GraphicsError::InvalidHandle)
    }

    fn group_mut(&mut self, key: StateKey) -> Result<&mut StateGroup> {
        self.groups.get_mut(&key).ok_or(GraphicsError::InvalidHandle)
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}
