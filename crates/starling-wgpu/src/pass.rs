//! Replaying submitted draw calls onto a render pass.

use starling_core::profiling::profile_function;
use starling_graphics::{BufferId, DrawCall, DrawSink};
use tracing::warn;

use crate::mirror::GpuMirror;

const ALIGN: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

/// A bump-allocated per-frame buffer for one-shot draw data.
///
/// Immediate-mode submissions carry their bytes in the draw call; the
/// stream writes them to a fixed region and hands back an offset. The
/// writes land on the queue before the encoder is submitted, so they
/// are visible to every draw of the frame. Reset once per frame.
pub struct TransientStream {
    buffer: wgpu::Buffer,
    size: u64,
    offset: u64,
}

impl TransientStream {
    pub fn new(device: &wgpu::Device, size: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Starling Transient Stream"),
            size,
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::INDEX
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            size,
            offset: 0,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Write `bytes` at the next aligned offset, or `None` when the
    /// frame's budget is spent.
    pub fn push(&mut self, queue: &wgpu::Queue, bytes: &[u8]) -> Option<u64> {
        let offset = self.offset.next_multiple_of(ALIGN);
        let len = (bytes.len() as u64).next_multiple_of(ALIGN);
        if offset + len > self.size {
            return None;
        }

        if bytes.len() as u64 == len {
            queue.write_buffer(&self.buffer, offset, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(len as usize, 0);
            queue.write_buffer(&self.buffer, offset, &padded);
        }

        self.offset = offset + len;
        Some(offset)
    }

    /// Start a new frame.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    pub fn remaining(&self) -> u64 {
        self.size - self.offset
    }
}

/// A [`DrawSink`] that replays draw calls onto a `wgpu` render pass.
///
/// Retained buffers are resolved through the [`GpuMirror`] (sync it
/// before encoding the pass); transient data goes through a
/// [`TransientStream`]. The caller binds a pipeline compatible with the
/// batch's attribute layout before drawing.
pub struct PassSink<'a, 'p> {
    pass: &'a mut wgpu::RenderPass<'p>,
    mirror: &'a GpuMirror,
    queue: &'a wgpu::Queue,
    transient: &'a mut TransientStream,
    draws: u32,
    skipped: u32,
}

impl<'a, 'p> PassSink<'a, 'p> {
    pub fn new(
        pass: &'a mut wgpu::RenderPass<'p>,
        mirror: &'a GpuMirror,
        queue: &'a wgpu::Queue,
        transient: &'a mut TransientStream,
    ) -> Self {
        Self {
            pass,
            mirror,
            queue,
            transient,
            draws: 0,
            skipped: 0,
        }
    }

    /// Draw calls replayed so far.
    pub fn draws(&self) -> u32 {
        self.draws
    }

    /// Draw calls dropped for missing mirrors or a full transient stream.
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    fn bind_vertex(&mut self, slot: u32, id: BufferId, bytes: &[u8]) -> bool {
        match id {
            BufferId::Retained { .. } => {
                let Some(buffer) = self.mirror.get(id) else {
                    warn!(?id, "no mirror for retained buffer, dropping draw");
                    return false;
                };
                self.pass.set_vertex_buffer(slot, buffer.slice(..));
                true
            }
            BufferId::Transient => {
                let Some(offset) = self.transient.push(self.queue, bytes) else {
                    warn!("transient stream exhausted, dropping draw");
                    return false;
                };
                let end = offset + bytes.len() as u64;
                self.pass
                    .set_vertex_buffer(slot, self.transient.buffer().slice(offset..end));
                true
            }
        }
    }
}

impl DrawSink for PassSink<'_, '_> {
    fn submit(&mut self, call: &DrawCall<'_>) {
        profile_function!();
        for (slot, binding) in call.attributes.iter().enumerate() {
            if !self.bind_vertex(slot as u32, binding.buffer, binding.bytes) {
                self.skipped += 1;
                return;
            }
        }

        match &call.indices {
            Some(indices) => {
                let slice = match indices.buffer {
                    BufferId::Retained { .. } => {
                        let Some(buffer) = self.mirror.get(indices.buffer) else {
                            warn!(id = ?indices.buffer, "no mirror for index buffer, dropping draw");
                            self.skipped += 1;
                            return;
                        };
                        let start = indices.byte_range.start as u64;
                        let end = indices.byte_range.end as u64;
                        buffer.slice(start..end)
                    }
                    BufferId::Transient => {
                        let Some(offset) = self.transient.push(self.queue, indices.bytes) else {
                            warn!("transient stream exhausted, dropping draw");
                            self.skipped += 1;
                            return;
                        };
                        let end = offset + indices.bytes.len() as u64;
                        self.transient.buffer().slice(offset..end)
                    }
                };
                self.pass.set_index_buffer(slice, wgpu::IndexFormat::Uint32);
                // Index values are already absolute within the group's
                // vertex buffers, so the base vertex stays 0.
                self.pass.draw_indexed(0..indices.count, 0, 0..1);
            }
            None => {
                let first = call.first_vertex;
                self.pass.draw(first..first + call.vertex_count, 0..1);
            }
        }
        self.draws += 1;
    }
}
