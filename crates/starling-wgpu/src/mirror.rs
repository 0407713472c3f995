//! GPU mirrors of the batch's CPU buffers.
//!
//! Each retained buffer of a batch gets one GPU buffer, keyed by its
//! [`BufferId`]. Syncing drains the dirty ranges the batch accumulated
//! since the last frame and uploads only those bytes; growth reallocates
//! the GPU buffer and re-uploads in full.

use starling_core::alloc::{HashMap, HashSet};
use starling_core::profiling::profile_function;
use starling_graphics::{Batch, BufferChannel, BufferId};
use tracing::trace;

const ALIGN: usize = wgpu::COPY_BUFFER_ALIGNMENT as usize;

/// One mirrored buffer and its current GPU capacity.
struct MirrorBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
}

/// Persistent GPU copies of every retained buffer in a batch.
#[derive(Default)]
pub struct GpuMirror {
    buffers: HashMap<BufferId, MirrorBuffer>,
}

impl GpuMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload everything that changed since the last sync.
    ///
    /// Needs `&mut Batch` to drain the dirty ranges; buffer contents are
    /// not modified. Mirrors of pruned groups are dropped.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, batch: &mut Batch) {
        profile_function!();
        let mut seen = HashSet::new();

        for group in batch.groups_mut() {
            let group_key = group.key();
            for (channel, storage) in group.buffers_mut() {
                let id = BufferId::Retained {
                    group: group_key,
                    channel,
                };
                seen.insert(id);

                let bytes = storage.bytes();
                if bytes.is_empty() {
                    continue;
                }

                let usage = wgpu::BufferUsages::COPY_DST
                    | match channel {
                        BufferChannel::Attribute(_) => wgpu::BufferUsages::VERTEX,
                        BufferChannel::Index => wgpu::BufferUsages::INDEX,
                    };

                let needed = bytes.len() as u64;
                let reallocated = match self.buffers.get(&id) {
                    Some(mirror) if mirror.capacity >= needed => false,
                    _ => {
                        let capacity = needed.next_power_of_two().max(256);
                        trace!(?id, capacity, "allocating mirror buffer");
                        self.buffers.insert(
                            id,
                            MirrorBuffer {
                                buffer: device.create_buffer(&wgpu::BufferDescriptor {
                                    label: Some("Starling Mirror Buffer"),
                                    size: capacity,
                                    usage,
                                    mapped_at_creation: false,
                                }),
                                capacity,
                            },
                        );
                        true
                    }
                };

                if let Some(mirror) = self.buffers.get(&id) {
                    if reallocated {
                        write_aligned(queue, &mirror.buffer, bytes, 0, bytes.len());
                    } else {
                        for range in storage.dirty().iter() {
                            write_aligned(queue, &mirror.buffer, bytes, range.start, range.end);
                        }
                    }
                }
                storage.clear_dirty();
            }
        }

        self.buffers.retain(|id, _| seen.contains(id));
    }

    /// Look up the GPU buffer mirroring `id`.
    pub fn get(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&id).map(|mirror| &mirror.buffer)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

/// Upload `bytes[start..end]`, widened to the copy alignment. The GPU
/// buffer is always allocated past the CPU length, so padding the tail
/// with zeros is safe.
fn write_aligned(queue: &wgpu::Queue, buffer: &wgpu::Buffer, bytes: &[u8], start: usize, end: usize) {
    let start = start - start % ALIGN;
    let end = end.div_ceil(ALIGN) * ALIGN;
    if end <= bytes.len() {
        queue.write_buffer(buffer, start as u64, &bytes[start..end]);
    } else {
        let mut padded = bytes[start..].to_vec();
        padded.resize(end - start, 0);
        queue.write_buffer(buffer, start as u64, &padded);
    }
}
