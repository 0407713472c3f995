//! One-shot drawing without retention.
//!
//! Convenience entry points for data that is drawn once and thrown
//! away: the same format parsing and validation as the retained path,
//! but the submitted call borrows the caller's data directly instead of
//! packing it into managed buffers.

use crate::convert::{self, AttributeData};
use crate::error::{GraphicsError, Result};
use crate::format::FormatSpec;
use crate::primitive::DrawMode;
use crate::sink::{AttributeBinding, BufferId, DrawCall, DrawSink, IndexBinding};

/// Draw `vertex_count` vertices once.
pub fn draw(
    vertex_count: u32,
    mode: DrawMode,
    attributes: &[(&str, AttributeData<'_>)],
    sink: &mut dyn DrawSink,
) -> Result<()> {
    submit(vertex_count, mode, attributes, None, sink)
}

/// Draw indexed vertices once.
pub fn draw_indexed(
    vertex_count: u32,
    mode: DrawMode,
    indices: &[u32],
    attributes: &[(&str, AttributeData<'_>)],
    sink: &mut dyn DrawSink,
) -> Result<()> {
    submit(vertex_count, mode, attributes, Some(indices), sink)
}

fn submit(
    vertex_count: u32,
    mode: DrawMode,
    attributes: &[(&str, AttributeData<'_>)],
    indices: Option<&[u32]>,
    sink: &mut dyn DrawSink,
) -> Result<()> {
    let mut bindings = Vec::with_capacity(attributes.len());
    for (descriptor, data) in attributes {
        let spec = FormatSpec::parse(descriptor)?;
        convert::check_bulk(&spec, vertex_count, data)?;
        let bytes = data.as_bytes();
        bindings.push(AttributeBinding {
            spec,
            buffer: BufferId::Transient,
            byte_range: 0..bytes.len(),
            bytes,
        });
    }

    let indices = indices
        .map(|indices| {
            for &index in indices {
                if index >= vertex_count {
                    return Err(GraphicsError::OutOfRange {
                        offset: index as usize,
                        len: 1,
                        capacity: vertex_count as usize,
                    });
                }
            }
            let bytes: &[u8] = bytemuck::cast_slice(indices);
            Ok(IndexBinding {
                buffer: BufferId::Transient,
                byte_range: 0..bytes.len(),
                count: indices.len() as u32,
                bytes,
            })
        })
        .transpose()?;

    sink.submit(&DrawCall {
        mode,
        first_vertex: 0,
        vertex_count,
        attributes: bindings,
        indices,
    });
    Ok(())
}
