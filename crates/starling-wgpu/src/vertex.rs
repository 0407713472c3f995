//! Attribute format to `wgpu` vertex format mapping.
//!
//! Each attribute lives in its own buffer, so one format maps to one
//! single-attribute vertex buffer layout with offset 0.

use starling_graphics::{AttributeKind, ComponentType, DrawMode, FormatSpec};

use crate::error::{BackendError, Result};

/// Map a draw mode to its pipeline topology.
pub fn topology(mode: DrawMode) -> wgpu::PrimitiveTopology {
    match mode {
        DrawMode::Points => wgpu::PrimitiveTopology::PointList,
        DrawMode::Lines => wgpu::PrimitiveTopology::LineList,
        DrawMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        DrawMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        DrawMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

/// Whether an integer attribute is exposed to shaders as a normalized
/// float. Colors, normals and texture coordinates are; positions and
/// generic slots keep their integer values.
fn normalized(kind: AttributeKind) -> bool {
    matches!(
        kind,
        AttributeKind::Color
            | AttributeKind::SecondaryColor
            | AttributeKind::Normal
            | AttributeKind::TexCoord
            | AttributeKind::FogCoord
    )
}

/// Map a parsed attribute format to a `wgpu::VertexFormat`.
///
/// 8- and 16-bit types have no 3-component vertex format; pad those
/// attributes to 4 components. `f64` attributes are behind an optional
/// device feature and are not mapped.
pub fn vertex_format(spec: &FormatSpec) -> Result<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;

    let unmappable = |reason| BackendError::UnmappableFormat { spec: *spec, reason };
    let norm = normalized(spec.kind);

    let format = match (spec.component, spec.count) {
        (ComponentType::I8, 1) => if norm { F::Snorm8 } else { F::Sint8 },
        (ComponentType::I8, 2) => if norm { F::Snorm8x2 } else { F::Sint8x2 },
        (ComponentType::I8, 4) => if norm { F::Snorm8x4 } else { F::Sint8x4 },
        (ComponentType::U8, 1) => if norm { F::Unorm8 } else { F::Uint8 },
        (ComponentType::U8, 2) => if norm { F::Unorm8x2 } else { F::Uint8x2 },
        (ComponentType::U8, 4) => if norm { F::Unorm8x4 } else { F::Uint8x4 },
        (ComponentType::I16, 1) => if norm { F::Snorm16 } else { F::Sint16 },
        (ComponentType::I16, 2) => if norm { F::Snorm16x2 } else { F::Sint16x2 },
        (ComponentType::I16, 4) => if norm { F::Snorm16x4 } else { F::Sint16x4 },
        (ComponentType::U16, 1) => if norm { F::Unorm16 } else { F::Uint16 },
        (ComponentType::U16, 2) => if norm { F::Unorm16x2 } else { F::Uint16x2 },
        (ComponentType::U16, 4) => if norm { F::Unorm16x4 } else { F::Uint16x4 },
        (ComponentType::I8 | ComponentType::U8 | ComponentType::I16 | ComponentType::U16, _) => {
            return Err(unmappable("8/16-bit attributes need 1, 2 or 4 components"));
        }
        (ComponentType::I32, 1) => F::Sint32,
        (ComponentType::I32, 2) => F::Sint32x2,
        (ComponentType::I32, 3) => F::Sint32x3,
        (ComponentType::I32, 4) => F::Sint32x4,
        (ComponentType::U32, 1) => F::Uint32,
        (ComponentType::U32, 2) => F::Uint32x2,
        (ComponentType::U32, 3) => F::Uint32x3,
        (ComponentType::U32, 4) => F::Uint32x4,
        (ComponentType::F32, 1) => F::Float32,
        (ComponentType::F32, 2) => F::Float32x2,
        (ComponentType::F32, 3) => F::Float32x3,
        (ComponentType::F32, 4) => F::Float32x4,
        (ComponentType::F64, _) => {
            return Err(unmappable("f64 attributes need a 64-bit vertex device feature"));
        }
        (_, _) => return Err(unmappable("component count out of range")),
    };

    Ok(format)
}

/// Build the single vertex attribute for a format at a shader location.
pub fn vertex_attribute(spec: &FormatSpec, shader_location: u32) -> Result<wgpu::VertexAttribute> {
    Ok(wgpu::VertexAttribute {
        format: vertex_format(spec)?,
        offset: 0,
        shader_location,
    })
}
