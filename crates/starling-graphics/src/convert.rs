//! Typed attribute data and binary conversion.
//!
//! Applications hand attribute values to the engine as typed scalar
//! slices wrapped in [`AttributeData`]; conversion to the buffer's binary
//! layout is a `bytemuck` cast. The engine stores attributes
//! non-interleaved: each attribute of a state group lives in its own
//! buffer, so a slot's bytes are one contiguous run.
//!
//! Validation always runs before any buffer is touched, so a rejected
//! write leaves every buffer unchanged.

use glam::{Vec2, Vec3, Vec4};

use crate::error::{GraphicsError, Result};
use crate::format::{ComponentType, FormatSpec};

/// A scalar type attribute data can be supplied or read back as.
pub trait Scalar: bytemuck::Pod {
    /// The descriptor component type this scalar corresponds to.
    const TYPE: ComponentType;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const TYPE: ComponentType = ComponentType::$variant;
            }
        )*
    };
}

impl_scalar! {
    i8 => I8, u8 => U8, i16 => I16, u16 => U16,
    i32 => I32, u32 => U32, f32 => F32, f64 => F64,
}

/// A borrowed, typed run of attribute scalars.
#[derive(Debug, Clone, Copy)]
pub enum AttributeData<'a> {
    I8(&'a [i8]),
    U8(&'a [u8]),
    I16(&'a [i16]),
    U16(&'a [u16]),
    I32(&'a [i32]),
    U32(&'a [u32]),
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl AttributeData<'_> {
    /// The scalar type of this data.
    pub fn component_type(&self) -> ComponentType {
        match self {
            AttributeData::I8(_) => ComponentType::I8,
            AttributeData::U8(_) => ComponentType::U8,
            AttributeData::I16(_) => ComponentType::I16,
            AttributeData::U16(_) => ComponentType::U16,
            AttributeData::I32(_) => ComponentType::I32,
            AttributeData::U32(_) => ComponentType::U32,
            AttributeData::F32(_) => ComponentType::F32,
            AttributeData::F64(_) => ComponentType::F64,
        }
    }

    /// Number of scalars in the run.
    pub fn scalar_len(&self) -> usize {
        match self {
            AttributeData::I8(s) => s.len(),
            AttributeData::U8(s) => s.len(),
            AttributeData::I16(s) => s.len(),
            AttributeData::U16(s) => s.len(),
            AttributeData::I32(s) => s.len(),
            AttributeData::U32(s) => s.len(),
            AttributeData::F32(s) => s.len(),
            AttributeData::F64(s) => s.len(),
        }
    }

    /// The raw little-endian bytes the graphics API expects.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AttributeData::I8(s) => bytemuck::cast_slice(s),
            AttributeData::U8(s) => s,
            AttributeData::I16(s) => bytemuck::cast_slice(s),
            AttributeData::U16(s) => bytemuck::cast_slice(s),
            AttributeData::I32(s) => bytemuck::cast_slice(s),
            AttributeData::U32(s) => bytemuck::cast_slice(s),
            AttributeData::F32(s) => bytemuck::cast_slice(s),
            AttributeData::F64(s) => bytemuck::cast_slice(s),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a [$ty]> for AttributeData<'a> {
                fn from(slice: &'a [$ty]) -> Self {
                    AttributeData::$variant(slice)
                }
            }

            impl<'a, const N: usize> From<&'a [$ty; N]> for AttributeData<'a> {
                fn from(array: &'a [$ty; N]) -> Self {
                    AttributeData::$variant(array.as_slice())
                }
            }
        )*
    };
}

impl_from_scalar! {
    i8 => I8, u8 => U8, i16 => I16, u16 => U16,
    i32 => I32, u32 => U32, f32 => F32, f64 => F64,
}

impl<'a> From<&'a [Vec2]> for AttributeData<'a> {
    fn from(slice: &'a [Vec2]) -> Self {
        AttributeData::F32(bytemuck::cast_slice(slice))
    }
}

impl<'a> From<&'a [Vec3]> for AttributeData<'a> {
    fn from(slice: &'a [Vec3]) -> Self {
        AttributeData::F32(bytemuck::cast_slice(slice))
    }
}

impl<'a> From<&'a [Vec4]> for AttributeData<'a> {
    fn from(slice: &'a [Vec4]) -> Self {
        AttributeData::F32(bytemuck::cast_slice(slice))
    }
}

/// Validate a full-slot write: scalar type and total length must match
/// `vertex_count` vertices of `spec`.
pub fn check_bulk(spec: &FormatSpec, vertex_count: u32, data: &AttributeData) -> Result<()> {
    check_type(spec, data)?;
    let expected = vertex_count as usize * spec.count as usize;
    let actual = data.scalar_len();
    if actual != expected {
        return Err(GraphicsError::LengthMismatch { expected, actual });
    }
    Ok(())
}

/// Validate a single-element write: exactly one vertex's worth of scalars
/// at an element index inside the slot.
pub fn check_element(
    spec: &FormatSpec,
    vertex_count: u32,
    element: u32,
    data: &AttributeData,
) -> Result<()> {
    check_type(spec, data)?;
    let expected = spec.count as usize;
    let actual = data.scalar_len();
    if actual != expected {
        return Err(GraphicsError::LengthMismatch { expected, actual });
    }
    if element >= vertex_count {
        return Err(GraphicsError::OutOfRange {
            offset: element as usize,
            len: 1,
            capacity: vertex_count as usize,
        });
    }
    Ok(())
}

fn check_type(spec: &FormatSpec, data: &AttributeData) -> Result<()> {
    let actual = data.component_type();
    if actual != spec.component {
        return Err(GraphicsError::TypeMismatch {
            expected: spec.component,
            actual,
        });
    }
    Ok(())
}
