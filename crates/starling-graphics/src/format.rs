//! Attribute format descriptors.
//!
//! A format descriptor is a compact string naming one vertex attribute:
//! a tag (what the attribute means), a component count, a component type
//! code, and an optional usage hint:
//!
//! ```text
//! v2f         2-component f32 position
//! c3B         3-component u8 color
//! t2f         2-component f32 texture coordinate
//! n3f/static  3-component f32 normal, rarely rewritten
//! 0g4f        4-component f32 generic attribute slot 0
//! ```
//!
//! Parsing is pure and deterministic: the same descriptor always yields
//! an equal [`FormatSpec`], and invalid descriptors are rejected up front
//! with [`GraphicsError::UnknownFormat`].

use std::str::FromStr;

use crate::error::{GraphicsError, Result};

/// Scalar type of a single attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::I32 | ComponentType::U32 | ComponentType::F32 => 4,
            ComponentType::F64 => 8,
        }
    }

    /// The single-character code used in format descriptors.
    pub fn code(&self) -> char {
        match self {
            ComponentType::I8 => 'b',
            ComponentType::U8 => 'B',
            ComponentType::I16 => 's',
            ComponentType::U16 => 'S',
            ComponentType::I32 => 'i',
            ComponentType::U32 => 'I',
            ComponentType::F32 => 'f',
            ComponentType::F64 => 'd',
        }
    }

    fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'b' => ComponentType::I8,
            'B' => ComponentType::U8,
            's' => ComponentType::I16,
            'S' => ComponentType::U16,
            'i' => ComponentType::I32,
            'I' => ComponentType::U32,
            'f' => ComponentType::F32,
            'd' => ComponentType::F64,
            _ => return None,
        })
    }
}

/// Semantic role of a vertex attribute.
///
/// The named kinds cover the fixed-function roles; applications needing
/// their own attributes use one of the 16 [`AttributeKind::Generic`] slots
/// (`"<index>g"` in a descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Vertex position (`v`).
    Position,
    /// Vertex color (`c`).
    Color,
    /// Texture coordinate (`t`).
    TexCoord,
    /// Vertex normal (`n`).
    Normal,
    /// Edge flag (`e`).
    EdgeFlag,
    /// Fog coordinate (`f`).
    FogCoord,
    /// Secondary color (`s`).
    SecondaryColor,
    /// Application-defined attribute slot (`"<index>g"`, index 0..=15).
    Generic(u8),
}

impl AttributeKind {
    /// Human-readable attribute name for messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::Position => "position",
            AttributeKind::Color => "color",
            AttributeKind::TexCoord => "tex_coord",
            AttributeKind::Normal => "normal",
            AttributeKind::EdgeFlag => "edge_flag",
            AttributeKind::FogCoord => "fog_coord",
            AttributeKind::SecondaryColor => "secondary_color",
            AttributeKind::Generic(_) => "generic",
        }
    }

    fn from_tag(tag: char) -> Option<Self> {
        Some(match tag {
            'v' => AttributeKind::Position,
            'c' => AttributeKind::Color,
            't' => AttributeKind::TexCoord,
            'n' => AttributeKind::Normal,
            'e' => AttributeKind::EdgeFlag,
            'f' => AttributeKind::FogCoord,
            's' => AttributeKind::SecondaryColor,
            _ => return None,
        })
    }
}

/// How often the application intends to rewrite an attribute.
///
/// Purely a hint for the GPU backend's buffer usage; the batching engine
/// behaves identically for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UsageHint {
    /// Written once, drawn many times.
    Static,
    /// Occasionally rewritten between frames.
    #[default]
    Dynamic,
    /// Rewritten nearly every frame.
    Stream,
}

/// A parsed, validated attribute format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatSpec {
    /// Semantic role of the attribute.
    pub kind: AttributeKind,
    /// Components per vertex, 1..=4.
    pub count: u8,
    /// Scalar type of each component.
    pub component: ComponentType,
    /// Rewrite-frequency hint for GPU backends.
    pub usage: UsageHint,
}

impl FormatSpec {
    /// Size of one vertex's worth of this attribute, in bytes.
    pub fn stride_bytes(&self) -> usize {
        self.count as usize * self.component.size_bytes()
    }

    /// Parse a descriptor string such as `"v2f"` or `"c3B/stream"`.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let invalid = |reason: &'static str| GraphicsError::UnknownFormat {
            descriptor: descriptor.to_owned(),
            reason,
        };

        let (body, usage) = match descriptor.split_once('/') {
            Some((body, usage)) => {
                let usage = match usage {
                    "static" => UsageHint::Static,
                    "dynamic" => UsageHint::Dynamic,
                    "stream" => UsageHint::Stream,
                    _ => return Err(invalid("unknown usage hint")),
                };
                (body, usage)
            }
            None => (descriptor, UsageHint::default()),
        };

        let mut chars = body.chars();
        let first = chars.next().ok_or_else(|| invalid("empty descriptor"))?;

        let kind = if first.is_ascii_digit() {
            // Generic attribute: one or two index digits followed by 'g'.
            let mut index = first.to_digit(10).unwrap();
            let mut tag = chars.next().ok_or_else(|| invalid("truncated descriptor"))?;
            if tag.is_ascii_digit() {
                index = index * 10 + tag.to_digit(10).unwrap();
                tag = chars.next().ok_or_else(|| invalid("truncated descriptor"))?;
            }
            if tag != 'g' {
                return Err(invalid("unrecognized attribute tag"));
            }
            if index > 15 {
                return Err(invalid("generic attribute index out of range (0-15)"));
            }
            AttributeKind::Generic(index as u8)
        } else {
            AttributeKind::from_tag(first).ok_or_else(|| invalid("unrecognized attribute tag"))?
        };

        let count = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| invalid("missing component count"))?;
        if !(1..=4).contains(&count) {
            return Err(invalid("component count must be 1-4"));
        }

        let component = chars
            .next()
            .and_then(ComponentType::from_code)
            .ok_or_else(|| invalid("unknown component type code"))?;

        if chars.next().is_some() {
            return Err(invalid("trailing characters"));
        }

        Ok(FormatSpec {
            kind,
            count: count as u8,
            component,
            usage,
        })
    }
}

impl FromStr for FormatSpec {
    type Err = GraphicsError;

    fn from_str(s: &str) -> Result<Self> {
        FormatSpec::parse(s)
    }
}
