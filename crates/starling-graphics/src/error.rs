//! Error types for the batching engine.

use std::fmt;

use crate::format::ComponentType;

/// Errors that can occur during batching operations.
///
/// All errors are raised synchronously at the offending call and never
/// leave a buffer partially written: validation runs before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// The format descriptor string could not be parsed.
    UnknownFormat {
        /// The descriptor that was rejected.
        descriptor: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// Supplied data length disagrees with the declared vertex/index count.
    LengthMismatch {
        /// Number of scalars the format requires.
        expected: usize,
        /// Number of scalars supplied.
        actual: usize,
    },

    /// Supplied data scalar type disagrees with the format's component type.
    TypeMismatch {
        /// Component type declared by the format descriptor.
        expected: ComponentType,
        /// Component type of the supplied data.
        actual: ComponentType,
    },

    /// Access outside an allocated slot or element range.
    OutOfRange {
        /// First element of the access.
        offset: usize,
        /// Number of elements accessed.
        len: usize,
        /// Number of elements actually available.
        capacity: usize,
    },

    /// Buffer growth could not satisfy an allocation.
    AllocationFailed {
        /// Capacity the allocation would have required, in elements.
        requested: usize,
        /// The buffer's configured capacity limit, in elements.
        limit: usize,
    },

    /// The primitive handle does not refer to a live primitive.
    InvalidHandle,

    /// The primitive has no attribute of the requested kind.
    UnknownAttribute {
        /// Human-readable attribute name.
        name: &'static str,
    },
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::UnknownFormat { descriptor, reason } => {
                write!(f, "Invalid format descriptor '{}': {}", descriptor, reason)
            }
            GraphicsError::LengthMismatch { expected, actual } => {
                write!(
                    f,
                    "Data length mismatch: expected {} scalars, got {}",
                    expected, actual
                )
            }
            GraphicsError::TypeMismatch { expected, actual } => {
                write!(
                    f,
                    "Data type mismatch: format declares {:?}, data is {:?}",
                    expected, actual
                )
            }
            GraphicsError::OutOfRange {
                offset,
                len,
                capacity,
            } => {
                write!(
                    f,
                    "Access out of range: [{}, {}) exceeds capacity {}",
                    offset,
                    offset + len,
                    capacity
                )
            }
            GraphicsError::AllocationFailed { requested, limit } => {
                write!(
                    f,
                    "Buffer allocation failed: {} elements requested, limit is {}",
                    requested, limit
                )
            }
            GraphicsError::InvalidHandle => {
                write!(f, "Primitive handle is stale or foreign to this batch")
            }
            GraphicsError::UnknownAttribute { name } => {
                write!(f, "Primitive has no '{}' attribute", name)
            }
        }
    }
}

impl std::error::Error for GraphicsError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphicsError>;
