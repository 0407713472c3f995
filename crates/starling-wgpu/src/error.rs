//! Error types for the wgpu backend.

use std::fmt;

use starling_graphics::FormatSpec;

/// Errors raised while setting up or feeding the GPU backend.
#[derive(Debug)]
pub enum BackendError {
    /// No suitable GPU adapter was found.
    NoAdapter(wgpu::RequestAdapterError),

    /// The adapter refused the device request.
    DeviceRequest(wgpu::RequestDeviceError),

    /// The attribute format has no `wgpu::VertexFormat` counterpart.
    UnmappableFormat {
        /// The format that could not be mapped.
        spec: FormatSpec,
        /// Why the mapping failed.
        reason: &'static str,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NoAdapter(e) => {
                write!(f, "No suitable GPU adapter: {}", e)
            }
            BackendError::DeviceRequest(e) => {
                write!(f, "Failed to create GPU device: {}", e)
            }
            BackendError::UnmappableFormat { spec, reason } => {
                write!(
                    f,
                    "Attribute format {:?}x{} ({:?}) has no vertex format: {}",
                    spec.component, spec.count, spec.kind, reason
                )
            }
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::NoAdapter(e) => Some(e),
            BackendError::DeviceRequest(e) => Some(e),
            BackendError::UnmappableFormat { .. } => None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BackendError>;
