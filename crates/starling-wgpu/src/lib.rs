//! wgpu backend for the Starling batching engine.
//!
//! `starling-graphics` is GPU-free: batches pack vertex data into CPU
//! buffers and emit draws through the `DrawSink` trait. This crate is
//! the GPU side of that seam:
//!
//! - [`GpuContext`] creates a headless device/queue pair,
//! - [`GpuMirror`] keeps one GPU buffer per batch buffer and uploads
//!   only dirty byte ranges each frame,
//! - [`PassSink`] replays submitted draw calls onto a render pass,
//! - [`vertex`] maps attribute formats to `wgpu` vertex formats.
//!
//! Pipeline and shader setup stay with the application; a compatible
//! pipeline must be bound before draws are replayed.

pub mod context;
pub mod error;
pub mod mirror;
pub mod pass;
pub mod vertex;

pub use context::GpuContext;
pub use error::BackendError;
pub use mirror::GpuMirror;
pub use pass::{PassSink, TransientStream};

// Re-export wgpu so downstream crates use the exact pinned version.
pub use wgpu;
