//! Starling Core
//!
//! This crate contains the ambient utilities shared by the Starling
//! batching engine: logging setup, profiling hooks and allocation helpers.

pub mod alloc;
pub mod logging;
pub mod profiling;
