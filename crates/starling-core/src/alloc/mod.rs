//! Optimized allocation and collection types for Starling.
//!
//! This module provides:
//! - Re-exports of optimized hash collections using AHash
//! - A generational handle map for stable, reusable references
//! - Common allocation utilities

pub mod handle_map;

// Re-export optimized hash collections
pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};
