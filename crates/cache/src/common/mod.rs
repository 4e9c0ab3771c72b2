//! Common types shared across the tag array, replacement policies and registry.
//!
//! This module provides:
//! 1. **Line Status:** The closed set of per-line coherence labels.
//! 2. **Constants:** Sentinel tags, owner ids and size limits.
//! 3. **Error Handling:** Configuration errors reported at construction.

/// Limits and sentinel values.
pub mod constants;

/// Configuration error type.
pub mod error;

/// Line status enumeration.
pub mod status;

pub use constants::{CLEARED_TAG, MAX_OBJECTS_PER_LINE, MAX_WAYS, UNOWNED};
pub use error::ConfigError;
pub use status::LineStatus;
