//! Voxboard status crate - transient user-facing status messages.
//!
//! One `(message, kind)` pair is visible at a time; later calls overwrite
//! earlier ones and implicitly cancel a pending auto-hide.

pub mod reporter;

pub use reporter::{MemoryStatus, StatusReporter, StatusSurface};
