//! Filesystem layer for lineage
//!
//! Provides the locked, atomic write path used by the version log backends,
//! format-detecting document loading for entity definitions and engine
//! configuration, and the canonical content checksum.

pub mod checksum;
pub mod error;
pub mod format;
pub mod io;

pub use checksum::compute_content_checksum;
pub use error::{Error, Result};
pub use format::{DocumentFormat, DocumentStore};
