//! Shared test fixtures for the lineage workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`graphs`]: engines preloaded with canned parent graphs
//! - [`workspace`]: [`TestWorkspace`] builder for on-disk scenarios

pub mod graphs;
pub mod workspace;

pub use workspace::TestWorkspace;
