//! Host environment: environment-variable lookups and target triple resolution.

pub mod paths;
pub mod triple;

pub use triple::{ToolchainTarget, TripleSource};
