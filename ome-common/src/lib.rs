//! # OME Common Library
//!
//! Shared code for the ontology matcher ensemble workspace:
//! - Error and result types
//! - Layered configuration loading (CLI → ENV → TOML → defaults)
//! - Seeded random number streams
//! - Path-addressed artifact store (filesystem memoization)

pub mod artifact;
pub mod config;
pub mod error;
pub mod seed;

pub use artifact::{Artifact, ArtifactStore, Json};
pub use error::{Error, Result};
pub use seed::Seed;
