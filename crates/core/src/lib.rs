//! Core types for ragetup.
//!
//! This crate holds everything that is pure data and pure decision logic:
//! the platform model (`Os`, `Arch`, `WordSize`, `ReleaseTarget`), the
//! release catalog (`Catalog`, `ReleaseArtifact`) with its manifest loader,
//! and the shared error taxonomy. The effectful install sequence lives in
//! `ragetup-installer`.

pub mod catalog;
pub mod errors;
pub mod platform;

pub use catalog::{Catalog, Manifest, ManifestEntry, ReleaseArtifact};
pub use errors::{Error, Result};
pub use platform::{Arch, Os, ReleaseTarget, WordSize};
