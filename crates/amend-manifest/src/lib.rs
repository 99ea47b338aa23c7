//! # Amend Manifest
//!
//! Declarative component manifests. A manifest lists a component's subject
//! types and the markers attached to them (at type or component scope),
//! referring to amendment templates by registry name. Building a manifest
//! produces an `amend_kernel::DeclaredComponent` ready for discovery.

pub mod error;
pub mod manifest;

pub use error::ManifestError;
pub use manifest::{ComponentManifest, MarkerEntry, TypeEntry, load_component};
