//! # Amend Kernel
//!
//! Resolves which amendments apply to which types, and in what order.
//! A library declares markers on types or on a whole component; each marker
//! names an amendment template. Discovery binds every applicable template to
//! every subject type and hands the resulting descriptors, in a fixed order,
//! to a rewriting engine that lives outside this crate.
//!
//! The kernel is **engine-agnostic**: descriptors are an opaque type
//! parameter `D`. Nothing here rewrites anything.
//!
//! ## Architecture
//!
//! ```text
//! TypeRef               ← Subject and template type identifiers
//!     │
//! Template<D>           ← Closed or open template + zero-arg constructor
//!     │                   (TemplateRegistry: checked name lookup)
//! AmendmentMarker<D>    ← resolve(subject) → lazy descriptors
//!     │
//! Component<D>          ← Component-scope and type-scope attachments
//!     │
//! discover()            ← Lazy, ordered, fail-fast descriptor stream
//! ```

pub mod component;
pub mod discover;
pub mod error;
pub mod fingerprint;
pub mod marker;
pub mod recovery;
pub mod registry;
pub mod template;
pub mod type_ref;

pub use component::{Attachment, Component, ComponentBuilder, DeclaredComponent, TypeDeclaration};
pub use discover::{
    Attribution, AttributionRow, AttributedDiscovery, Discovery, MarkerScope, discover,
    discover_all, discover_attributed,
};
pub use error::AmendError;
pub use fingerprint::{ContentHash, plan_fingerprint};
pub use marker::{AmendmentMarker, Amendments, Marker, bind_and_construct};
pub use recovery::{ResilientDiscovery, TypeFailure, discover_resilient};
pub use registry::TemplateRegistry;
pub use template::{BoundTemplate, Constructor, Template, TemplateShape};
pub use type_ref::{MAX_TYPE_DEPTH, TypeRef};
