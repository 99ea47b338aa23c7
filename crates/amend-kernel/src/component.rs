//! Components: units of declared types plus component-scope attachments.
//!
//! The discovery driver only sees the `Component` trait. Loaders that
//! read compiled artifacts implement it directly; everything else builds a
//! `DeclaredComponent` through the registration API:
//!
//! ```text
//! DeclaredComponent::builder("app")
//!     .marker(Marker::new(audit))                 ← component scope
//!     .declare(TypeDeclaration::new(person)
//!         .marker(Marker::new(notify)))           ← type scope
//!     .build()?
//! ```

use crate::error::AmendError;
use crate::marker::AmendmentMarker;
use crate::type_ref::TypeRef;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Shared marker handle as stored on declarations.
pub type SharedMarker<D> = Arc<dyn AmendmentMarker<D> + Send + Sync>;

/// Anything attached to a declaration. Only markers take part in discovery.
pub enum Attachment<D> {
    Marker(SharedMarker<D>),
    Note { key: String, value: String },
}

impl<D> Clone for Attachment<D> {
    fn clone(&self) -> Self {
        match self {
            Self::Marker(marker) => Self::Marker(Arc::clone(marker)),
            Self::Note { key, value } => Self::Note {
                key: key.clone(),
                value: value.clone(),
            },
        }
    }
}

impl<D> Attachment<D> {
    pub fn as_marker(&self) -> Option<&dyn AmendmentMarker<D>> {
        match self {
            Self::Marker(marker) => Some(marker.as_ref()),
            Self::Note { .. } => None,
        }
    }
}

fn markers_of<D>(attachments: &[Attachment<D>]) -> Vec<&dyn AmendmentMarker<D>> {
    attachments.iter().filter_map(Attachment::as_marker).collect()
}

/// Input surface of the discovery driver.
///
/// Every query may fail with `AmendError::ComponentIntrospection`; the
/// driver reports such failures where the sequence is advanced.
pub trait Component<D> {
    /// Name used in attributions and diagnostics.
    fn name(&self) -> &str;

    /// Component-scope markers, in attachment order.
    fn markers(&self) -> Result<Vec<&dyn AmendmentMarker<D>>, AmendError>;

    /// Declared subject types, in declaration order.
    fn types(&self) -> Result<Vec<TypeRef>, AmendError>;

    /// Type-scope markers on `ty`, in attachment order.
    fn type_markers(&self, ty: &TypeRef) -> Result<Vec<&dyn AmendmentMarker<D>>, AmendError>;
}

/// A subject type and its attachments.
pub struct TypeDeclaration<D> {
    subject: TypeRef,
    attachments: Vec<Attachment<D>>,
}

impl<D> TypeDeclaration<D> {
    pub fn new(subject: TypeRef) -> Self {
        Self {
            subject,
            attachments: Vec::new(),
        }
    }

    pub fn subject(&self) -> &TypeRef {
        &self.subject
    }

    pub fn attachments(&self) -> &[Attachment<D>] {
        &self.attachments
    }

    pub fn attach(mut self, attachment: Attachment<D>) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn marker<M>(self, marker: M) -> Self
    where
        M: AmendmentMarker<D> + Send + Sync + 'static,
    {
        self.attach(Attachment::Marker(Arc::new(marker)))
    }

    pub fn note(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attach(Attachment::Note {
            key: key.into(),
            value: value.into(),
        })
    }
}

/// A component assembled through the registration API.
pub struct DeclaredComponent<D> {
    name: String,
    attachments: Vec<Attachment<D>>,
    types: Vec<TypeDeclaration<D>>,
}

impl<D> DeclaredComponent<D> {
    /// Start declaring a component called `name`.
    pub fn builder(name: impl Into<String>) -> ComponentBuilder<D> {
        ComponentBuilder {
            name: name.into(),
            attachments: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Component-scope attachments, markers and notes alike.
    pub fn attachments(&self) -> &[Attachment<D>] {
        &self.attachments
    }

    pub fn declarations(&self) -> &[TypeDeclaration<D>] {
        &self.types
    }

    fn declaration(&self, ty: &TypeRef) -> Option<&TypeDeclaration<D>> {
        self.types.iter().find(|decl| decl.subject == *ty)
    }
}

impl<D> Component<D> for DeclaredComponent<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn markers(&self) -> Result<Vec<&dyn AmendmentMarker<D>>, AmendError> {
        Ok(markers_of(&self.attachments))
    }

    fn types(&self) -> Result<Vec<TypeRef>, AmendError> {
        Ok(self.types.iter().map(|decl| decl.subject.clone()).collect())
    }

    fn type_markers(&self, ty: &TypeRef) -> Result<Vec<&dyn AmendmentMarker<D>>, AmendError> {
        let decl = self
            .declaration(ty)
            .ok_or_else(|| AmendError::ComponentIntrospection {
                component: self.name.clone(),
                reason: format!("type `{ty}` is not declared"),
            })?;
        Ok(markers_of(&decl.attachments))
    }
}

/// Incremental builder for [`DeclaredComponent`].
pub struct ComponentBuilder<D> {
    name: String,
    attachments: Vec<Attachment<D>>,
    types: Vec<TypeDeclaration<D>>,
}

impl<D> ComponentBuilder<D> {
    /// Append a component-scope attachment.
    pub fn attach(mut self, attachment: Attachment<D>) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Attach a component-scope marker.
    pub fn marker<M>(self, marker: M) -> Self
    where
        M: AmendmentMarker<D> + Send + Sync + 'static,
    {
        self.attach(Attachment::Marker(Arc::new(marker)))
    }

    /// Attach a non-marker note. Discovery ignores it.
    pub fn note(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attach(Attachment::Note {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Declare a subject type. Declaration order is discovery order.
    pub fn declare(mut self, decl: TypeDeclaration<D>) -> Self {
        self.types.push(decl);
        self
    }

    /// Finish the component. Subjects must be valid type references
    /// (see [`TypeRef::validate`]) and declared at most once.
    pub fn build(self) -> Result<DeclaredComponent<D>, AmendError> {
        let mut seen = BTreeSet::new();
        for decl in &self.types {
            decl.subject.validate()?;
            if !seen.insert(&decl.subject) {
                return Err(AmendError::DuplicateType {
                    component: self.name.clone(),
                    subject: decl.subject.to_string(),
                });
            }
        }
        tracing::debug!(
            component = %self.name,
            attachments = self.attachments.len(),
            types = self.types.len(),
            "component declared"
        );
        Ok(DeclaredComponent {
            name: self.name,
            attachments: self.attachments,
            types: self.types,
        })
    }
}
