//! Amendment templates and generic binding.
//!
//! A template is a type whose instantiation produces an amendment
//! descriptor. Templates are either closed (already concrete) or open over
//! some number of type parameters. Binding an open one-parameter template to
//! a subject yields the concrete type `Template<Subject>`; instantiating the
//! bound type calls its zero-argument constructor.
//!
//! ```text
//! Template<D> ──bind(subject)──▶ BoundTemplate ──instantiate()──▶ D
//!    │                              │
//!    └─ TemplateArity               └─ MissingDefaultConstructor
//! ```
//!
//! Both failure points are plain checks against the template's declared
//! shape and constructor; nothing is looked up reflectively.

use crate::error::AmendError;
use crate::type_ref::TypeRef;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

/// The number of type parameters a descriptor template expects.
pub const TEMPLATE_PARAMS: usize = 1;

/// Zero-argument constructor of a bound template.
///
/// It is handed the concrete type it constructs (e.g. `Notify<Person>`),
/// the way a generic type's constructor knows its own type arguments.
pub type Constructor<D> = Arc<dyn Fn(&TypeRef) -> D + Send + Sync>;

/// Parameterization of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TemplateShape {
    /// Not generic; binds to itself regardless of subject.
    Closed,
    /// Generic over `params` type parameters.
    Open { params: usize },
}

impl TemplateShape {
    pub fn params(self) -> usize {
        match self {
            Self::Closed => 0,
            Self::Open { params } => params,
        }
    }
}

impl fmt::Display for TemplateShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open { params } => write!(f, "open/{params}"),
        }
    }
}

struct TemplateDef<D> {
    name: String,
    shape: TemplateShape,
    constructor: Option<Constructor<D>>,
}

/// A named amendment template. Cloning shares the definition.
pub struct Template<D> {
    def: Arc<TemplateDef<D>>,
}

impl<D> Clone for Template<D> {
    fn clone(&self) -> Self {
        Self {
            def: Arc::clone(&self.def),
        }
    }
}

impl<D> fmt::Debug for Template<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.def.name)
            .field("shape", &self.def.shape)
            .field("has_constructor", &self.def.constructor.is_some())
            .finish()
    }
}

impl<D> Template<D> {
    /// Declare a template without a constructor.
    pub fn declare(name: impl Into<String>, shape: TemplateShape) -> Self {
        Self {
            def: Arc::new(TemplateDef {
                name: name.into(),
                shape,
                constructor: None,
            }),
        }
    }

    /// A one-parameter template constructed by `constructor`.
    pub fn open<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&TypeRef) -> D + Send + Sync + 'static,
    {
        Self::declare(name, TemplateShape::Open { params: TEMPLATE_PARAMS })
            .with_constructor(constructor)
    }

    /// A closed template constructed by `constructor`.
    pub fn closed<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&TypeRef) -> D + Send + Sync + 'static,
    {
        Self::declare(name, TemplateShape::Closed).with_constructor(constructor)
    }

    /// Returns a new template with the same name and shape, constructed by
    /// `constructor`.
    pub fn with_constructor<F>(self, constructor: F) -> Self
    where
        F: Fn(&TypeRef) -> D + Send + Sync + 'static,
    {
        Self {
            def: Arc::new(TemplateDef {
                name: self.def.name.clone(),
                shape: self.def.shape,
                constructor: Some(Arc::new(constructor)),
            }),
        }
    }

    /// Registry name; also the name of every type this template binds to.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Parameterization, checked when the template is bound.
    pub fn shape(&self) -> TemplateShape {
        self.def.shape
    }

    pub fn has_constructor(&self) -> bool {
        self.def.constructor.is_some()
    }

    /// Bind this template to `subject`.
    ///
    /// Open one-parameter templates become `Name<subject>`. Closed templates
    /// bind to themselves unchanged. Every other shape is an arity error.
    pub fn bind(&self, subject: &TypeRef) -> Result<BoundTemplate<'_, D>, AmendError> {
        let concrete = match self.def.shape {
            TemplateShape::Closed => TypeRef::named(self.name()),
            TemplateShape::Open {
                params: TEMPLATE_PARAMS,
            } => TypeRef::generic(self.name(), vec![subject.clone()]),
            TemplateShape::Open { params } => {
                return Err(AmendError::TemplateArity {
                    template: self.name().to_string(),
                    subject: subject.to_string(),
                    expected: TEMPLATE_PARAMS,
                    found: params,
                });
            }
        };
        Ok(BoundTemplate {
            template: self,
            concrete,
        })
    }

    /// Registry row for this template.
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name(),
            "shape": self.shape(),
            "hasConstructor": self.has_constructor(),
        })
    }
}

/// A template bound to a concrete type, ready to instantiate.
pub struct BoundTemplate<'t, D> {
    template: &'t Template<D>,
    concrete: TypeRef,
}

impl<D> BoundTemplate<'_, D> {
    /// The concrete type produced by binding.
    pub fn concrete(&self) -> &TypeRef {
        &self.concrete
    }

    pub fn instantiate(&self) -> Result<D, AmendError> {
        let constructor = self.template.def.constructor.as_ref().ok_or_else(|| {
            AmendError::MissingDefaultConstructor {
                concrete: self.concrete.to_string(),
            }
        })?;
        Ok(constructor(&self.concrete))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> TypeRef {
        TypeRef::named("Person")
    }

    #[test]
    fn open_template_binds_subject_as_argument() {
        let template = Template::open("Notify", |ty: &TypeRef| ty.to_string());
        let bound = template.bind(&person()).unwrap();
        assert_eq!(bound.concrete().to_string(), "Notify<Person>");
        assert_eq!(bound.instantiate().unwrap(), "Notify<Person>");
    }

    #[test]
    fn closed_template_binds_unchanged() {
        let template = Template::closed("Audit", |ty: &TypeRef| ty.to_string());
        let bound = template.bind(&person()).unwrap();
        assert_eq!(bound.concrete(), &TypeRef::named("Audit"));
        assert_eq!(bound.instantiate().unwrap(), "Audit");
    }

    #[test]
    fn two_parameter_template_is_an_arity_error() {
        let template = Template::<String>::declare("Pair", TemplateShape::Open { params: 2 });
        let err = template.bind(&person()).err().unwrap();
        assert_eq!(
            err,
            AmendError::TemplateArity {
                template: "Pair".into(),
                subject: "Person".into(),
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn zero_parameter_open_template_is_an_arity_error() {
        let template = Template::<String>::declare("Odd", TemplateShape::Open { params: 0 });
        assert!(matches!(
            template.bind(&person()),
            Err(AmendError::TemplateArity { found: 0, .. })
        ));
    }

    #[test]
    fn missing_constructor_surfaces_on_instantiate() {
        let template = Template::<String>::declare("Notify", TemplateShape::Open { params: 1 });
        let bound = template.bind(&person()).unwrap();
        assert_eq!(
            bound.instantiate().unwrap_err(),
            AmendError::MissingDefaultConstructor {
                concrete: "Notify<Person>".into()
            }
        );
    }

    #[test]
    fn describe_row() {
        let template = Template::open("Notify", |_: &TypeRef| ());
        assert_eq!(
            template.describe(),
            json!({
                "name": "Notify",
                "shape": {"kind": "open", "params": 1},
                "hasConstructor": true,
            })
        );
    }
}
