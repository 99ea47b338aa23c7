//! Error types for amendment discovery.
//!
//! Resolution errors (`TemplateArity`, `MissingDefaultConstructor`,
//! `ComponentIntrospection`) are only ever produced when a discovery
//! sequence is advanced, never when a marker is declared.

/// Errors arising from marker resolution, component enumeration, or
/// template/type declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmendError {
    /// The template's parameterization does not match the one-parameter shape.
    #[error(
        "template `{template}` takes {found} type parameter(s), expected {expected} (subject `{subject}`)"
    )]
    TemplateArity {
        template: String,
        subject: String,
        expected: usize,
        found: usize,
    },

    /// The bound concrete type exposes no zero-argument constructor.
    #[error("`{concrete}` has no default constructor")]
    MissingDefaultConstructor { concrete: String },

    /// A component or one of its types could not be enumerated.
    #[error("cannot introspect component `{component}`: {reason}")]
    ComponentIntrospection { component: String, reason: String },

    /// A type reference string is malformed.
    #[error("invalid type reference `{input}`: {reason}")]
    InvalidTypeRef { input: String, reason: String },

    #[error("template `{0}` is already registered")]
    DuplicateTemplate(String),

    #[error("template `{0}` is not registered")]
    UnknownTemplate(String),

    /// A component declares the same subject type twice.
    #[error("component `{component}` declares `{subject}` more than once")]
    DuplicateType { component: String, subject: String },
}

impl AmendError {
    /// Whether this error was raised while resolving a marker against a
    /// subject (as opposed to while declaring or registering).
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Self::TemplateArity { .. }
                | Self::MissingDefaultConstructor { .. }
                | Self::ComponentIntrospection { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_taxonomy() {
        let arity = AmendError::TemplateArity {
            template: "Pair".into(),
            subject: "Person".into(),
            expected: 1,
            found: 2,
        };
        assert!(arity.is_resolution_failure());
        assert_eq!(
            arity.to_string(),
            "template `Pair` takes 2 type parameter(s), expected 1 (subject `Person`)"
        );
        assert!(!AmendError::UnknownTemplate("Notify".into()).is_resolution_failure());
    }
}
