//! Amendment markers.
//!
//! A marker is attached to a type declaration or to a whole component. It
//! names an amendment template and knows how to turn a subject type into
//! zero or more amendment descriptors.
//!
//! Resolution is lazy: `resolve` only builds an iterator. Binding and
//! construction happen when that iterator is advanced, so arity and
//! constructor failures are reported at the point of use.

use crate::error::AmendError;
use crate::template::Template;
use crate::type_ref::TypeRef;
use std::sync::Arc;

/// Lazy sequence of descriptors produced by one marker for one subject.
pub type Amendments<'a, D> = Box<dyn Iterator<Item = Result<D, AmendError>> + 'a>;

/// Custom resolution capability for [`Marker::with_policy`].
pub type ResolvePolicy<D> =
    Arc<dyn Fn(&Template<D>, &TypeRef) -> Result<Vec<D>, AmendError> + Send + Sync>;

/// The marker capability.
pub trait AmendmentMarker<D> {
    /// The amendment template this marker refers to.
    fn template(&self) -> &Template<D>;

    /// Resolve this marker against `subject`.
    ///
    /// The default binds the template's single type parameter to `subject`
    /// and yields the one constructed descriptor.
    fn resolve<'a>(&'a self, subject: &TypeRef) -> Amendments<'a, D>
    where
        D: 'a,
    {
        bind_and_construct(self.template(), subject)
    }
}

/// Default resolution: bind `template` to `subject` and call the bound
/// type's zero-argument constructor, once, on first pull.
pub fn bind_and_construct<'a, D: 'a>(
    template: &'a Template<D>,
    subject: &TypeRef,
) -> Amendments<'a, D> {
    let subject = subject.clone();
    Box::new(std::iter::once_with(move || {
        template.bind(&subject)?.instantiate()
    }))
}

enum Resolution<D> {
    Default,
    Policy(ResolvePolicy<D>),
    When(Arc<dyn Fn(&TypeRef) -> bool + Send + Sync>),
}

/// The standard declarable marker.
pub struct Marker<D> {
    template: Template<D>,
    resolution: Resolution<D>,
}

impl<D> std::fmt::Debug for Marker<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let resolution = match self.resolution {
            Resolution::Default => "default",
            Resolution::Policy(_) => "policy",
            Resolution::When(_) => "when",
        };
        f.debug_struct("Marker")
            .field("template", &self.template.name())
            .field("resolution", &resolution)
            .finish()
    }
}

impl<D> Marker<D> {
    pub fn new(template: Template<D>) -> Self {
        Self {
            template,
            resolution: Resolution::Default,
        }
    }

    /// A marker whose resolution is delegated to `policy`.
    ///
    /// The policy runs on the first pull of the resolved sequence, not when
    /// `resolve` is called.
    pub fn with_policy<F>(template: Template<D>, policy: F) -> Self
    where
        F: Fn(&Template<D>, &TypeRef) -> Result<Vec<D>, AmendError> + Send + Sync + 'static,
    {
        Self {
            template,
            resolution: Resolution::Policy(Arc::new(policy)),
        }
    }

    /// Default resolution for subjects accepted by `predicate`, nothing for
    /// the rest.
    pub fn when<F>(template: Template<D>, predicate: F) -> Self
    where
        F: Fn(&TypeRef) -> bool + Send + Sync + 'static,
    {
        Self {
            template,
            resolution: Resolution::When(Arc::new(predicate)),
        }
    }
}

impl<D> AmendmentMarker<D> for Marker<D> {
    fn template(&self) -> &Template<D> {
        &self.template
    }

    fn resolve<'a>(&'a self, subject: &TypeRef) -> Amendments<'a, D>
    where
        D: 'a,
    {
        match &self.resolution {
            Resolution::Default => bind_and_construct(&self.template, subject),
            Resolution::When(accepts) => {
                if accepts(subject) {
                    bind_and_construct(&self.template, subject)
                } else {
                    Box::new(std::iter::empty())
                }
            }
            Resolution::Policy(policy) => {
                let subject = subject.clone();
                let outcome = std::iter::once_with(move || policy(&self.template, &subject));
                Box::new(outcome.flat_map(|result| match result {
                    Ok(descriptors) => descriptors.into_iter().map(Ok).collect::<Vec<_>>(),
                    Err(err) => vec![Err(err)],
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateShape;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn notify() -> Template<String> {
        Template::open("Notify", |ty: &TypeRef| ty.to_string())
    }

    #[test]
    fn default_marker_yields_one_descriptor() {
        let marker = Marker::new(notify());
        let out: Vec<_> = marker.resolve(&TypeRef::named("Person")).collect();
        assert_eq!(out, vec![Ok("Notify<Person>".to_string())]);
    }

    #[test]
    fn arity_failure_is_deferred_until_pull() {
        let marker = Marker::new(Template::<String>::declare(
            "Pair",
            TemplateShape::Open { params: 2 },
        ));
        let mut resolved = marker.resolve(&TypeRef::named("Person"));
        assert!(matches!(
            resolved.next(),
            Some(Err(AmendError::TemplateArity { found: 2, .. }))
        ));
        assert!(resolved.next().is_none());
    }

    #[test]
    fn policy_runs_lazily_and_may_yield_many() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let marker = Marker::with_policy(notify(), move |template, subject| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                format!("{}:{subject}:get", template.name()),
                format!("{}:{subject}:set", template.name()),
            ])
        });

        let resolved = marker.resolve(&TypeRef::named("Person"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let out: Result<Vec<_>, _> = resolved.collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            out.unwrap(),
            vec!["Notify:Person:get".to_string(), "Notify:Person:set".to_string()]
        );
    }

    #[test]
    fn policy_failure_is_a_single_error_item() {
        let marker = Marker::with_policy(notify(), |_, subject| {
            Err(AmendError::MissingDefaultConstructor {
                concrete: format!("Custom<{subject}>"),
            })
        });
        let out: Vec<_> = marker.resolve(&TypeRef::named("Person")).collect();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_err());
    }

    #[test]
    fn when_marker_skips_rejected_subjects() {
        let marker = Marker::when(notify(), |ty| ty.name().ends_with("Dto"));
        assert_eq!(marker.resolve(&TypeRef::named("Person")).count(), 0);
        let out: Vec<_> = marker.resolve(&TypeRef::named("PersonDto")).collect();
        assert_eq!(out, vec![Ok("Notify<PersonDto>".to_string())]);
    }
}
