//! Caller-side recovery over the discovery walk.
//!
//! The driver itself stops at the first failure. Callers that prefer
//! availability over completeness resolve type by type instead: a type whose
//! resolution fails contributes nothing and is reported, the rest proceed.

use crate::component::Component;
use crate::discover::{Attribution, ScopedMarker, SubjectWalk, component_markers};
use crate::error::AmendError;
use crate::type_ref::TypeRef;

/// A subject whose amendments could not be fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeFailure {
    pub subject: TypeRef,
    pub error: AmendError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResilientDiscovery<D> {
    /// Amendments of every fully resolved type, in discovery order.
    pub amendments: Vec<Attribution<D>>,
    pub failures: Vec<TypeFailure>,
}

impl<D> ResilientDiscovery<D> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolve every type of `target`, skipping types whose resolution fails.
///
/// Failing to enumerate the components themselves is still fatal.
pub fn discover_resilient<'a, D: 'a>(
    target: &'a dyn Component<D>,
    auxiliary: &[&'a dyn Component<D>],
) -> Result<ResilientDiscovery<D>, AmendError> {
    let component_markers = component_markers(target, auxiliary)?;
    let mut outcome = ResilientDiscovery {
        amendments: Vec::new(),
        failures: Vec::new(),
    };
    for subject in target.types()? {
        match resolve_subject(target, subject.clone(), &component_markers) {
            Ok(amendments) => outcome.amendments.extend(amendments),
            Err(error) => {
                tracing::warn!(
                    component = target.name(),
                    subject = %subject,
                    error = %error,
                    "skipping type after resolution failure"
                );
                outcome.failures.push(TypeFailure { subject, error });
            }
        }
    }
    Ok(outcome)
}

fn resolve_subject<'a, D: 'a>(
    target: &'a dyn Component<D>,
    subject: TypeRef,
    component_markers: &[ScopedMarker<'a, D>],
) -> Result<Vec<Attribution<D>>, AmendError> {
    let mut walk = SubjectWalk::open(target, subject, component_markers)?;
    std::iter::from_fn(|| walk.step()).collect()
}
