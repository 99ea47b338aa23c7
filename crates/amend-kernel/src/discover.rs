//! The discovery driver.
//!
//! Walks a target component and yields amendment descriptors in a fixed
//! order:
//!
//! ```text
//! for each type T declared in target (declaration order):
//!     type-scope markers on T          (attachment order)
//!     component-scope markers           (target, then each auxiliary)
//!         └─ marker.resolve(T), flattened
//! ```
//!
//! The walk is pull-driven. Nothing is enumerated before the first call to
//! `next`, each marker is resolved only when the previous one is exhausted,
//! and the first error ends the sequence. Items already yielded stand;
//! types not yet reached are never produced.

use crate::component::Component;
use crate::error::AmendError;
use crate::marker::{AmendmentMarker, Amendments};
use crate::type_ref::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a marker was attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerScope {
    /// Directly on the subject type.
    Type,
    /// On the named component (the target or an auxiliary).
    Component(String),
}

impl fmt::Display for MarkerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => write!(f, "type"),
            Self::Component(name) => write!(f, "component:{name}"),
        }
    }
}

/// A descriptor together with the (marker, subject) pair that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution<D> {
    pub subject: TypeRef,
    pub template: String,
    pub scope: MarkerScope,
    pub descriptor: D,
}

/// Descriptor-free view of an attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionRow {
    pub subject: TypeRef,
    pub template: String,
    pub scope: MarkerScope,
}

impl<D> Attribution<D> {
    pub fn row(&self) -> AttributionRow {
        AttributionRow {
            subject: self.subject.clone(),
            template: self.template.clone(),
            scope: self.scope.clone(),
        }
    }
}

pub(crate) struct ScopedMarker<'a, D> {
    marker: &'a dyn AmendmentMarker<D>,
    scope: MarkerScope,
}

impl<D> Clone for ScopedMarker<'_, D> {
    fn clone(&self) -> Self {
        Self {
            marker: self.marker,
            scope: self.scope.clone(),
        }
    }
}

/// Collect component-scope markers: the target's, then each auxiliary's.
pub(crate) fn component_markers<'a, D: 'a>(
    target: &'a dyn Component<D>,
    auxiliary: &[&'a dyn Component<D>],
) -> Result<Vec<ScopedMarker<'a, D>>, AmendError> {
    let mut collected = Vec::new();
    for component in std::iter::once(target).chain(auxiliary.iter().copied()) {
        let scope = MarkerScope::Component(component.name().to_string());
        collected.extend(component.markers()?.into_iter().map(|marker| ScopedMarker {
            marker,
            scope: scope.clone(),
        }));
    }
    Ok(collected)
}

/// All markers applying to one subject, type scope first.
pub(crate) struct SubjectWalk<'a, D> {
    subject: TypeRef,
    markers: std::vec::IntoIter<ScopedMarker<'a, D>>,
    active: Option<(ScopedMarker<'a, D>, Amendments<'a, D>)>,
}

impl<'a, D: 'a> SubjectWalk<'a, D> {
    pub(crate) fn open(
        target: &'a dyn Component<D>,
        subject: TypeRef,
        component_markers: &[ScopedMarker<'a, D>],
    ) -> Result<Self, AmendError> {
        let markers: Vec<_> = target
            .type_markers(&subject)?
            .into_iter()
            .map(|marker| ScopedMarker {
                marker,
                scope: MarkerScope::Type,
            })
            .chain(component_markers.iter().cloned())
            .collect();
        tracing::trace!(subject = %subject, markers = markers.len(), "resolving subject");
        Ok(Self {
            subject,
            markers: markers.into_iter(),
            active: None,
        })
    }

    pub(crate) fn step(&mut self) -> Option<Result<Attribution<D>, AmendError>> {
        loop {
            if let Some((scoped, amendments)) = self.active.as_mut() {
                match amendments.next() {
                    Some(Ok(descriptor)) => {
                        return Some(Ok(Attribution {
                            subject: self.subject.clone(),
                            template: scoped.marker.template().name().to_string(),
                            scope: scoped.scope.clone(),
                            descriptor,
                        }));
                    }
                    Some(Err(err)) => {
                        tracing::debug!(
                            subject = %self.subject,
                            template = scoped.marker.template().name(),
                            scope = %scoped.scope,
                            error = %err,
                            "marker resolution failed"
                        );
                        return Some(Err(err));
                    }
                    None => self.active = None,
                }
            }
            let scoped = self.markers.next()?;
            let amendments = scoped.marker.resolve(&self.subject);
            self.active = Some((scoped, amendments));
        }
    }
}

struct TypeWalk<'a, D> {
    component_markers: Vec<ScopedMarker<'a, D>>,
    types: std::vec::IntoIter<TypeRef>,
    current: Option<SubjectWalk<'a, D>>,
}

impl<'a, D: 'a> TypeWalk<'a, D> {
    fn step(&mut self, target: &'a dyn Component<D>) -> Option<Result<Attribution<D>, AmendError>> {
        loop {
            if let Some(walk) = self.current.as_mut() {
                if let Some(item) = walk.step() {
                    return Some(item);
                }
                self.current = None;
            }
            let subject = self.types.next()?;
            match SubjectWalk::open(target, subject, &self.component_markers) {
                Ok(walk) => self.current = Some(walk),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

enum Phase<'a, D> {
    Pending,
    Walking(TypeWalk<'a, D>),
    Done,
}

/// Lazy, attributed discovery sequence. See [`discover_attributed`].
pub struct AttributedDiscovery<'a, D> {
    target: &'a dyn Component<D>,
    auxiliary: &'a [&'a dyn Component<D>],
    phase: Phase<'a, D>,
}

impl<'a, D: 'a> AttributedDiscovery<'a, D> {
    fn start(&self) -> Result<TypeWalk<'a, D>, AmendError> {
        tracing::debug!(
            component = self.target.name(),
            auxiliary = self.auxiliary.len(),
            "amendment discovery started"
        );
        let component_markers = component_markers(self.target, self.auxiliary)?;
        let types = self.target.types()?;
        tracing::debug!(
            component = self.target.name(),
            component_markers = component_markers.len(),
            types = types.len(),
            "component-scope markers collected"
        );
        Ok(TypeWalk {
            component_markers,
            types: types.into_iter(),
            current: None,
        })
    }
}

impl<'a, D: 'a> Iterator for AttributedDiscovery<'a, D> {
    type Item = Result<Attribution<D>, AmendError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.phase, Phase::Pending) {
            self.phase = match self.start() {
                Ok(walk) => Phase::Walking(walk),
                Err(err) => {
                    self.phase = Phase::Done;
                    return Some(Err(err));
                }
            };
        }
        let target = self.target;
        let item = match &mut self.phase {
            Phase::Walking(walk) => walk.step(target),
            Phase::Pending | Phase::Done => None,
        };
        if !matches!(item, Some(Ok(_))) {
            self.phase = Phase::Done;
        }
        item
    }
}

impl<'a, D: 'a> std::iter::FusedIterator for AttributedDiscovery<'a, D> {}

/// Lazy discovery sequence of bare descriptors. See [`discover`].
pub struct Discovery<'a, D> {
    inner: AttributedDiscovery<'a, D>,
}

impl<'a, D: 'a> Iterator for Discovery<'a, D> {
    type Item = Result<D, AmendError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|item| item.map(|attribution| attribution.descriptor))
    }
}

impl<'a, D: 'a> std::iter::FusedIterator for Discovery<'a, D> {}

/// Discover the amendments that apply to the types of `target`.
///
/// Component-scope markers of `target` and of every `auxiliary` component
/// apply to each type declared in `target`; types of auxiliary components
/// are never subjects.
pub fn discover<'a, D: 'a>(
    target: &'a dyn Component<D>,
    auxiliary: &'a [&'a dyn Component<D>],
) -> Discovery<'a, D> {
    Discovery {
        inner: discover_attributed(target, auxiliary),
    }
}

/// Like [`discover`], but each item records the subject, template and
/// scope that produced it.
pub fn discover_attributed<'a, D: 'a>(
    target: &'a dyn Component<D>,
    auxiliary: &'a [&'a dyn Component<D>],
) -> AttributedDiscovery<'a, D> {
    AttributedDiscovery {
        target,
        auxiliary,
        phase: Phase::Pending,
    }
}

/// Drain [`discover`] into a vector, stopping at the first error.
pub fn discover_all<'a, D: 'a>(
    target: &'a dyn Component<D>,
    auxiliary: &'a [&'a dyn Component<D>],
) -> Result<Vec<D>, AmendError> {
    discover(target, auxiliary).collect()
}
