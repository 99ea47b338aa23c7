//! Template registry.
//!
//! Maps template names to `Template` handles so declarative surfaces can
//! refer to templates by name. Lookup is a checked table lookup.

use crate::error::AmendError;
use crate::template::Template;
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const TEMPLATE_REGISTRY_KIND: &str = "amend.template_registry.v1";
pub const TEMPLATE_REGISTRY_SCHEMA: u32 = 1;

/// Name-ordered set of amendment templates.
pub struct TemplateRegistry<D> {
    templates: BTreeMap<String, Template<D>>,
}

impl<D> Default for TemplateRegistry<D> {
    fn default() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }
}

impl<D> std::fmt::Debug for TemplateRegistry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.templates.values()).finish()
    }
}

impl<D> TemplateRegistry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under its own name.
    pub fn register(&mut self, template: Template<D>) -> Result<(), AmendError> {
        if self.templates.contains_key(template.name()) {
            return Err(AmendError::DuplicateTemplate(template.name().to_string()));
        }
        tracing::trace!(
            template = template.name(),
            shape = %template.shape(),
            "template registered"
        );
        self.templates.insert(template.name().to_string(), template);
        Ok(())
    }

    /// Builder-style `register`.
    pub fn with(mut self, template: Template<D>) -> Result<Self, AmendError> {
        self.register(template)?;
        Ok(self)
    }

    /// Template registered as `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Template<D>> {
        self.templates.get(name)
    }

    /// Like [`TemplateRegistry::get`], but an absent name is an
    /// `UnknownTemplate` error.
    pub fn lookup(&self, name: &str) -> Result<Template<D>, AmendError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| AmendError::UnknownTemplate(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Versioned JSON surface listing every template in name order.
    pub fn registry_json(&self) -> Value {
        json!({
            "schema": TEMPLATE_REGISTRY_SCHEMA,
            "registryKind": TEMPLATE_REGISTRY_KIND,
            "templates": self.templates.values().map(Template::describe).collect::<Vec<_>>(),
        })
    }
}
