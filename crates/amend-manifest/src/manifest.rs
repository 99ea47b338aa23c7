//! Component manifests.
//!
//! A manifest declares a component's types and the markers attached to
//! them, naming templates by their registry name. TOML and JSON carry the
//! same shape:
//!
//! ```toml
//! name = "billing"
//!
//! [[markers]]               # component scope
//! template = "Audit"
//!
//! [[types]]
//! name = "Invoice"
//!
//! [[types.markers]]         # type scope
//! template = "Notify"
//! ```
//!
//! Template names are checked when the manifest is built. Arity and
//! constructor problems are left to discovery, where they surface at the
//! marker's position in the stream.

use crate::error::ManifestError;
use amend_kernel::{
    Attachment, DeclaredComponent, Marker, TemplateRegistry, TypeDeclaration, TypeRef,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const INLINE_SOURCE: &str = "<inline>";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComponentManifest {
    pub name: String,
    /// Component-scope markers.
    #[serde(default)]
    pub markers: Vec<MarkerEntry>,
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeEntry {
    /// Subject type in display form, e.g. `Repository<Invoice>`.
    pub name: String,
    #[serde(default)]
    pub markers: Vec<MarkerEntry>,
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarkerEntry {
    pub template: String,
    /// When non-empty, the marker only applies to these subjects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only: Vec<String>,
}

impl ComponentManifest {
    pub fn from_toml_str(text: &str) -> Result<Self, ManifestError> {
        parse_toml(text, INLINE_SOURCE)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ManifestError> {
        parse_json(text, INLINE_SOURCE)
    }

    /// Read a manifest, choosing the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let display = path.display().to_string();
        let parse: fn(&str, &str) -> Result<Self, ManifestError> =
            match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => parse_toml,
                Some("json") => parse_json,
                _ => return Err(ManifestError::UnsupportedFormat { path: display }),
            };
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::ReadFile {
            path: display.clone(),
            source,
        })?;
        parse(&text, &display)
    }

    /// Build a kernel component, resolving template names against
    /// `templates`.
    pub fn build<D: 'static>(
        &self,
        templates: &TemplateRegistry<D>,
    ) -> Result<DeclaredComponent<D>, ManifestError> {
        let mut builder = DeclaredComponent::builder(self.name.clone());
        for (key, value) in &self.notes {
            builder = builder.note(key.clone(), value.clone());
        }
        for (idx, entry) in self.markers.iter().enumerate() {
            builder = builder.attach(entry.attachment(templates, &format!("markers[{idx}]"))?);
        }
        for (idx, entry) in self.types.iter().enumerate() {
            builder = builder.declare(entry.declaration(templates, &format!("types[{idx}]"))?);
        }
        Ok(builder.build()?)
    }
}

impl TypeEntry {
    fn declaration<D: 'static>(
        &self,
        templates: &TemplateRegistry<D>,
        path: &str,
    ) -> Result<TypeDeclaration<D>, ManifestError> {
        let subject = parse_type(&self.name, &format!("{path}.name"))?;
        let mut decl = TypeDeclaration::new(subject);
        for (key, value) in &self.notes {
            decl = decl.note(key.clone(), value.clone());
        }
        for (idx, entry) in self.markers.iter().enumerate() {
            decl = decl.attach(entry.attachment(templates, &format!("{path}.markers[{idx}]"))?);
        }
        Ok(decl)
    }
}

impl MarkerEntry {
    fn attachment<D: 'static>(
        &self,
        templates: &TemplateRegistry<D>,
        path: &str,
    ) -> Result<Attachment<D>, ManifestError> {
        let template =
            templates
                .get(&self.template)
                .cloned()
                .ok_or_else(|| ManifestError::UnknownTemplate {
                    path: path.to_string(),
                    template: self.template.clone(),
                })?;
        if self.only.is_empty() {
            return Ok(Attachment::Marker(Arc::new(Marker::new(template))));
        }
        let only = self
            .only
            .iter()
            .enumerate()
            .map(|(idx, name)| parse_type(name, &format!("{path}.only[{idx}]")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Attachment::Marker(Arc::new(Marker::when(
            template,
            move |subject| only.contains(subject),
        ))))
    }
}

/// Load and build a component manifest in one step.
pub fn load_component<D: 'static>(
    path: impl AsRef<Path>,
    templates: &TemplateRegistry<D>,
) -> Result<DeclaredComponent<D>, ManifestError> {
    let path = path.as_ref();
    let manifest = ComponentManifest::from_path(path)?;
    let component = manifest.build(templates)?;
    tracing::debug!(
        path = %path.display(),
        component = %manifest.name,
        markers = manifest.markers.len(),
        types = manifest.types.len(),
        "component manifest loaded"
    );
    Ok(component)
}

fn parse_toml(text: &str, source_path: &str) -> Result<ComponentManifest, ManifestError> {
    toml::from_str(text).map_err(|source| ManifestError::ParseToml {
        path: source_path.to_string(),
        source,
    })
}

fn parse_json(text: &str, source_path: &str) -> Result<ComponentManifest, ManifestError> {
    serde_json::from_str(text).map_err(|source| ManifestError::ParseJson {
        path: source_path.to_string(),
        source,
    })
}

fn parse_type(name: &str, path: &str) -> Result<TypeRef, ManifestError> {
    TypeRef::parse(name).map_err(|source| ManifestError::Declaration {
        path: path.to_string(),
        source,
    })
}
