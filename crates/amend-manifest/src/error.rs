//! Manifest loading errors.

use amend_kernel::AmendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json at {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported manifest format: {path} (expected .toml or .json)")]
    UnsupportedFormat { path: String },

    /// A marker names a template the registry does not know.
    #[error("{path}: unknown template `{template}`")]
    UnknownTemplate { path: String, template: String },

    #[error("{path}: {source}")]
    Declaration {
        path: String,
        #[source]
        source: AmendError,
    },

    #[error(transparent)]
    Kernel(#[from] AmendError),
}
