//! Content fingerprints for discovery plans.
//!
//! A plan fingerprint identifies which templates apply to which subjects,
//! from which scope, in which order. Descriptors are opaque and do not take
//! part; two discoveries over the same inputs fingerprint identically.

use crate::discover::Attribution;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 content hash, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Hash raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{hash:x}"))
    }

    /// Start an incremental hash over named fields.
    pub fn builder() -> ContentHashBuilder {
        ContentHashBuilder {
            hasher: Sha256::new(),
        }
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incremental content hash builder.
///
/// Fields are fed in call order. Each name and value is length-prefixed, so
/// no value can imitate a field boundary.
pub struct ContentHashBuilder {
    hasher: Sha256,
}

impl ContentHashBuilder {
    /// Feed a string field.
    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.chunk(name.as_bytes());
        self.chunk(value.as_bytes());
        self
    }

    /// Feed an integer field.
    pub fn field_int(self, name: &str, value: i64) -> Self {
        self.field(name, &value.to_string())
    }

    fn chunk(&mut self, bytes: &[u8]) {
        self.hasher.update((bytes.len() as u64).to_be_bytes());
        self.hasher.update(bytes);
    }

    /// Finalize into a hex digest.
    pub fn finish(self) -> ContentHash {
        let hash = self.hasher.finalize();
        ContentHash(format!("{hash:x}"))
    }
}

/// Order-sensitive fingerprint of a discovery plan.
pub fn plan_fingerprint<D>(plan: &[Attribution<D>]) -> ContentHash {
    plan.iter()
        .enumerate()
        .fold(
            ContentHash::builder().field_int("rows", plan.len() as i64),
            |builder, (idx, row)| {
                builder
                    .field_int("row", idx as i64)
                    .field("subject", &row.subject.to_string())
                    .field("template", &row.template)
                    .field("scope", &row.scope.to_string())
            },
        )
        .finish()
}
