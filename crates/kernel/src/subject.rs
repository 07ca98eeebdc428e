//! The in-toto `Subject`: what an attestation is *about* (`spec.md` §3).

use crate::digest::DigestSet;
use crate::error::PolicyError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Wire key is `digest` (singular), matching the in-toto `Subject`
    /// shape, even though it holds a set of algorithm/value pairs.
    #[serde(rename = "digest")]
    pub digests: DigestSet,
}

impl Subject {
    pub fn new(digests: DigestSet) -> Self {
        Self { name: None, digests }
    }

    pub fn named(name: impl Into<String>, digests: DigestSet) -> Self {
        Self {
            name: Some(name.into()),
            digests,
        }
    }

    /// Valid iff its digest set is valid.
    pub fn validate(&self, layer: &'static str) -> Result<(), PolicyError> {
        self.digests.validate(layer)
    }
}
