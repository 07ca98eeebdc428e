//! `PackageDescriptor`: the artifact identity carried by publish/release
//! attestations (`spec.md` §3).

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub registry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>, registry: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: registry.into(),
            version: None,
            arch: None,
            distro: None,
            environment: None,
        }
    }

    /// Valid iff both `name` and `registry` are non-empty.
    pub fn validate(&self, layer: &'static str) -> Result<(), PolicyError> {
        if self.name.is_empty() {
            return Err(PolicyError::invalid_field(layer, "package name must not be empty"));
        }
        if self.registry.is_empty() {
            return Err(PolicyError::invalid_field(
                layer,
                "package registry must not be empty",
            ));
        }
        Ok(())
    }

    /// True iff `name` and `registry` match; the identity the attestation
    /// verifier compares against (`spec.md` §4.5 step 4).
    pub fn identity_eq(&self, other: &PackageDescriptor) -> bool {
        self.name == other.name && self.registry == other.registry
    }
}
