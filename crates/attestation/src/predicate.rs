//! Predicate bodies for the publish/release and deployment flavors
//! (`spec.md` §3, §9 REDESIGN FLAGS).
//!
//! Publish and release share one shape — they differ only in which
//! `predicate_type` URI wraps them (`kernel::Flavor::predicate_type`) —
//! so there is one [`BuildPredicate`] type, not two.

use kernel::PackageDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderIdentity {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub uri: String,
}

/// `predicate.properties` carries the one recognized key, `slsa.dev/build/level`
/// (`spec.md` §3, §4.5 step 6). Nested rather than a top-level renamed
/// field so the wire shape matches `properties["slsa.dev/build/level"]`
/// exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(rename = "slsa.dev/build/level", skip_serializing_if = "Option::is_none")]
    pub slsa_build_level: Option<u8>,
}

/// The publish/release predicate (`spec.md` §3, §9 open question 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPredicate {
    #[serde(rename = "creationTime")]
    pub creation_time: String,
    pub package: PackageDescriptor,
    pub builder: BuilderIdentity,
    pub repository: RepositoryIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl BuildPredicate {
    pub fn new(package: PackageDescriptor, builder_id: impl Into<String>, repository_uri: impl Into<String>) -> Self {
        Self {
            creation_time: chrono::Utc::now().to_rfc3339(),
            package,
            builder: BuilderIdentity { id: builder_id.into() },
            repository: RepositoryIdentity { uri: repository_uri.into() },
            properties: None,
        }
    }
}

/// The single recognized deployment `scopes` key (`spec.md` §3).
pub const DEPLOYMENT_SCOPE_KEY: &str = "cloud.google.com/service_account/v1";

/// The deployment predicate: `{creationTime, scopes}` per `spec.md` §3,
/// generalized with the releaser/package/environment fields the
/// evaluator needs to verify a claim symmetrically — the "per-flavor
/// predicate struct" `spec.md` §9 invites rather than forcing publish and
/// deployment to share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentPredicate {
    #[serde(rename = "creationTime")]
    pub creation_time: String,
    pub package: PackageDescriptor,
    pub releaser: BuilderIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    pub scopes: BTreeMap<String, String>,
}

impl DeploymentPredicate {
    /// `scope_value` is the principal the deployment is scoped to (the
    /// service account's identity), recorded under
    /// [`DEPLOYMENT_SCOPE_KEY`].
    pub fn new(package: PackageDescriptor, releaser_id: impl Into<String>, scope_value: impl Into<String>) -> Self {
        let mut scopes = BTreeMap::new();
        scopes.insert(DEPLOYMENT_SCOPE_KEY.to_string(), scope_value.into());
        Self {
            creation_time: chrono::Utc::now().to_rfc3339(),
            package,
            releaser: BuilderIdentity { id: releaser_id.into() },
            environment: None,
            properties: None,
            scopes,
        }
    }
}

/// Lets the composer apply the evaluated SLSA level uniformly to either
/// predicate shape (`spec.md` §4.4).
pub trait HasSlsaBuildLevel {
    fn set_slsa_build_level(&mut self, level: u8);
    fn slsa_build_level(&self) -> Option<u8>;
}

impl HasSlsaBuildLevel for BuildPredicate {
    fn set_slsa_build_level(&mut self, level: u8) {
        self.properties.get_or_insert_with(Properties::default).slsa_build_level = Some(level);
    }

    fn slsa_build_level(&self) -> Option<u8> {
        self.properties.as_ref().and_then(|p| p.slsa_build_level)
    }
}

impl HasSlsaBuildLevel for DeploymentPredicate {
    fn set_slsa_build_level(&mut self, level: u8) {
        self.properties.get_or_insert_with(Properties::default).slsa_build_level = Some(level);
    }

    fn slsa_build_level(&self) -> Option<u8> {
        self.properties.as_ref().and_then(|p| p.slsa_build_level)
    }
}
