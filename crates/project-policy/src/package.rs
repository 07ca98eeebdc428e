//! [`PackageRequirement`]: one package entry inside a project policy,
//! plus the normalized environment signature used to detect cross-project
//! collisions (`spec.md` §3 invariant 2, §9 open question 2).

use crate::document::PackageRequirementWire;
use kernel::{parse_policy_package, PolicyError};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequirement {
    pub name: String,
    pub environment_any_of: Option<Vec<String>>,
}

impl PackageRequirement {
    /// `name` must parse as `registry/repository` with no tag or digest
    /// identifier attached and a registry on the allow-list (`spec.md`
    /// §4.6, end-to-end scenario S3) — the same rule
    /// [`kernel::parse_policy_package`] enforces when an attestation's
    /// package name is resolved to a [`kernel::PackageDescriptor`], kept in
    /// sync so a policy can never claim a name the descriptor side would
    /// reject. The registry segment is canonicalized so `index.docker.io`
    /// and `docker.io` always index the same package.
    pub(crate) fn from_wire(wire: PackageRequirementWire, layer: &'static str) -> Result<Self, PolicyError> {
        if wire.name.is_empty() {
            return Err(PolicyError::invalid_field(layer, "package name must not be empty"));
        }
        let parsed = parse_policy_package(&wire.name, layer)?;
        let name = format!("{}/{}", parsed.registry, parsed.repository);
        let environment_any_of = match wire.environment.and_then(|e| e.any_of) {
            Some(envs) => {
                for env in &envs {
                    if env.is_empty() {
                        return Err(PolicyError::invalid_field(
                            layer,
                            format!("package '{}' declares an empty environment entry", wire.name),
                        ));
                    }
                }
                Some(envs)
            }
            None => None,
        };
        Ok(Self { name, environment_any_of })
    }

    /// The normalized form used for set-equality comparison across
    /// policies: order doesn't matter, `{dev,prod}` and `{prod,dev}`
    /// collide (`spec.md` §9 open question 2).
    pub fn environment_signature(&self) -> Option<BTreeSet<&str>> {
        self.environment_any_of
            .as_ref()
            .map(|envs| envs.iter().map(String::as_str).collect())
    }
}
