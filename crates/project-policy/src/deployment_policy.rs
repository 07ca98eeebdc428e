//! Deployment project policy: binds a target principal to the packages and
//! minimum SLSA level it may deploy (`spec.md` §3, §4.3).

use crate::document::DeploymentProjectDocument;
use crate::package::PackageRequirement;
use kernel::iterator::NamedReadCloserIterator;
use kernel::{drain_named, PolicyError, PolicyValidator, SlsaLevel};
use org_policy::OrganizationPolicy;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument};

const LAYER: &str = "project";

/// The target principal a deployment policy authorizes, e.g. a CI service
/// account (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protection {
    pub service_account: String,
}

#[derive(Debug, Clone)]
pub struct DeploymentProjectPolicy {
    pub id: String,
    pub protection: Protection,
    pub packages: Vec<PackageRequirement>,
    pub require_slsa_level: SlsaLevel,
}

impl DeploymentProjectPolicy {
    fn from_document(
        id: String,
        document: DeploymentProjectDocument,
        org: &OrganizationPolicy,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<Self, PolicyError> {
        if document.format != 1 {
            return Err(PolicyError::invalid_field(
                LAYER,
                format!("unsupported format {}, expected 1", document.format),
            ));
        }
        if document.protection.service_account.is_empty() {
            return Err(PolicyError::invalid_field(LAYER, "protection.service_account must not be empty"));
        }
        if document.packages.is_empty() {
            return Err(PolicyError::invalid_field(LAYER, "a deployment policy must declare at least one package"));
        }

        let mut packages = Vec::with_capacity(document.packages.len());
        let mut seen_names = HashSet::new();
        for wire in document.packages {
            let requirement = PackageRequirement::from_wire(wire, LAYER)?;
            if !seen_names.insert(requirement.name.clone()) {
                return Err(PolicyError::invalid_field(
                    LAYER,
                    format!("package name '{}' repeated within policy '{id}'", requirement.name),
                ));
            }
            if let Some(validator) = validator {
                validator.validate_package(&requirement.name, requirement.environment_any_of.as_deref())?;
            }
            packages.push(requirement);
        }

        let require_slsa_level = SlsaLevel::new(document.build.require_slsa_level)?;
        let max_release_level = org.max_release_slsa_level();
        if max_release_level >= 0 && require_slsa_level.value() as i32 > max_release_level {
            return Err(PolicyError::invalid_field(
                LAYER,
                format!(
                    "require_slsa_level {} exceeds the organization's maximum release trust level {max_release_level}",
                    require_slsa_level.value()
                ),
            ));
        }

        Ok(Self {
            id,
            protection: Protection {
                service_account: document.protection.service_account,
            },
            packages,
            require_slsa_level,
        })
    }
}

/// An indexed, cross-validated collection of deployment project policies
/// (`spec.md` §4.1, §3 invariant 2).
#[derive(Debug)]
pub struct DeploymentPolicySet {
    by_id: HashMap<String, DeploymentProjectPolicy>,
}

impl DeploymentPolicySet {
    #[instrument(skip(iter, org, validator), fields(layer = LAYER))]
    pub fn load(
        iter: impl NamedReadCloserIterator,
        org: &OrganizationPolicy,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<Self, PolicyError> {
        let documents = drain_named(iter, LAYER)?;
        let mut by_id = HashMap::with_capacity(documents.len());
        for (id, bytes) in documents {
            if by_id.contains_key(&id) {
                return Err(PolicyError::invalid_field(LAYER, format!("duplicate policy id '{id}'")));
            }
            let document: DeploymentProjectDocument = serde_json::from_slice(&bytes)
                .map_err(|e| PolicyError::invalid_field(LAYER, format!("policy '{id}' has malformed JSON: {e}")))?;
            let policy = DeploymentProjectPolicy::from_document(id.clone(), document, org, validator)?;
            by_id.insert(id, policy);
        }

        if by_id.is_empty() {
            return Err(PolicyError::invalid_field(LAYER, "no project policies were supplied"));
        }

        Self::validate_cross_policy(&by_id)?;
        debug!(policy_count = by_id.len(), "loaded deployment project policies");
        Ok(Self { by_id })
    }

    /// `spec.md` §3 invariant 2: every principal is unique across the whole
    /// set, and a package name claimed with no environment constraint can't
    /// also be claimed by another policy (§9 open question 2).
    fn validate_cross_policy(by_id: &HashMap<String, DeploymentProjectPolicy>) -> Result<(), PolicyError> {
        let mut seen_principals = HashSet::new();
        let mut signatures: HashMap<&str, Vec<Option<BTreeSet<&str>>>> = HashMap::new();

        let mut ids: Vec<_> = by_id.keys().collect();
        ids.sort();
        for id in ids {
            let policy = &by_id[id];
            if !seen_principals.insert(policy.protection.service_account.as_str()) {
                return Err(PolicyError::invalid_field(
                    LAYER,
                    format!(
                        "service_account '{}' is protected by more than one deployment policy",
                        policy.protection.service_account
                    ),
                ));
            }
            for requirement in &policy.packages {
                let signature = requirement.environment_signature();
                let existing = signatures.entry(requirement.name.as_str()).or_default();
                if !existing.is_empty() && (signature.is_none() || existing.iter().any(|s| s.is_none())) {
                    return Err(PolicyError::invalid_field(
                        LAYER,
                        format!(
                            "package '{}' is claimed by multiple deployment policies with an unconstrained environment",
                            requirement.name
                        ),
                    ));
                }
                if existing.contains(&signature) {
                    return Err(PolicyError::invalid_field(
                        LAYER,
                        format!(
                            "package '{}' is claimed by more than one deployment policy with the same environment set",
                            requirement.name
                        ),
                    ));
                }
                existing.push(signature);
            }
        }
        Ok(())
    }

    pub fn by_id(&self, id: &str) -> Option<&DeploymentProjectPolicy> {
        self.by_id.get(id)
    }

    /// Resolves `policy_id` to a policy, then that policy's package
    /// sub-entry for `package_name` (`spec.md` §4.3 Deployment steps 1-2).
    pub fn find(&self, policy_id: &str, package_name: &str) -> Option<(&DeploymentProjectPolicy, &PackageRequirement)> {
        let policy = self.by_id.get(policy_id)?;
        let requirement = policy.packages.iter().find(|p| p.name == package_name)?;
        Some((policy, requirement))
    }

    pub fn describe(&self) -> Vec<&DeploymentProjectPolicy> {
        let mut policies: Vec<_> = self.by_id.values().collect();
        policies.sort_by(|a, b| a.id.cmp(&b.id));
        policies
    }
}
