//! Publish/release project policy: one [`kernel::Flavor`]-parameterized
//! type instead of two near-identical trees (`spec.md` §9 REDESIGN FLAGS).

use crate::document::BuildProjectDocument;
use crate::package::PackageRequirement;
use kernel::iterator::NamedReadCloserIterator;
use kernel::{drain_named, Flavor, PolicyError, PolicyValidator};
use org_policy::OrganizationPolicy;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument};

const LAYER: &str = "project";

/// A validated publish or release project policy (`spec.md` §3, §4.3).
#[derive(Debug, Clone)]
pub struct BuildProjectPolicy {
    pub id: String,
    pub flavor: Flavor,
    pub packages: Vec<PackageRequirement>,
    pub require_slsa_builder: String,
    pub repository_uri: String,
}

impl BuildProjectPolicy {
    fn from_document(
        id: String,
        flavor: Flavor,
        document: BuildProjectDocument,
        org: &OrganizationPolicy,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<Self, PolicyError> {
        if document.format != 1 {
            return Err(PolicyError::invalid_field(
                LAYER,
                format!("unsupported format {}, expected 1", document.format),
            ));
        }

        let wires = match (document.package, document.packages) {
            (Some(single), None) => vec![single],
            (None, Some(many)) => many,
            (Some(_), Some(_)) => {
                return Err(PolicyError::invalid_field(
                    LAYER,
                    "a project policy must declare either 'package' or 'packages', not both",
                ));
            }
            (None, None) => {
                return Err(PolicyError::invalid_field(LAYER, "a project policy must declare at least one package"));
            }
        };

        if wires.is_empty() {
            return Err(PolicyError::invalid_field(LAYER, "a project policy must declare at least one package"));
        }

        let mut packages = Vec::with_capacity(wires.len());
        let mut seen_names = HashSet::new();
        for wire in wires {
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

        if document.build.require_slsa_builder.is_empty() {
            return Err(PolicyError::invalid_field(LAYER, "require_slsa_builder must not be empty"));
        }
        if !org
            .root_builder_names()
            .contains(&document.build.require_slsa_builder.as_str())
        {
            return Err(PolicyError::invalid_field(
                LAYER,
                format!(
                    "require_slsa_builder '{}' is not a trusted build root",
                    document.build.require_slsa_builder
                ),
            ));
        }
        if document.build.repository.uri.is_empty() {
            return Err(PolicyError::invalid_field(LAYER, "repository.uri must not be empty"));
        }

        Ok(Self {
            id,
            flavor,
            packages,
            require_slsa_builder: document.build.require_slsa_builder,
            repository_uri: document.build.repository.uri,
        })
    }
}

/// An indexed, cross-validated collection of publish or release project
/// policies, all of the same [`Flavor`] (`spec.md` §4.1, §3 invariant 2).
#[derive(Debug)]
pub struct BuildPolicySet {
    flavor: Flavor,
    by_id: HashMap<String, BuildProjectPolicy>,
    by_package: HashMap<String, Vec<(String, usize)>>,
}

impl BuildPolicySet {
    #[instrument(skip(iter, org, validator, flavor), fields(layer = LAYER, flavor = %flavor))]
    pub fn load(
        iter: impl NamedReadCloserIterator,
        flavor: Flavor,
        org: &OrganizationPolicy,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<Self, PolicyError> {
        assert!(
            matches!(flavor, Flavor::Publish | Flavor::Release),
            "BuildPolicySet only loads Publish or Release flavors"
        );

        let documents = drain_named(iter, LAYER)?;
        let mut by_id = HashMap::with_capacity(documents.len());
        for (id, bytes) in documents {
            if by_id.contains_key(&id) {
                return Err(PolicyError::invalid_field(LAYER, format!("duplicate policy id '{id}'")));
            }
            let document: BuildProjectDocument = serde_json::from_slice(&bytes)
                .map_err(|e| PolicyError::invalid_field(LAYER, format!("policy '{id}' has malformed JSON: {e}")))?;
            let policy = BuildProjectPolicy::from_document(id.clone(), flavor, document, org, validator)?;
            by_id.insert(id, policy);
        }

        if by_id.is_empty() {
            return Err(PolicyError::invalid_field(LAYER, "no project policies were supplied"));
        }

        let by_package = Self::index_packages(&by_id)?;
        debug!(policy_count = by_id.len(), "loaded project policies");
        Ok(Self { flavor, by_id, by_package })
    }

    /// Enforces `spec.md` §9 open question 2: across every project policy in
    /// the set, a package name claimed with no environment constraint may
    /// not also be claimed (with or without one) by any other policy, and no
    /// two policies may claim the same name with an identical environment
    /// set.
    fn index_packages(
        by_id: &HashMap<String, BuildProjectPolicy>,
    ) -> Result<HashMap<String, Vec<(String, usize)>>, PolicyError> {
        let mut by_package: HashMap<String, Vec<(String, usize)>> = HashMap::new();
        let mut signatures: HashMap<&str, Vec<Option<BTreeSet<&str>>>> = HashMap::new();

        let mut ids: Vec<_> = by_id.keys().collect();
        ids.sort();
        for id in ids {
            let policy = &by_id[id];
            for (idx, requirement) in policy.packages.iter().enumerate() {
                let signature = requirement.environment_signature();
                let existing = signatures.entry(requirement.name.as_str()).or_default();
                if !existing.is_empty() && (signature.is_none() || existing.iter().any(|s| s.is_none())) {
                    return Err(PolicyError::invalid_field(
                        LAYER,
                        format!(
                            "package '{}' is claimed by multiple project policies with an unconstrained environment",
                            requirement.name
                        ),
                    ));
                }
                if existing.contains(&signature) {
                    return Err(PolicyError::invalid_field(
                        LAYER,
                        format!(
                            "package '{}' is claimed by more than one project policy with the same environment set",
                            requirement.name
                        ),
                    ));
                }
                existing.push(signature);
                by_package
                    .entry(requirement.name.clone())
                    .or_default()
                    .push((id.clone(), idx));
            }
        }
        Ok(by_package)
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn policy(&self, id: &str) -> Option<&BuildProjectPolicy> {
        self.by_id.get(id)
    }

    /// Finds the project policy and package requirement matching
    /// `package_name`, narrowed to `environment` when more than one
    /// requirement claims that name (`spec.md` §4.3 Publish/Release steps
    /// 1-3): absent package is `NotFound`; a present/absent `environment`
    /// that disagrees with whether the policy defines one at all is
    /// `InvalidInput`; an `environment` that doesn't appear in `any_of` is
    /// `NotFound`.
    pub fn find(&self, package_name: &str, environment: Option<&str>) -> Result<(&BuildProjectPolicy, &PackageRequirement), PolicyError> {
        let layer = self.flavor.layer_name();
        let candidates = self
            .by_package
            .get(package_name)
            .ok_or_else(|| PolicyError::not_found(layer, format!("no {} project policy for package '{package_name}'", self.flavor)))?;

        let defines_environment = candidates
            .iter()
            .any(|(id, idx)| self.by_id[id].packages[*idx].environment_any_of.is_some());
        if defines_environment != environment.is_some() {
            return Err(PolicyError::invalid_input(
                layer,
                format!("package '{package_name}' requires an environment to be {}specified", if defines_environment { "" } else { "un" }),
            ));
        }

        for (id, idx) in candidates {
            let policy = &self.by_id[id];
            let requirement = &policy.packages[*idx];
            let matches = match (&requirement.environment_any_of, environment) {
                (None, None) => true,
                (Some(envs), Some(env)) => envs.iter().any(|e| e == env),
                _ => false,
            };
            if matches {
                return Ok((policy, requirement));
            }
        }
        Err(PolicyError::not_found(
            layer,
            format!("package '{package_name}' has no project policy permitting environment {environment:?}"),
        ))
    }

    pub fn describe(&self) -> Vec<&BuildProjectPolicy> {
        let mut policies: Vec<_> = self.by_id.values().collect();
        policies.sort_by(|a, b| a.id.cmp(&b.id));
        policies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::iterator::slice::SliceIterator;

    fn org_with_builder() -> OrganizationPolicy {
        OrganizationPolicy::from_bytes(
            br#"{"format":1,"roots":{"build":[{"id":"id-b1","name":"builder1","max_slsa_level":3}]}}"#,
        )
        .unwrap()
    }

    fn publish_doc(name: &str) -> Vec<u8> {
        format!(
            r#"{{"format":1,"package":{{"name":"{name}"}},"build":{{"require_slsa_builder":"builder1","repository":{{"uri":"https://example.com/repo"}}}}}}"#
        )
        .into_bytes()
    }

    #[test]
    fn loads_single_publish_policy() {
        let org = org_with_builder();
        let iter = SliceIterator::new(vec![("p1".into(), publish_doc("docker.io/org/repo"))]);
        let set = BuildPolicySet::load(iter, Flavor::Publish, &org, None).unwrap();
        assert!(set.find("docker.io/org/repo", None).is_ok());
    }

    #[test]
    fn rejects_unknown_builder() {
        let org = org_with_builder();
        let doc = br#"{"format":1,"package":{"name":"docker.io/org/repo"},"build":{"require_slsa_builder":"nope","repository":{"uri":"https://x"}}}"#.to_vec();
        let iter = SliceIterator::new(vec![("p1".into(), doc)]);
        assert!(BuildPolicySet::load(iter, Flavor::Publish, &org, None).is_err());
    }

    #[test]
    fn rejects_unconstrained_collision_across_policies() {
        let org = org_with_builder();
        let iter = SliceIterator::new(vec![
            ("p1".into(), publish_doc("docker.io/org/repo")),
            ("p2".into(), publish_doc("docker.io/org/repo")),
        ]);
        assert!(BuildPolicySet::load(iter, Flavor::Publish, &org, None).is_err());
    }

    #[test]
    fn allows_distinct_environment_sets_for_same_name() {
        let org = org_with_builder();
        let doc_dev = br#"{"format":1,"package":{"name":"docker.io/org/repo","environment":{"any_of":["dev"]}},"build":{"require_slsa_builder":"builder1","repository":{"uri":"https://x"}}}"#.to_vec();
        let doc_prod = br#"{"format":1,"package":{"name":"docker.io/org/repo","environment":{"any_of":["prod"]}},"build":{"require_slsa_builder":"builder1","repository":{"uri":"https://x"}}}"#.to_vec();
        let iter = SliceIterator::new(vec![("p1".into(), doc_dev), ("p2".into(), doc_prod)]);
        let set = BuildPolicySet::load(iter, Flavor::Publish, &org, None).unwrap();
        assert!(set.find("docker.io/org/repo", Some("dev")).is_ok());
        assert!(set.find("docker.io/org/repo", Some("prod")).is_ok());
    }

    #[test]
    fn rejects_same_environment_set_reused_across_policies() {
        let org = org_with_builder();
        let doc = br#"{"format":1,"package":{"name":"docker.io/org/repo","environment":{"any_of":["dev","prod"]}},"build":{"require_slsa_builder":"builder1","repository":{"uri":"https://x"}}}"#.to_vec();
        let doc_reordered = br#"{"format":1,"package":{"name":"docker.io/org/repo","environment":{"any_of":["prod","dev"]}},"build":{"require_slsa_builder":"builder1","repository":{"uri":"https://x"}}}"#.to_vec();
        let iter = SliceIterator::new(vec![("p1".into(), doc), ("p2".into(), doc_reordered)]);
        assert!(BuildPolicySet::load(iter, Flavor::Publish, &org, None).is_err());
    }

    #[test]
    fn honors_validator_rejection() {
        use mockall::mock;

        mock! {
            Validator {}
            impl PolicyValidator for Validator {
                fn validate_package<'a>(&self, name: &str, environment_any_of: Option<&'a [String]>) -> Result<(), PolicyError>;
            }
        }

        let org = org_with_builder();
        let mut validator = MockValidator::new();
        validator
            .expect_validate_package()
            .withf(|name, _| name == "docker.io/org/repo")
            .returning(|_, _| Err(PolicyError::invalid_field("project", "package not on organization allow-list")));

        let iter = SliceIterator::new(vec![("p1".into(), publish_doc("docker.io/org/repo"))]);
        assert!(BuildPolicySet::load(iter, Flavor::Publish, &org, Some(&validator)).is_err());
    }
}
