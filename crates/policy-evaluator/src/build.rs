//! Publish/release evaluation: one package claim, one attestation check,
//! one achieved [`SlsaLevel`] (`spec.md` §4.3 Publish/Release).

use kernel::{BuildAttestationVerifier, DigestSet, PolicyError, SlsaLevel};
use org_policy::OrganizationPolicy;
use project_policy::BuildPolicySet;
use tracing::{info, instrument};

/// Evaluates publish or release claims against a loaded
/// [`OrganizationPolicy`], [`BuildPolicySet`] and upstream attestation
/// verifier.
pub struct BuildPolicyEvaluator<'a, V> {
    org: &'a OrganizationPolicy,
    projects: &'a BuildPolicySet,
    verifier: &'a V,
}

impl<'a, V: BuildAttestationVerifier> BuildPolicyEvaluator<'a, V> {
    pub fn new(org: &'a OrganizationPolicy, projects: &'a BuildPolicySet, verifier: &'a V) -> Self {
        Self { org, projects, verifier }
    }

    /// `spec.md` §4.3 Publish/Release steps:
    /// 1. Resolve the project policy for `package_name` (narrowed by
    ///    `environment` when the package name is ambiguous).
    /// 2. Resolve its `require_slsa_builder` to a trusted build root.
    /// 3. Ask the upstream verifier to confirm a matching build attestation
    ///    exists, signed by that builder, for that source repository.
    /// 4. The achieved level is the builder's own trust ceiling.
    #[instrument(skip(self, digests), fields(layer = %self.projects.flavor()))]
    pub fn evaluate(&self, package_name: &str, environment: Option<&str>, digests: &DigestSet) -> Result<SlsaLevel, PolicyError> {
        let layer = self.projects.flavor().layer_name();
        let (policy, _requirement) = self.projects.find(package_name, environment)?;

        let builder_id = self.org.builder_id(&policy.require_slsa_builder)?;
        let builder_level = self.org.builder_slsa_level(&policy.require_slsa_builder);
        if builder_level < 0 {
            return Err(PolicyError::internal(layer, "resolved builder has no recorded trust level"));
        }

        self.verifier
            .verify_build_attestation(digests, package_name, builder_id, &policy.repository_uri)?;

        let level = SlsaLevel::new(builder_level as u8)?;
        info!(package_name, builder_id, level = %level, "build attestation verified");
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::iterator::slice::SliceIterator;
    use kernel::Flavor;
    use mockall::mock;

    mock! {
        Verifier {}
        impl BuildAttestationVerifier for Verifier {
            fn verify_build_attestation(&self, digests: &DigestSet, package_name: &str, builder_id: &str, source_repo_uri: &str) -> Result<(), PolicyError>;
        }
    }

    fn org() -> OrganizationPolicy {
        OrganizationPolicy::from_bytes(
            br#"{"format":1,"roots":{"build":[{"id":"id-b1","name":"builder1","max_slsa_level":3}]}}"#,
        )
        .unwrap()
    }

    fn projects(org: &OrganizationPolicy) -> BuildPolicySet {
        let doc = br#"{"format":1,"package":{"name":"docker.io/org/repo"},"build":{"require_slsa_builder":"builder1","repository":{"uri":"https://example.com/repo"}}}"#.to_vec();
        let iter = SliceIterator::new(vec![("p1".into(), doc)]);
        BuildPolicySet::load(iter, Flavor::Publish, org, None).unwrap()
    }

    #[test]
    fn evaluates_to_builder_trust_level() {
        let org = org();
        let projects = projects(&org);
        let mut verifier = MockVerifier::new();
        verifier
            .expect_verify_build_attestation()
            .withf(|_, name, builder_id, uri| name == "docker.io/org/repo" && builder_id == "id-b1" && uri == "https://example.com/repo")
            .returning(|_, _, _, _| Ok(()));

        let evaluator = BuildPolicyEvaluator::new(&org, &projects, &verifier);
        let level = evaluator
            .evaluate("docker.io/org/repo", None, &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .unwrap();
        assert_eq!(level.value(), 3);
    }

    #[test]
    fn propagates_verifier_rejection() {
        let org = org();
        let projects = projects(&org);
        let mut verifier = MockVerifier::new();
        verifier
            .expect_verify_build_attestation()
            .returning(|_, _, _, _| Err(PolicyError::verification("publish", "no matching attestation")));

        let evaluator = BuildPolicyEvaluator::new(&org, &projects, &verifier);
        let err = evaluator
            .evaluate("docker.io/org/repo", None, &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::Verification);
    }

    #[test]
    fn unknown_package_is_not_found() {
        let org = org();
        let projects = projects(&org);
        let verifier = MockVerifier::new();
        let evaluator = BuildPolicyEvaluator::new(&org, &projects, &verifier);
        let err = evaluator
            .evaluate("docker.io/org/unknown", None, &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::NotFound);
    }

    #[test]
    fn omitting_environment_against_a_scoped_policy_is_invalid_input() {
        let org = org();
        let doc = br#"{"format":1,"package":{"name":"docker.io/org/repo","environment":{"any_of":["dev","prod"]}},"build":{"require_slsa_builder":"builder1","repository":{"uri":"https://example.com/repo"}}}"#.to_vec();
        let iter = SliceIterator::new(vec![("p1".into(), doc)]);
        let projects = BuildPolicySet::load(iter, Flavor::Publish, &org, None).unwrap();
        let verifier = MockVerifier::new();
        let evaluator = BuildPolicyEvaluator::new(&org, &projects, &verifier);
        let err = evaluator
            .evaluate("docker.io/org/repo", None, &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::InvalidInput);
    }

    #[test]
    fn unmatched_environment_against_a_scoped_policy_is_not_found() {
        let org = org();
        let doc = br#"{"format":1,"package":{"name":"docker.io/org/repo","environment":{"any_of":["dev","prod"]}},"build":{"require_slsa_builder":"builder1","repository":{"uri":"https://example.com/repo"}}}"#.to_vec();
        let iter = SliceIterator::new(vec![("p1".into(), doc)]);
        let projects = BuildPolicySet::load(iter, Flavor::Publish, &org, None).unwrap();
        let verifier = MockVerifier::new();
        let evaluator = BuildPolicyEvaluator::new(&org, &projects, &verifier);
        let err = evaluator
            .evaluate("docker.io/org/repo", Some("staging"), &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::NotFound);
    }
}
