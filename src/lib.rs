//! # slsa-policy
//!
//! Facade tying the organization policy, project policy, evaluator and
//! attestation crates together into the public surface `spec.md` §1
//! describes: load policies once, evaluate publish/release/deployment
//! claims against them, and compose/verify the attestations those
//! evaluations produce and consume.
//!
//! Grounded on the teacher's `composition_root.rs`/`app_state.rs`
//! wiring: one place that owns the loaded policies and the capability
//! implementations a caller supplies, exposing narrow entry points
//! instead of handing out the individual crates' internals.

use kernel::iterator::NamedReadCloserIterator;
use kernel::{
    BuildAttestationVerifier, DigestSet, Flavor, PackageDescriptor, PolicyError, PolicyValidator,
    ReleaseAttestationVerifier, SlsaLevel, Subject,
};
use project_policy::{BuildPolicySet, DeploymentPolicySet, Protection};

pub use attestation::{BuildPredicate, Creation, DeploymentPredicate, Verification};
pub use kernel::ErrorKind;
pub use org_policy::OrganizationPolicy;
pub use project_policy::{BuildProjectPolicy, DeploymentProjectPolicy, PackageRequirement};

const LAYER: &str = "engine";

/// Owns a loaded organization policy and whichever project policy sets
/// have been loaded so far, plus the two external verifier capabilities
/// (`spec.md` §4.7). `BV`/`RV` are supplied by the caller — production
/// code plugs in a real upstream-attestation client; tests plug in a
/// `mockall` mock or [`attestation::Verification`] against
/// locally-composed bytes.
pub struct PolicyEngine<BV, RV> {
    org: OrganizationPolicy,
    publish_policies: Option<BuildPolicySet>,
    release_policies: Option<BuildPolicySet>,
    deployment_policies: Option<DeploymentPolicySet>,
    build_verifier: BV,
    release_verifier: RV,
}

impl<BV: BuildAttestationVerifier, RV: ReleaseAttestationVerifier> PolicyEngine<BV, RV> {
    /// `PolicyNew`: wires an already-loaded organization policy to the two
    /// verifier capabilities. Project policy sets are loaded afterward,
    /// independently, since a caller may only care about one subsystem.
    pub fn new(org: OrganizationPolicy, build_verifier: BV, release_verifier: RV) -> Self {
        Self {
            org,
            publish_policies: None,
            release_policies: None,
            deployment_policies: None,
            build_verifier,
            release_verifier,
        }
    }

    pub fn organization(&self) -> &OrganizationPolicy {
        &self.org
    }

    pub fn load_publish_policies(
        &mut self,
        iter: impl NamedReadCloserIterator,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<(), PolicyError> {
        self.publish_policies = Some(BuildPolicySet::load(iter, Flavor::Publish, &self.org, validator)?);
        Ok(())
    }

    pub fn load_release_policies(
        &mut self,
        iter: impl NamedReadCloserIterator,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<(), PolicyError> {
        self.release_policies = Some(BuildPolicySet::load(iter, Flavor::Release, &self.org, validator)?);
        Ok(())
    }

    pub fn load_deployment_policies(
        &mut self,
        iter: impl NamedReadCloserIterator,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<(), PolicyError> {
        self.deployment_policies = Some(DeploymentPolicySet::load(iter, &self.org, validator)?);
        Ok(())
    }

    /// `Evaluate` (publish).
    #[tracing::instrument(skip(self, digests), fields(layer = LAYER))]
    pub fn evaluate_publish(&self, package_name: &str, environment: Option<&str>, digests: &DigestSet) -> Result<SlsaLevel, PolicyError> {
        let policies = self
            .publish_policies
            .as_ref()
            .ok_or_else(|| PolicyError::invalid_input(LAYER, "no publish policies have been loaded"))?;
        policy_evaluator::BuildPolicyEvaluator::new(&self.org, policies, &self.build_verifier)
            .evaluate(package_name, environment, digests)
    }

    /// `Evaluate` (release).
    #[tracing::instrument(skip(self, digests), fields(layer = LAYER))]
    pub fn evaluate_release(&self, package_name: &str, environment: Option<&str>, digests: &DigestSet) -> Result<SlsaLevel, PolicyError> {
        let policies = self
            .release_policies
            .as_ref()
            .ok_or_else(|| PolicyError::invalid_input(LAYER, "no release policies have been loaded"))?;
        policy_evaluator::BuildPolicyEvaluator::new(&self.org, policies, &self.build_verifier)
            .evaluate(package_name, environment, digests)
    }

    /// `Evaluate` (deployment).
    #[tracing::instrument(skip(self, digests), fields(layer = LAYER))]
    pub fn evaluate_deployment(&self, policy_id: &str, package_name: &str, digests: &DigestSet) -> Result<Protection, PolicyError> {
        let policies = self
            .deployment_policies
            .as_ref()
            .ok_or_else(|| PolicyError::invalid_input(LAYER, "no deployment policies have been loaded"))?;
        policy_evaluator::DeploymentPolicyEvaluator::new(&self.org, policies, &self.release_verifier)
            .evaluate(policy_id, package_name, digests)
    }
}

/// `AttestationNew` (publish/release): composes a build attestation
/// already carrying the evaluator's SLSA level, in safe mode.
pub fn compose_build_attestation(
    flavor: Flavor,
    subject: Vec<Subject>,
    package: PackageDescriptor,
    builder_id: impl Into<String>,
    repository_uri: impl Into<String>,
    level: SlsaLevel,
) -> Result<Creation<BuildPredicate>, PolicyError> {
    let predicate = BuildPredicate::new(package, builder_id, repository_uri);
    Creation::from_evaluation(flavor.predicate_type(), subject, predicate, level.value())
}

/// `AttestationNew` (deployment). `scope_value` is the principal the
/// deployment is scoped to — `evaluate_deployment`'s resulting
/// [`Protection::service_account`].
pub fn compose_deployment_attestation(
    subject: Vec<Subject>,
    package: PackageDescriptor,
    releaser_id: impl Into<String>,
    scope_value: impl Into<String>,
    environment: Option<String>,
    level: SlsaLevel,
) -> Result<Creation<DeploymentPredicate>, PolicyError> {
    let mut predicate = DeploymentPredicate::new(package, releaser_id, scope_value);
    predicate.environment = environment;
    Creation::from_evaluation(Flavor::Deployment.predicate_type(), subject, predicate, level.value())
}

/// `Verify` (publish/release).
pub fn verify_build_attestation(
    bytes: &[u8],
    flavor: Flavor,
    expected_package: &PackageDescriptor,
    expected_digests: &DigestSet,
    expected_builder_id: &str,
    required_level: SlsaLevel,
) -> Result<(), PolicyError> {
    Verification::verify_build(bytes, flavor, expected_package, expected_digests, expected_builder_id, required_level.value())
}

/// `Verify` (deployment).
pub fn verify_deployment_attestation(
    bytes: &[u8],
    expected_package: &PackageDescriptor,
    expected_digests: &DigestSet,
    env_list: &[String],
    expected_releaser_id: &str,
    required_level: SlsaLevel,
) -> Result<Option<String>, PolicyError> {
    Verification::verify_deployment(bytes, expected_package, expected_digests, env_list, expected_releaser_id, required_level.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::iterator::slice::SliceIterator;
    use mockall::mock;

    mock! {
        BuildVerifier {}
        impl BuildAttestationVerifier for BuildVerifier {
            fn verify_build_attestation(&self, digests: &DigestSet, package_name: &str, builder_id: &str, source_repo_uri: &str) -> Result<(), PolicyError>;
        }
    }

    mock! {
        ReleaseVerifier {}
        impl ReleaseAttestationVerifier for ReleaseVerifier {
            fn verify_release_attestation(&self, digests: &DigestSet, package_name: &str, env_list: &[String], releaser_id: &str, required_level: u8) -> Result<Option<String>, PolicyError>;
        }
    }

    fn org() -> OrganizationPolicy {
        OrganizationPolicy::from_bytes(
            br#"{"format":1,"roots":{
                "build":[{"id":"id-b1","name":"builder1","max_slsa_level":3}],
                "publish":[{"id":"id-r1","max_slsa_level":3}]
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn end_to_end_publish_evaluate_and_attest() {
        let org = org();
        let mut build_verifier = MockBuildVerifier::new();
        build_verifier.expect_verify_build_attestation().returning(|_, _, _, _| Ok(()));
        let release_verifier = MockReleaseVerifier::new();

        let mut engine = PolicyEngine::new(org, build_verifier, release_verifier);
        let doc = br#"{"format":1,"package":{"name":"docker.io/org/repo"},"build":{"require_slsa_builder":"builder1","repository":{"uri":"https://example.com/repo"}}}"#.to_vec();
        engine
            .load_publish_policies(SliceIterator::new(vec![("p1".into(), doc)]), None)
            .unwrap();

        let digests = DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]);
        let level = engine.evaluate_publish("docker.io/org/repo", None, &digests).unwrap();
        assert_eq!(level.value(), 3);

        let package = PackageDescriptor::new("org/repo", "docker.io");
        let creation = compose_build_attestation(
            Flavor::Publish,
            vec![Subject::new(digests.clone())],
            package.clone(),
            "id-b1",
            "https://example.com/repo",
            level,
        )
        .unwrap();
        let bytes = creation.to_bytes().unwrap();

        verify_build_attestation(&bytes, Flavor::Publish, &package, &digests, "id-b1", SlsaLevel::new(2).unwrap()).unwrap();
    }

    #[test]
    fn evaluate_without_loaded_policies_is_invalid_input() {
        let org = org();
        let engine = PolicyEngine::new(org, MockBuildVerifier::new(), MockReleaseVerifier::new());
        let digests = DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]);
        let err = engine.evaluate_publish("docker.io/org/repo", None, &digests).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
