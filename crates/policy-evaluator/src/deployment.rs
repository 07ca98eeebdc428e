//! Deployment evaluation: the one evaluator that must try more than one
//! trusted root before giving up (`spec.md` §4.3 Deployment, §5 ordering).

use kernel::{DigestSet, PolicyError, ReleaseAttestationVerifier};
use org_policy::OrganizationPolicy;
use project_policy::{DeploymentPolicySet, Protection};
use tracing::{info, instrument, warn};

pub struct DeploymentPolicyEvaluator<'a, V> {
    org: &'a OrganizationPolicy,
    projects: &'a DeploymentPolicySet,
    verifier: &'a V,
}

impl<'a, V: ReleaseAttestationVerifier> DeploymentPolicyEvaluator<'a, V> {
    pub fn new(org: &'a OrganizationPolicy, projects: &'a DeploymentPolicySet, verifier: &'a V) -> Self {
        Self { org, projects, verifier }
    }

    /// `spec.md` §4.3 Deployment steps:
    /// 1. Resolve the deployment policy named `policy_id`.
    /// 2. Fetch its package sub-entry for `package_name`.
    /// 3. Try every release root whose `max_slsa_level` meets
    ///    `policy.require_slsa_level`, in declared order (`roots.publish`
    ///    then `roots.release`); the first one the verifier accepts wins.
    /// 4. If every root rejects the claim, fold the per-root errors into
    ///    one aggregate `Verification` error.
    /// 6. On success, the verifier's `verified_env` must be consistent
    ///    with the policy's permitted environments, or the result is
    ///    `Internal` — the verifier agreeing to a claim our own policy
    ///    never permitted is a bug in the capability, not a rejection.
    #[instrument(skip(self, digests))]
    pub fn evaluate(&self, policy_id: &str, package_name: &str, digests: &DigestSet) -> Result<Protection, PolicyError> {
        const LAYER: &str = "deployment";
        let (policy, requirement) = self.projects.find(policy_id, package_name).ok_or_else(|| {
            PolicyError::not_found(LAYER, format!("no deployment policy '{policy_id}' claims package '{package_name}'"))
        })?;

        let env_list = requirement.environment_any_of.clone().unwrap_or_default();
        let required_level = policy.require_slsa_level.value();

        let mut causes = Vec::new();
        for root in self.org.release_roots() {
            if (root.max_slsa_level.value()) < required_level {
                continue;
            }
            match self
                .verifier
                .verify_release_attestation(digests, package_name, &env_list, &root.id, required_level)
            {
                Ok(matched_environment) => {
                    if !Self::verified_env_consistent(&env_list, matched_environment.as_deref()) {
                        return Err(PolicyError::internal(
                            LAYER,
                            format!(
                                "verifier returned environment {matched_environment:?} inconsistent with policy environments {env_list:?}"
                            ),
                        ));
                    }
                    info!(package_name, root_id = %root.id, environment = ?matched_environment, "release attestation verified");
                    return Ok(policy.protection.clone());
                }
                Err(e) => {
                    warn!(package_name, root_id = %root.id, error = %e, "trusted root rejected release attestation");
                    causes.push(e);
                }
            }
        }
        Err(PolicyError::verification_aggregate(LAYER, causes))
    }

    fn verified_env_consistent(env_list: &[String], matched_environment: Option<&str>) -> bool {
        match matched_environment {
            Some(env) => !env_list.is_empty() && env_list.iter().any(|e| e == env),
            None => env_list.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::iterator::slice::SliceIterator;
    use mockall::mock;

    mock! {
        Verifier {}
        impl ReleaseAttestationVerifier for Verifier {
            fn verify_release_attestation(&self, digests: &DigestSet, package_name: &str, env_list: &[String], releaser_id: &str, required_level: u8) -> Result<Option<String>, PolicyError>;
        }
    }

    fn org_two_roots() -> OrganizationPolicy {
        OrganizationPolicy::from_bytes(
            br#"{"format":1,"roots":{
                "publish":[{"id":"id-pub","max_slsa_level":3}],
                "release":[{"id":"id-legacy","max_slsa_level":3}]
            }}"#,
        )
        .unwrap()
    }

    fn projects(org: &OrganizationPolicy) -> DeploymentPolicySet {
        let doc = br#"{"format":1,"protection":{"service_account":"sa@project.iam"},"packages":[{"name":"docker.io/org/repo"}],"build":{"require_slsa_level":2}}"#.to_vec();
        let iter = SliceIterator::new(vec![("d1".into(), doc)]);
        DeploymentPolicySet::load(iter, org, None).unwrap()
    }

    #[test]
    fn succeeds_when_first_root_verifies() {
        let org = org_two_roots();
        let projects = projects(&org);
        let mut verifier = MockVerifier::new();
        verifier
            .expect_verify_release_attestation()
            .withf(|_, _, _, releaser_id, _| releaser_id == "id-pub")
            .returning(|_, _, _, _, _| Ok(None));

        let evaluator = DeploymentPolicyEvaluator::new(&org, &projects, &verifier);
        let protection = evaluator
            .evaluate("d1", "docker.io/org/repo", &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .unwrap();
        assert_eq!(protection.service_account, "sa@project.iam");
    }

    #[test]
    fn falls_through_to_second_root_on_first_rejection() {
        let org = org_two_roots();
        let projects = projects(&org);
        let mut verifier = MockVerifier::new();
        verifier
            .expect_verify_release_attestation()
            .withf(|_, _, _, releaser_id, _| releaser_id == "id-pub")
            .returning(|_, _, _, _, _| Err(PolicyError::verification("deployment", "rejected by id-pub")));
        verifier
            .expect_verify_release_attestation()
            .withf(|_, _, _, releaser_id, _| releaser_id == "id-legacy")
            .returning(|_, _, _, _, _| Ok(None));

        let evaluator = DeploymentPolicyEvaluator::new(&org, &projects, &verifier);
        assert!(evaluator
            .evaluate("d1", "docker.io/org/repo", &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .is_ok());
    }

    #[test]
    fn aggregates_errors_when_every_root_rejects() {
        let org = org_two_roots();
        let projects = projects(&org);
        let mut verifier = MockVerifier::new();
        verifier
            .expect_verify_release_attestation()
            .returning(|_, _, _, releaser_id, _| Err(PolicyError::verification("deployment", format!("rejected by {releaser_id}"))));

        let evaluator = DeploymentPolicyEvaluator::new(&org, &projects, &verifier);
        let err = evaluator
            .evaluate("d1", "docker.io/org/repo", &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::Verification);
        assert_eq!(err.causes().len(), 2);
    }

    #[test]
    fn unknown_policy_id_is_not_found() {
        let org = org_two_roots();
        let projects = projects(&org);
        let verifier = MockVerifier::new();
        let evaluator = DeploymentPolicyEvaluator::new(&org, &projects, &verifier);
        let err = evaluator
            .evaluate("no-such-policy", "docker.io/org/repo", &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::NotFound);
    }

    #[test]
    fn skips_roots_below_required_level() {
        let org = OrganizationPolicy::from_bytes(
            br#"{"format":1,"roots":{
                "publish":[{"id":"id-weak","max_slsa_level":1}],
                "release":[{"id":"id-strong","max_slsa_level":3}]
            }}"#,
        )
        .unwrap();
        let projects = projects(&org);
        let mut verifier = MockVerifier::new();
        verifier
            .expect_verify_release_attestation()
            .withf(|_, _, _, releaser_id, _| releaser_id == "id-strong")
            .returning(|_, _, _, _, _| Ok(None));

        let evaluator = DeploymentPolicyEvaluator::new(&org, &projects, &verifier);
        assert!(evaluator
            .evaluate("d1", "docker.io/org/repo", &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .is_ok());
    }

    #[test]
    fn rejects_verified_env_inconsistent_with_policy() {
        let org = org_two_roots();
        let projects = projects(&org);
        let mut verifier = MockVerifier::new();
        verifier
            .expect_verify_release_attestation()
            .returning(|_, _, _, _, _| Ok(Some("staging".to_string())));

        let evaluator = DeploymentPolicyEvaluator::new(&org, &projects, &verifier);
        let err = evaluator
            .evaluate("d1", "docker.io/org/repo", &DigestSet::from_iter([("sha256".to_string(), "abc".to_string())]))
            .unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::Internal);
    }
}
