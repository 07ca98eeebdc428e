//! Parses and checks a composed attestation against the claims an
//! evaluator needs confirmed (`spec.md` §4.5).
//!
//! This is the structural half of attestation verification: given bytes
//! already fetched from wherever attestations live (out of scope per
//! `spec.md` §1), confirm the envelope, predicate type, subject digests,
//! package identity, signer identity and SLSA level all line up. A
//! concrete adapter wires this to [`kernel::BuildAttestationVerifier`] /
//! [`kernel::ReleaseAttestationVerifier`] once it has bytes in hand.

use crate::predicate::{BuildPredicate, DeploymentPredicate, DEPLOYMENT_SCOPE_KEY};
use crate::statement::Statement;
use kernel::{DigestSet, Flavor, PackageDescriptor, PolicyError, IN_TOTO_STATEMENT_TYPE};

const LAYER: &str = "attestation";

pub struct Verification;

impl Verification {
    /// `spec.md` §4.5 Publish/Release steps:
    /// 1. The envelope's `_type` matches the fixed in-toto Statement type.
    /// 2. `predicateType` matches the expected flavor.
    /// 3. The subject's digest set is itself well-formed, and contains the
    ///    expected digests (subset match, scenario S6).
    /// 4. The predicate's package identity matches the expected package.
    /// 5. The predicate's builder id matches the expected trusted root.
    /// 6. The recorded SLSA build level meets the required minimum.
    pub fn verify_build(
        bytes: &[u8],
        flavor: Flavor,
        expected_package: &PackageDescriptor,
        expected_digests: &DigestSet,
        expected_builder_id: &str,
        required_level: u8,
    ) -> Result<(), PolicyError> {
        let statement: Statement<BuildPredicate> = serde_json::from_slice(bytes)
            .map_err(|e| PolicyError::invalid_field(LAYER, format!("malformed attestation: {e}")))?;

        if statement.type_ != IN_TOTO_STATEMENT_TYPE {
            return Err(PolicyError::mismatch(LAYER, format!("unexpected statement type '{}'", statement.type_)));
        }
        if statement.predicate_type != flavor.predicate_type() {
            return Err(PolicyError::mismatch(
                LAYER,
                format!("predicateType '{}' does not match flavor {flavor}", statement.predicate_type),
            ));
        }

        let subject = statement
            .subject
            .first()
            .ok_or_else(|| PolicyError::invalid_field(LAYER, "attestation carries no subject"))?;
        subject.digests.validate(LAYER)?;
        if !subject.digests.contains_all(expected_digests) {
            return Err(PolicyError::mismatch(LAYER, "attestation subject digests do not cover the expected digests"));
        }

        if !statement.predicate.package.identity_eq(expected_package) {
            return Err(PolicyError::mismatch(LAYER, "attestation package identity does not match the claim"));
        }

        if statement.predicate.builder.id != expected_builder_id {
            return Err(PolicyError::verification(
                LAYER,
                format!("attestation was built by '{}', not the trusted builder", statement.predicate.builder.id),
            ));
        }

        let level = statement
            .predicate
            .properties
            .as_ref()
            .and_then(|p| p.slsa_build_level)
            .ok_or_else(|| PolicyError::mismatch(LAYER, "attestation does not record a slsa.dev/build/level"))?;
        if level < required_level {
            return Err(PolicyError::verification(
                LAYER,
                format!("attestation's SLSA level {level} is below the required {required_level}"),
            ));
        }

        Ok(())
    }

    /// `spec.md` §4.5 Deployment steps: same envelope/predicate-type/digest
    /// checks as publish/release, plus confirming the predicate's `scopes`
    /// carry the recognized deployment scope key, the releaser matches the
    /// root being tried, and (when the policy constrains environments) that
    /// the recorded environment is one of the permitted ones. Returns the
    /// environment the attestation matched, if any.
    pub fn verify_deployment(
        bytes: &[u8],
        expected_package: &PackageDescriptor,
        expected_digests: &DigestSet,
        env_list: &[String],
        expected_releaser_id: &str,
        required_level: u8,
    ) -> Result<Option<String>, PolicyError> {
        let statement: Statement<DeploymentPredicate> = serde_json::from_slice(bytes)
            .map_err(|e| PolicyError::invalid_field(LAYER, format!("malformed attestation: {e}")))?;

        if statement.type_ != IN_TOTO_STATEMENT_TYPE {
            return Err(PolicyError::mismatch(LAYER, format!("unexpected statement type '{}'", statement.type_)));
        }
        if statement.predicate_type != Flavor::Deployment.predicate_type() {
            return Err(PolicyError::mismatch(
                LAYER,
                format!("predicateType '{}' does not match deployment", statement.predicate_type),
            ));
        }
        if !statement.predicate.scopes.contains_key(DEPLOYMENT_SCOPE_KEY) {
            return Err(PolicyError::mismatch(LAYER, "attestation scopes do not carry the recognized deployment scope key"));
        }

        let subject = statement
            .subject
            .first()
            .ok_or_else(|| PolicyError::invalid_field(LAYER, "attestation carries no subject"))?;
        subject.digests.validate(LAYER)?;
        if !subject.digests.contains_all(expected_digests) {
            return Err(PolicyError::mismatch(LAYER, "attestation subject digests do not cover the expected digests"));
        }

        if !statement.predicate.package.identity_eq(expected_package) {
            return Err(PolicyError::mismatch(LAYER, "attestation package identity does not match the claim"));
        }

        if statement.predicate.releaser.id != expected_releaser_id {
            return Err(PolicyError::verification(
                LAYER,
                format!("attestation was released by '{}', not the trusted root being tried", statement.predicate.releaser.id),
            ));
        }

        if !env_list.is_empty() {
            match &statement.predicate.environment {
                Some(env) if env_list.iter().any(|e| e == env) => {}
                _ => {
                    return Err(PolicyError::verification(
                        LAYER,
                        "attestation's environment is not one the policy permits",
                    ))
                }
            }
        }

        let level = statement
            .predicate
            .properties
            .as_ref()
            .and_then(|p| p.slsa_build_level)
            .ok_or_else(|| PolicyError::mismatch(LAYER, "attestation does not record a slsa.dev/build/level"))?;
        if level < required_level {
            return Err(PolicyError::verification(
                LAYER,
                format!("attestation's SLSA level {level} is below the required {required_level}"),
            ));
        }

        Ok(statement.predicate.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::Creation;
    use crate::predicate::{BuildPredicate, DeploymentPredicate, HasSlsaBuildLevel};
    use kernel::Subject;

    fn digests() -> DigestSet {
        DigestSet::from_iter([("sha256".to_string(), "abc".to_string())])
    }

    fn package() -> PackageDescriptor {
        PackageDescriptor::new("org/repo", "docker.io")
    }

    fn compose(level: u8) -> Vec<u8> {
        let subject = vec![Subject::new(digests())];
        let predicate = BuildPredicate::new(package(), "id-b1", "https://example.com/repo");
        Creation::from_evaluation(Flavor::Publish.predicate_type(), subject, predicate, level)
            .unwrap()
            .to_bytes()
            .unwrap()
    }

    #[test]
    fn verifies_a_matching_attestation() {
        let bytes = compose(3);
        Verification::verify_build(&bytes, Flavor::Publish, &package(), &digests(), "id-b1", 2).unwrap();
    }

    #[test]
    fn rejects_level_below_required() {
        let bytes = compose(1);
        let err = Verification::verify_build(&bytes, Flavor::Publish, &package(), &digests(), "id-b1", 2).unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::Verification);
    }

    #[test]
    fn rejects_wrong_builder() {
        let bytes = compose(3);
        let err = Verification::verify_build(&bytes, Flavor::Publish, &package(), &digests(), "someone-else", 2).unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::Verification);
    }

    #[test]
    fn accepts_subset_digest_match() {
        let subject = vec![Subject::new(DigestSet::from_iter([
            ("sha256".to_string(), "a".to_string()),
            ("gitCommit".to_string(), "b".to_string()),
        ]))];
        let predicate = BuildPredicate::new(package(), "id-b1", "https://example.com/repo");
        let bytes = Creation::from_evaluation(Flavor::Publish.predicate_type(), subject, predicate, 3)
            .unwrap()
            .to_bytes()
            .unwrap();

        let narrower = DigestSet::from_iter([("gitCommit".to_string(), "b".to_string())]);
        Verification::verify_build(&bytes, Flavor::Publish, &package(), &narrower, "id-b1", 2).unwrap();
    }

    #[test]
    fn rejects_wrong_flavor() {
        let bytes = compose(3);
        let err = Verification::verify_build(&bytes, Flavor::Release, &package(), &digests(), "id-b1", 2).unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::Mismatch);
    }

    #[test]
    fn rejects_non_covering_digest_set_as_mismatch() {
        let bytes = compose(3);
        let disjoint = DigestSet::from_iter([("sha256".to_string(), "not-the-same".to_string())]);
        let err = Verification::verify_build(&bytes, Flavor::Publish, &package(), &disjoint, "id-b1", 2).unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::Mismatch);
    }

    #[test]
    fn rejects_malformed_subject_digest_set() {
        let mut predicate = BuildPredicate::new(package(), "id-b1", "https://example.com/repo");
        predicate.set_slsa_build_level(3);
        let subject = vec![Subject::new(DigestSet::from_iter([("sha256".to_string(), String::new())]))];
        let statement = Statement::new(Flavor::Publish.predicate_type(), subject, predicate);
        let bytes = serde_json::to_vec(&statement).unwrap();

        let err = Verification::verify_build(&bytes, Flavor::Publish, &package(), &digests(), "id-b1", 2).unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::InvalidField);
    }

    #[test]
    fn verify_deployment_rejects_non_covering_digest_set_as_mismatch() {
        let subject = vec![Subject::new(digests())];
        let predicate = DeploymentPredicate::new(package(), "id-pub1", "sa-x@project.iam");
        let bytes = Creation::from_evaluation(Flavor::Deployment.predicate_type(), subject, predicate, 3)
            .unwrap()
            .to_bytes()
            .unwrap();

        let disjoint = DigestSet::from_iter([("sha256".to_string(), "not-the-same".to_string())]);
        let err = Verification::verify_deployment(&bytes, &package(), &disjoint, &[], "id-pub1", 2).unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::Mismatch);
    }
}
