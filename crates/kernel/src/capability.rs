//! External capability contracts (`spec.md` §4.7).
//!
//! These are the seams where the engine hands off to collaborators that are
//! explicitly out of scope: the upstream provenance verifier, the
//! signing/transparency-log backend, and an organization's own package
//! allow-list policy. Each is a narrow, single-responsibility trait in the
//! teacher's "segregated ports" style (`crates/policies/.../ports.rs`)
//! rather than one fat interface.
//!
//! Per `spec.md` §5, the core exposes these calls *synchronously* even
//! though real implementations usually block on network I/O — hence plain
//! `fn`, not `async fn`.

use crate::digest::DigestSet;
use crate::error::PolicyError;

/// Verifies that a build/publish provenance attestation exists and
/// satisfies the given builder and source-repository claims
/// (`spec.md` §4.3 Publish/Release step 6).
pub trait BuildAttestationVerifier {
    fn verify_build_attestation(
        &self,
        digests: &DigestSet,
        package_name: &str,
        builder_id: &str,
        source_repo_uri: &str,
    ) -> Result<(), PolicyError>;
}

/// Verifies that a release attestation exists for one of the environments
/// a deployment policy permits, signed by the given releaser root at (at
/// least) the required SLSA level (`spec.md` §4.3 Deployment step 3).
///
/// Returns the single environment the attestation actually verified for,
/// or `None` if the policy declared no environment constraint at all.
pub trait ReleaseAttestationVerifier {
    fn verify_release_attestation(
        &self,
        digests: &DigestSet,
        package_name: &str,
        env_list: &[String],
        releaser_id: &str,
        required_level: u8,
    ) -> Result<Option<String>, PolicyError>;
}

/// Pluggable hook letting an organization reject a package at load time —
/// e.g. to enforce its own registry allow-list (`spec.md` §3 invariant 7).
pub trait PolicyValidator {
    fn validate_package(
        &self,
        name: &str,
        environment_any_of: Option<&[String]>,
    ) -> Result<(), PolicyError>;
}

/// The signing/transparency-log backend: DSSE wrapping, keyless certificate
/// issuance, Rekor upload, OCI attachment. The core's only contract with it
/// is that `Creation::to_bytes()` + `Creation::predicate_type()` form a
/// complete signing input; internal behavior is opaque (`spec.md` §4.7).
pub trait SignerBackend {
    type Envelope;
    type Bundle;

    fn sign(&self, bytes: &[u8]) -> Result<Self::Envelope, PolicyError>;
    fn upload_to_tlog(&self, envelope: &Self::Envelope) -> Result<Self::Bundle, PolicyError>;
    fn attach(
        &self,
        digests: &DigestSet,
        envelope: &Self::Envelope,
        bundle: &Self::Bundle,
        predicate_type: &str,
    ) -> Result<(), PolicyError>;
}
