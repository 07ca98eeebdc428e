//! Registry canonicalization and policy package name parsing.
//!
//! `spec.md` §4.6: the `(registry, name)` tuple is the primary key for
//! policy lookup, so aliasing (`index.docker.io` vs `docker.io`) would let
//! one registry spelling take over another's policy. This module is the
//! supporting invariant that closes that hole; it is not the full
//! container-registry reference parser (that remains an external,
//! out-of-scope capability per `spec.md` §1 — this only parses the
//! `registry/repository` shape a *policy document* is allowed to name).

use crate::error::PolicyError;

/// The default registry alias. Canonicalized to [`DOCKER_IO`].
pub const INDEX_DOCKER_IO: &str = "index.docker.io";
pub const DOCKER_IO: &str = "docker.io";

/// Registries a policy package name is allowed to target.
pub const ALLOWED_REGISTRIES: &[&str] = &["docker.io", "gcr.io", "ghcr.io"];

/// A parsed, canonicalized `registry/repository` policy package reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub registry: String,
    pub repository: String,
}

/// Canonicalizes the `index.docker.io` alias to `docker.io`; every other
/// registry spelling passes through unchanged.
pub fn canonicalize_registry(registry: &str) -> String {
    if registry == INDEX_DOCKER_IO {
        DOCKER_IO.to_string()
    } else {
        registry.to_string()
    }
}

/// Parses a policy package name of the form `registry/repository`.
///
/// Rejects:
/// - a missing `/` separator,
/// - a tag (`:tag`) or digest (`@sha256:...`) identifier attached to the
///   repository segment,
/// - a registry outside [`ALLOWED_REGISTRIES`] once canonicalized.
pub fn parse_policy_package(raw: &str, layer: &'static str) -> Result<PackageRef, PolicyError> {
    let (registry, repository) = raw.split_once('/').ok_or_else(|| {
        PolicyError::invalid_field(
            layer,
            format!("package name '{raw}' is not of the form registry/repository"),
        )
    })?;

    if repository.is_empty() {
        return Err(PolicyError::invalid_field(
            layer,
            format!("package name '{raw}' has an empty repository segment"),
        ));
    }

    if repository.contains(':') || repository.contains('@') {
        return Err(PolicyError::invalid_field(
            layer,
            format!(
                "package name '{raw}' must not carry a tag or digest identifier"
            ),
        ));
    }

    let registry = canonicalize_registry(registry);
    if !ALLOWED_REGISTRIES.contains(&registry.as_str()) {
        return Err(PolicyError::invalid_field(
            layer,
            format!("registry '{registry}' is not on the allow-list {ALLOWED_REGISTRIES:?}"),
        ));
    }

    Ok(PackageRef {
        registry,
        repository: repository.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_default_alias() {
        assert_eq!(canonicalize_registry(INDEX_DOCKER_IO), DOCKER_IO);
        assert_eq!(canonicalize_registry("gcr.io"), "gcr.io");
    }

    #[test]
    fn parses_allowed_registry() {
        let parsed = parse_policy_package("docker.io/org/repo", "test").unwrap();
        assert_eq!(parsed.registry, "docker.io");
        assert_eq!(parsed.repository, "org/repo");
    }

    #[test]
    fn canonicalizes_index_docker_io_alias_during_parse() {
        let parsed = parse_policy_package("index.docker.io/org/repo", "test").unwrap();
        assert_eq!(parsed.registry, "docker.io");
    }

    #[test]
    fn rejects_disallowed_registry() {
        assert!(parse_policy_package("evil.example.com/org/repo", "test").is_err());
    }

    #[test]
    fn rejects_tag_identifier() {
        assert!(parse_policy_package("docker.io/repo/image:tag", "test").is_err());
    }

    #[test]
    fn rejects_digest_identifier() {
        assert!(parse_policy_package("docker.io/repo/image@sha256:abc", "test").is_err());
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(parse_policy_package("justaname", "test").is_err());
    }
}
