//! Bridges a policy document's `registry/repository` package name to the
//! [`PackageDescriptor`] a predicate carries (`spec.md` §4.6).

use kernel::{parse_policy_package, PackageDescriptor, PolicyError};

pub trait PackageHelper: Sized {
    fn from_policy_name(raw: &str, layer: &'static str) -> Result<Self, PolicyError>;
}

impl PackageHelper for PackageDescriptor {
    fn from_policy_name(raw: &str, layer: &'static str) -> Result<Self, PolicyError> {
        let parsed = parse_policy_package(raw, layer)?;
        Ok(PackageDescriptor::new(parsed.repository, parsed.registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_descriptor_from_policy_name() {
        let descriptor = PackageDescriptor::from_policy_name("docker.io/org/repo", "test").unwrap();
        assert_eq!(descriptor.name, "org/repo");
        assert_eq!(descriptor.registry, "docker.io");
    }

    #[test]
    fn rejects_malformed_policy_name() {
        assert!(PackageDescriptor::from_policy_name("not-a-package", "test").is_err());
    }
}
