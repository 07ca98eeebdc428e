//! The `PredicateFlavor` tag that unifies the publish/release/deployment
//! subsystems into one parameterized core, per `spec.md` §9 REDESIGN FLAGS.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    Publish,
    Release,
    Deployment,
}

impl Flavor {
    /// The in-toto predicate type URI this flavor's attestations carry
    /// (`spec.md` §3).
    pub const fn predicate_type(self) -> &'static str {
        match self {
            Flavor::Publish => "https://slsa.dev/publish/v0.1",
            // Legacy: same shape as publish, kept as a distinct flavor
            // rather than a second copy of the code (spec.md §9 open
            // question 3).
            Flavor::Release => "https://slsa.dev/release/v0.1",
            Flavor::Deployment => "https://slsa.dev/deployment/v0.1",
        }
    }

    pub const fn layer_name(self) -> &'static str {
        match self {
            Flavor::Publish => "publish",
            Flavor::Release => "release",
            Flavor::Deployment => "deployment",
        }
    }

    /// Whether this flavor's project policy document carries a single
    /// `package` object (`true`, publish) or a `packages` array
    /// (`false`, release/deployment).
    pub const fn single_package_document(self) -> bool {
        matches!(self, Flavor::Publish)
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.layer_name())
    }
}

/// The fixed in-toto Statement `_type` header, shared by every flavor.
pub const IN_TOTO_STATEMENT_TYPE: &str = "https://in-toto.io/Statement/v1";
