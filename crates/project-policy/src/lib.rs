//! # project-policy
//!
//! Project-tier policy: publish/release package-to-builder bindings and
//! deployment principal-to-package bindings (`spec.md` §3, §4.3). Grounded
//! on the teacher's `hodei-iam`/`hodei-policies` crates for the
//! load-validate-index shape, generalized across the publish/release
//! duplication per `spec.md` §9 REDESIGN FLAGS.

pub mod build_policy;
pub mod deployment_policy;
pub mod document;
pub mod package;

pub use build_policy::{BuildPolicySet, BuildProjectPolicy};
pub use deployment_policy::{DeploymentPolicySet, DeploymentProjectPolicy, Protection};
pub use package::PackageRequirement;
