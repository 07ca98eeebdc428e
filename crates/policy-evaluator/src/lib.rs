//! # policy-evaluator
//!
//! Ties an [`org_policy::OrganizationPolicy`], a project policy set, and an
//! external attestation verifier together into the evaluate operations
//! `spec.md` §4.3 describes. Grounded on the teacher's `hodei-authorizer`
//! crate, which plays the same "combine a few policy sources and ask an
//! external engine" role for Cedar authorization requests.

pub mod build;
pub mod deployment;

pub use build::BuildPolicyEvaluator;
pub use deployment::DeploymentPolicyEvaluator;
