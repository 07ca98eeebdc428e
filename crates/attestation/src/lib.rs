//! # attestation
//!
//! Composes and verifies the in-toto statements the publish/release/
//! deployment subsystems produce and consume (`spec.md` §4.4, §4.5).
//! Grounded on the teacher's `policies` engine idiom for building and
//! checking structured documents, generalized across flavors via
//! `kernel::Flavor` per `spec.md` §9 REDESIGN FLAGS.

pub mod composer;
pub mod package_helper;
pub mod predicate;
pub mod statement;
pub mod verifier;

pub use composer::Creation;
pub use package_helper::PackageHelper;
pub use predicate::{BuildPredicate, DeploymentPredicate, HasSlsaBuildLevel, DEPLOYMENT_SCOPE_KEY};
pub use statement::Statement;
pub use verifier::Verification;
