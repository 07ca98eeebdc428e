//! # kernel
//!
//! Shared domain primitives for the supply-chain policy engine: in-toto
//! building blocks (digest sets, subjects, package descriptors), the
//! stable error taxonomy, the named-iterator abstraction policies are
//! loaded through, registry canonicalization, the `PredicateFlavor` tag,
//! and the external capability contracts (`AttestationVerifier`,
//! `PolicyValidator`, `SignerBackend`).
//!
//! Every other crate in this workspace depends on `kernel` and nothing
//! depends on them — the same role the teacher's `kernel` crate plays
//! underneath `hodei-iam`/`hodei-organizations`/`hodei-authorizer`.

pub mod capability;
pub mod digest;
pub mod error;
pub mod flavor;
pub mod iterator;
pub mod package;
pub mod registry;
pub mod subject;
pub mod value_objects;

pub use capability::{BuildAttestationVerifier, PolicyValidator, ReleaseAttestationVerifier, SignerBackend};
pub use digest::DigestSet;
pub use error::{ErrorKind, PolicyError};
pub use flavor::{Flavor, IN_TOTO_STATEMENT_TYPE};
pub use iterator::{drain_named, NamedReadCloserIterator, ReadClose, ReadCloserIterator};
pub use package::PackageDescriptor;
pub use registry::{canonicalize_registry, parse_policy_package, PackageRef, ALLOWED_REGISTRIES};
pub use subject::Subject;
pub use value_objects::SlsaLevel;
