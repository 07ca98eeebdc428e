//! # org-policy
//!
//! Organization-tier policy: the trust anchor naming builders/releasers
//! and their maximum SLSA levels (`spec.md` §3, §4.2). Grounded on the
//! teacher's `hodei-organizations` crate (organizational trust structure),
//! with Cedar/SurrealDB persistence dropped since the spec's organization
//! policy has no mutation surface and no store — it is loaded once from a
//! reader and used read-only from then on.

pub mod document;
pub mod policy;
pub mod root;

pub use policy::OrganizationPolicy;
pub use root::{Root, RootKind};
