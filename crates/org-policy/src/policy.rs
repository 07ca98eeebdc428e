//! Organization policy: load, validate, and the trust-root queries the
//! project-policy and evaluator layers need (`spec.md` §4.2).

use crate::document::OrganizationDocument;
use crate::root::{Root, RootKind};
use kernel::iterator::ReadClose;
use kernel::value_objects::SlsaLevel;
use kernel::PolicyError;
use std::io::Read;
use tracing::{debug, instrument};

const LAYER: &str = "organization";

/// A loaded, validated organization policy: the trust anchor naming which
/// builders/releasers may have produced an upstream attestation, and at
/// what maximum SLSA level.
#[derive(Debug, Clone)]
pub struct OrganizationPolicy {
    roots: Vec<Root>,
}

impl OrganizationPolicy {
    /// Parses and validates an organization policy document from a single
    /// reader (`spec.md` §4.2 "Load from one reader").
    #[instrument(skip(reader), fields(layer = LAYER))]
    pub fn load(mut reader: impl ReadClose) -> Result<Self, PolicyError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| PolicyError::invalid_input(LAYER, format!("failed to read policy: {e}")))?;
        reader.close()?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PolicyError> {
        let document: OrganizationDocument = serde_json::from_slice(bytes)
            .map_err(|e| PolicyError::invalid_field(LAYER, format!("malformed JSON: {e}")))?;
        Self::from_document(document)
    }

    fn from_document(document: OrganizationDocument) -> Result<Self, PolicyError> {
        if document.format != 1 {
            return Err(PolicyError::invalid_field(
                LAYER,
                format!("unsupported format {}, expected 1", document.format),
            ));
        }

        let mut roots = Vec::new();
        for (kind, wires) in [
            (RootKind::Build, document.roots.build),
            (RootKind::Publish, document.roots.publish),
            (RootKind::Release, document.roots.release),
        ] {
            for wire in wires {
                let max_slsa_level = SlsaLevel::new(wire.max_slsa_level)?;
                roots.push(Root {
                    id: wire.id,
                    name: wire.name,
                    max_slsa_level,
                    kind,
                });
            }
        }

        let policy = Self { roots };
        policy.validate()?;
        debug!(root_count = policy.roots.len(), "loaded organization policy");
        Ok(policy)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        if self.roots.is_empty() {
            return Err(PolicyError::invalid_field(LAYER, "organization policy must declare at least one root"));
        }

        let mut seen_ids = std::collections::HashSet::new();
        let mut seen_names = std::collections::HashSet::new();
        for root in &self.roots {
            if root.id.is_empty() {
                return Err(PolicyError::invalid_field(LAYER, "root id must not be empty"));
            }
            if !seen_ids.insert(root.id.as_str()) {
                return Err(PolicyError::invalid_field(
                    LAYER,
                    format!("duplicate root id '{}'", root.id),
                ));
            }
            if let Some(name) = &root.name {
                if name.is_empty() {
                    return Err(PolicyError::invalid_field(LAYER, "root name must not be empty when present"));
                }
                if !seen_names.insert(name.as_str()) {
                    return Err(PolicyError::invalid_field(
                        LAYER,
                        format!("duplicate root name '{name}'"),
                    ));
                }
            }
        }
        Ok(())
    }

    fn roots_of(&self, kind: RootKind) -> impl Iterator<Item = &Root> {
        self.roots.iter().filter(move |r| r.kind == kind)
    }

    /// Maximum `max_slsa_level` across `build` roots, or `-1` if there are
    /// none.
    pub fn max_build_slsa_level(&self) -> i32 {
        self.roots_of(RootKind::Build)
            .map(|r| r.max_slsa_level.value() as i32)
            .max()
            .unwrap_or(-1)
    }

    /// Maximum `max_slsa_level` across the deployment-facing `publish` and
    /// (legacy) `release` roots, or `-1` if there are none.
    pub fn max_release_slsa_level(&self) -> i32 {
        self.release_roots()
            .map(|r| r.max_slsa_level.value() as i32)
            .max()
            .unwrap_or(-1)
    }

    /// `build` root names, for cross-validating a project's
    /// `require_slsa_builder`.
    pub fn root_builder_names(&self) -> Vec<&str> {
        self.roots_of(RootKind::Build)
            .filter_map(|r| r.name.as_deref())
            .collect()
    }

    /// Resolves a builder's declared `name` to its trust-anchor `id`.
    /// Unlike [`Self::builder_slsa_level`], an unknown name is an error:
    /// by the time this is called the name has already been validated
    /// against [`Self::root_builder_names`] at project-policy load time, so
    /// a miss here means the caller's claim about the builder doesn't
    /// match the org's view of it (`spec.md` §4.2).
    pub fn builder_id(&self, name: &str) -> Result<&str, PolicyError> {
        self.roots_of(RootKind::Build)
            .find(|r| r.name.as_deref() == Some(name))
            .map(|r| r.id.as_str())
            .ok_or_else(|| PolicyError::mismatch(LAYER, format!("no build root named '{name}'")))
    }

    /// The SLSA level a named builder is trusted up to, or `-1` if unknown.
    pub fn builder_slsa_level(&self, name: &str) -> i32 {
        self.roots_of(RootKind::Build)
            .find(|r| r.name.as_deref() == Some(name))
            .map(|r| r.max_slsa_level.value() as i32)
            .unwrap_or(-1)
    }

    /// The roots deployment evaluation iterates, in declared order: every
    /// `publish` root followed by every (legacy) `release` root
    /// (`spec.md` §5 ordering, §9 open question 3).
    pub fn release_roots(&self) -> impl Iterator<Item = &Root> {
        self.roots
            .iter()
            .filter(|r| matches!(r.kind, RootKind::Publish | RootKind::Release))
    }

    /// Reserved for future global checks; currently a no-op (`spec.md`
    /// §4.2).
    pub fn evaluate(&self) -> Result<(), PolicyError> {
        Ok(())
    }
}
