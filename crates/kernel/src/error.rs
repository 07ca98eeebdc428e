//! Stable error taxonomy shared by every layer of the policy engine.
//!
//! Every fallible operation in this workspace returns a [`PolicyError`]. The
//! kind set is small and fixed (see [`ErrorKind`]) so that callers can match
//! on it without depending on message text, while the message and the
//! originating layer tag give humans something to read.
//!
//! Unlike the teacher's one-`thiserror`-enum-per-feature style, this
//! taxonomy is intentionally cross-cutting: the same six kinds recur in the
//! loader, the evaluator and the attestation verifier, so splitting them
//! into a dozen near-identical enums would only duplicate the `From` glue.
//! It still leans on `thiserror` the same way the teacher does, just on one
//! struct instead of a dozen.

use std::fmt;
use thiserror::Error;

/// The fixed set of error kinds surfaced by the engine.
///
/// See `spec.md` §7 for the authoritative semantics of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller misuse: missing verifier, empty package name, malformed request.
    InvalidInput,
    /// A policy document failed structural or semantic validation.
    InvalidField,
    /// A policy lookup by ID or package name failed.
    NotFound,
    /// The external attestation verifier refused the claim.
    Verification,
    /// A field did not equal its expected value.
    Mismatch,
    /// An invariant was violated inside the engine itself.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::InvalidField => "invalid_field",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Verification => "verification",
            ErrorKind::Mismatch => "mismatch",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// A policy-engine error, carrying its kind, the layer that raised it, a
/// human-readable message, and an optional chain of underlying causes.
///
/// `Display` renders as `[layer] message`, matching the prefix convention
/// from `spec.md` §6 (`[project]`, `[organization]`, ...).
#[derive(Debug, Error)]
#[error("[{layer}] {message}")]
pub struct PolicyError {
    kind: ErrorKind,
    layer: &'static str,
    message: String,
    causes: Vec<PolicyError>,
}

impl PolicyError {
    pub fn new(kind: ErrorKind, layer: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            layer,
            message: message.into(),
            causes: Vec::new(),
        }
    }

    pub fn invalid_input(layer: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, layer, message)
    }

    pub fn invalid_field(layer: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidField, layer, message)
    }

    pub fn not_found(layer: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, layer, message)
    }

    pub fn mismatch(layer: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Mismatch, layer, message)
    }

    pub fn internal(layer: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, layer, message)
    }

    /// Builds a `Verification` error aggregating the causes tried, in order,
    /// before the caller gave up. Used by the deployment evaluator when
    /// every trusted root it tried rejected the claim (`spec.md` §4.3 step 5).
    pub fn verification_aggregate(layer: &'static str, causes: Vec<PolicyError>) -> Self {
        let message = if causes.is_empty() {
            "no trusted root accepted the attestation".to_string()
        } else {
            format!(
                "{} trusted root(s) rejected the attestation",
                causes.len()
            )
        };
        Self {
            kind: ErrorKind::Verification,
            layer,
            message,
            causes,
        }
    }

    pub fn verification(layer: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Verification, layer, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn layer(&self) -> &'static str {
        self.layer
    }

    /// The individual causes folded into a [`ErrorKind::Verification`]
    /// aggregate, one per trusted root that was tried and rejected the
    /// claim. Empty for every other error kind.
    pub fn causes(&self) -> &[PolicyError] {
        &self.causes
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

