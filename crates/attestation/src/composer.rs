//! Composes a [`Statement`] from subjects and a predicate, enforcing the
//! safe-mode guard on the SLSA build level (`spec.md` §4.4).

use crate::predicate::HasSlsaBuildLevel;
use crate::statement::Statement;
use kernel::{PolicyError, Subject};
use serde::Serialize;

const LAYER: &str = "attestation";

/// Builds an attestation [`Statement`]. Once [`Self::enter_safe_mode`] has
/// been called (directly, or implicitly via [`Self::from_evaluation`]),
/// [`Self::set_slsa_build_level`] is permanently rejected — the level an
/// evaluator computed must not be overwritten by a caller after the fact
/// (`spec.md` §4.4).
#[derive(Debug, Clone)]
pub struct Creation<P> {
    predicate_type: String,
    subject: Vec<Subject>,
    predicate: P,
    safe_mode: bool,
}

impl<P: HasSlsaBuildLevel + Clone + Serialize> Creation<P> {
    pub fn new(predicate_type: impl Into<String>, subject: Vec<Subject>, predicate: P) -> Result<Self, PolicyError> {
        Self::validate_subjects(&subject)?;
        Ok(Self {
            predicate_type: predicate_type.into(),
            subject,
            predicate,
            safe_mode: false,
        })
    }

    /// Builds a composer already carrying an evaluator-computed SLSA level,
    /// in safe mode from the start (`spec.md` §4.4).
    pub fn from_evaluation(
        predicate_type: impl Into<String>,
        subject: Vec<Subject>,
        mut predicate: P,
        level: u8,
    ) -> Result<Self, PolicyError> {
        Self::validate_subjects(&subject)?;
        predicate.set_slsa_build_level(level);
        Ok(Self {
            predicate_type: predicate_type.into(),
            subject,
            predicate,
            safe_mode: true,
        })
    }

    fn validate_subjects(subject: &[Subject]) -> Result<(), PolicyError> {
        if subject.is_empty() {
            return Err(PolicyError::invalid_input(LAYER, "an attestation must carry at least one subject"));
        }
        for s in subject {
            s.validate(LAYER)?;
        }
        Ok(())
    }

    pub fn is_safe_mode(&self) -> bool {
        self.safe_mode
    }

    pub fn enter_safe_mode(&mut self) {
        self.safe_mode = true;
    }

    pub fn set_slsa_build_level(&mut self, level: u8) -> Result<(), PolicyError> {
        if self.safe_mode {
            return Err(PolicyError::internal(
                LAYER,
                "slsa build level is locked once the composer has entered safe mode",
            ));
        }
        self.predicate.set_slsa_build_level(level);
        Ok(())
    }

    pub fn predicate(&self) -> &P {
        &self.predicate
    }

    pub fn statement(&self) -> Statement<P> {
        Statement::new(self.predicate_type.clone(), self.subject.clone(), self.predicate.clone())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PolicyError> {
        serde_json::to_vec(&self.statement())
            .map_err(|e| PolicyError::internal(LAYER, format!("failed to serialize attestation: {e}")))
    }
}
