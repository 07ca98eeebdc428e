//! Digest sets: the algorithm→hex-value maps that identify artifacts and
//! referenced policy documents bit-exactly (`spec.md` §3).

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mapping from digest algorithm name (e.g. `"sha256"`) to its hex value.
///
/// Valid iff non-empty and no key or value is empty. A `BTreeMap` is used
/// instead of a `HashMap` so digest sets compare and serialize
/// deterministically, which matters for the composer's canonical JSON
/// output (`spec.md` §4.4).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestSet(BTreeMap<String, String>);

impl DigestSet {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, algorithm: &str) -> Option<&str> {
        self.0.get(algorithm).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Validates the non-empty / no-empty-keys-or-values invariant.
    pub fn validate(&self, layer: &'static str) -> Result<(), PolicyError> {
        if self.0.is_empty() {
            return Err(PolicyError::invalid_field(
                layer,
                "digest set must not be empty",
            ));
        }
        for (algorithm, value) in &self.0 {
            if algorithm.is_empty() {
                return Err(PolicyError::invalid_field(
                    layer,
                    "digest set contains an empty algorithm name",
                ));
            }
            if value.is_empty() {
                return Err(PolicyError::invalid_field(
                    layer,
                    format!("digest set entry '{algorithm}' has an empty value"),
                ));
            }
        }
        Ok(())
    }

    /// True iff every `(algorithm, value)` pair in `subset` also appears in
    /// `self` with an equal value. Used by the attestation verifier's
    /// subset-match rule (`spec.md` §4.5 step 3, scenario S6).
    pub fn contains_all(&self, subset: &DigestSet) -> bool {
        subset
            .iter()
            .all(|(algorithm, value)| self.get(algorithm) == Some(value))
    }
}

impl FromIterator<(String, String)> for DigestSet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
