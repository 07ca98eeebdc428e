//! Wire format for the organization policy document (`spec.md` §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootWire {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// The canonical field is `max_slsa_level`; `slsa_level` is accepted as
    /// an alias because `spec.md` §6's own example spells the `build` root
    /// list with `slsa_level` while `publish`/`release` spell it
    /// `max_slsa_level`. Both ends of that inconsistency are legitimate
    /// wire input here (see `DESIGN.md`).
    #[serde(alias = "slsa_level")]
    pub max_slsa_level: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootsWire {
    #[serde(default)]
    pub build: Vec<RootWire>,
    #[serde(default)]
    pub publish: Vec<RootWire>,
    #[serde(default)]
    pub release: Vec<RootWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationDocument {
    pub format: u8,
    #[serde(default)]
    pub roots: RootsWire,
}
