//! Wire format for project policy documents (`spec.md` §6).
//!
//! Publish documents carry a single `package` object; release documents
//! carry a `packages` array. Both are folded into the same
//! [`BuildProjectDocument`] shape here, distinguished later by
//! [`kernel::Flavor`] rather than by two parallel wire types.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentWire {
    #[serde(default)]
    pub any_of: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageRequirementWire {
    pub name: String,
    #[serde(default)]
    pub environment: Option<EnvironmentWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryWire {
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildRequirementWire {
    pub require_slsa_builder: String,
    pub repository: RepositoryWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildProjectDocument {
    pub format: u8,
    #[serde(default)]
    pub package: Option<PackageRequirementWire>,
    #[serde(default)]
    pub packages: Option<Vec<PackageRequirementWire>>,
    pub build: BuildRequirementWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProtectionWire {
    pub service_account: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentBuildRequirementWire {
    pub require_slsa_level: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentProjectDocument {
    pub format: u8,
    pub protection: ProtectionWire,
    pub packages: Vec<PackageRequirementWire>,
    pub build: DeploymentBuildRequirementWire,
}
