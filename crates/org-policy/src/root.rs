//! The validated [`Root`] value object and which root list each subsystem
//! trusts.

use kernel::SlsaLevel;

/// Which of the three root lists a [`Root`] was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// `roots.build` — trusted builders, consumed by publish/release.
    Build,
    /// `roots.publish` — trusted releasers, consumed by deployment.
    Publish,
    /// `roots.release` — legacy releasers, consumed by deployment
    /// alongside `roots.publish` (`spec.md` §9 open question 3).
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    pub id: String,
    pub name: Option<String>,
    pub max_slsa_level: SlsaLevel,
    pub kind: RootKind,
}
