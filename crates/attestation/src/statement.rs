//! The in-toto Statement envelope every predicate flavor is wrapped in
//! (`spec.md` §3, §4.4).

use kernel::IN_TOTO_STATEMENT_TYPE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement<P> {
    #[serde(rename = "_type")]
    pub type_: String,
    #[serde(rename = "predicateType")]
    pub predicate_type: String,
    pub subject: Vec<kernel::Subject>,
    pub predicate: P,
}

impl<P> Statement<P> {
    pub fn new(predicate_type: impl Into<String>, subject: Vec<kernel::Subject>, predicate: P) -> Self {
        Self {
            type_: IN_TOTO_STATEMENT_TYPE.to_string(),
            predicate_type: predicate_type.into(),
            subject,
            predicate,
        }
    }
}
