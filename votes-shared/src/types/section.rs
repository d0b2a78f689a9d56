use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::SectionId;

/// A named grouping of resources; the unit the ranking endpoint works on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}
