use serde::{Deserialize, Serialize};

use crate::entity::{Entity, collections};

/// Isolation precaution (contact, droplet, ...) a patient can be under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationType {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
}

impl Entity for IsolationType {
    const COLLECTION: &'static str = collections::ISOLATION_TYPES;

    fn id(&self) -> &str {
        &self.id
    }
}
