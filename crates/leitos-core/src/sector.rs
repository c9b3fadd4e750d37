use serde::{Deserialize, Serialize};

use crate::entity::{Entity, collections};

/// A hospital ward or unit grouping beds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    /// Short code (sigla) used on boards and in capacity rules.
    #[serde(rename = "sigla")]
    pub abbreviation: String,
    #[serde(rename = "andar", default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(rename = "tipo", default)]
    pub sector_type: String,
    #[serde(rename = "alertas", default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<String>,
}

impl Sector {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        abbreviation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            abbreviation: abbreviation.into(),
            floor: None,
            sector_type: String::new(),
            alerts: Vec::new(),
        }
    }

    pub fn with_type(mut self, sector_type: impl Into<String>) -> Self {
        self.sector_type = sector_type.into();
        self
    }
}

impl Entity for Sector {
    const COLLECTION: &'static str = collections::SECTORS;

    fn id(&self) -> &str {
        &self.id
    }
}
