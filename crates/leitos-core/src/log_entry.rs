use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::{Entity, collections};

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub id: String,
    /// Dashboard page the action was triggered from.
    #[serde(rename = "pagina")]
    pub page: String,
    #[serde(rename = "acao")]
    pub action: String,
    /// Id of the document the action applied to.
    #[serde(rename = "alvo")]
    pub target: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "usuario")]
    pub actor: String,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub timestamp: Option<OffsetDateTime>,
}

impl Entity for LogEntry {
    const COLLECTION: &'static str = collections::LOGS;

    fn id(&self) -> &str {
        &self.id
    }
}
