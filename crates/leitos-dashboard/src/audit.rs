//! Append-only audit log of dashboard actions.
//!
//! Every mutating engine operation and every collection read that reached the
//! store appends one entry to the `logs` collection. Appending is
//! fire-and-forget: a failed write is reported on the diagnostic log and never
//! fails the action that triggered it.

use leitos_core::collections;
use leitos_storage::{DocRef, DocumentStore, DynStore, Fields, StorageError};

use crate::config::AuditConfig;

/// One audit entry before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub page: String,
    pub action: String,
    pub target: String,
    pub description: String,
    pub actor: String,
}

impl AuditRecord {
    pub fn new(page: impl Into<String>, action: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            action: action.into(),
            target: target.into(),
            description: String::new(),
            actor: String::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    fn into_fields(self) -> Fields {
        Fields::new()
            .set("pagina", self.page)
            .set("acao", self.action)
            .set("alvo", self.target)
            .set("descricao", self.description)
            .set("usuario", self.actor)
            .server_timestamp("timestamp")
    }
}

#[derive(Clone)]
pub struct AuditLogger {
    store: DynStore,
    config: AuditConfig,
}

impl AuditLogger {
    pub fn new(store: DynStore, config: AuditConfig) -> Self {
        Self { store, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether cache misses should be recorded as collection reads.
    pub fn logs_collection_reads(&self) -> bool {
        self.config.enabled && self.config.log_collection_reads
    }

    /// Default actor for entries written on behalf of the process itself.
    pub fn system_actor(&self) -> &str {
        &self.config.actor
    }

    /// Writes one entry and reports the outcome.
    pub async fn try_append(&self, record: AuditRecord) -> Result<Option<DocRef>, StorageError> {
        if !self.config.enabled {
            return Ok(None);
        }
        let action = record.action.clone();
        let doc = self
            .store
            .add_doc(collections::LOGS, record.into_fields())
            .await?;
        tracing::debug!(audit_id = %doc.id, action = %action, "Audit entry created");
        Ok(Some(doc))
    }

    /// Writes one entry, swallowing failures.
    pub async fn append(&self, record: AuditRecord) {
        let action = record.action.clone();
        let target = record.target.clone();
        if let Err(e) = self.try_append(record).await {
            tracing::warn!(
                error = %e,
                action = %action,
                target = %target,
                "Failed to write audit entry"
            );
        }
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("backend", &self.store.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leitos_core::LogEntry;
    use leitos_db_memory::{Fault, InMemoryStore};
    use std::sync::Arc;

    fn logger(store: &InMemoryStore, enabled: bool) -> AuditLogger {
        let config = AuditConfig {
            enabled,
            ..AuditConfig::default()
        };
        AuditLogger::new(Arc::new(store.clone()), config)
    }

    #[tokio::test]
    async fn test_append_writes_log_entry() {
        let store = InMemoryStore::new();
        let audit = logger(&store, true);

        audit
            .append(
                AuditRecord::new("Mapa de Leitos", "Bloqueio de leito", "b1")
                    .description("Leito L-101 bloqueado: vazamento")
                    .actor("enf.maria"),
            )
            .await;

        let entries: Vec<LogEntry> = leitos_storage::load_all(&store, None).await.unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.page, "Mapa de Leitos");
        assert_eq!(entry.target, "b1");
        assert_eq!(entry.actor, "enf.maria");
        assert!(entry.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_append_swallows_store_failure() {
        let store = InMemoryStore::new();
        store.inject(Fault::FailWrites("logs".into()));
        let audit = logger(&store, true);

        audit.append(AuditRecord::new("p", "a", "t")).await;
        assert!(audit.try_append(AuditRecord::new("p", "a", "t")).await.is_err());
        assert_eq!(store.count("logs").await, 0);
    }

    #[tokio::test]
    async fn test_disabled_logger_writes_nothing() {
        let store = InMemoryStore::new();
        let audit = logger(&store, false);

        let written = audit.try_append(AuditRecord::new("p", "a", "t")).await.unwrap();
        assert!(written.is_none());
        assert!(!audit.logs_collection_reads());
        assert_eq!(store.count("logs").await, 0);
    }
}
