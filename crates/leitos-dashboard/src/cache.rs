//! Read-through cache for whole-collection reads.
//!
//! ## Cache Key Format
//!
//! `{collection}` for unfiltered reads, `{collection}?{filter}` otherwise, so
//! filtered reads of the same collection are cached separately.
//!
//! ## Expiry and fallback
//!
//! An entry younger than the caller's expiration is served as is. Older
//! entries trigger a store read. When that read fails the caller is warned
//! and gets the last cached value regardless of age, or nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use leitos_core::{CoreError, Entity};
use leitos_storage::{Document, DocumentStore, DynStore, Filter};
use tokio::time::Instant;

use crate::audit::{AuditLogger, AuditRecord};
use crate::notify::{Notification, Notifier};

const CACHE_PAGE: &str = "Cache";

/// A cached collection read.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<Document>>,
    pub cached_at: Instant,
}

impl CachedEntry {
    fn new(data: Vec<Document>) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
        }
    }

    /// Check if this entry is younger than `expiration`.
    pub fn is_fresh(&self, expiration: Duration) -> bool {
        self.cached_at.elapsed() < expiration
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Store failures answered with an expired entry.
    pub stale_fallbacks: u64,
    pub entries: usize,
}

pub struct ReadThroughCache {
    store: DynStore,
    audit: AuditLogger,
    notifier: Arc<dyn Notifier>,
    entries: DashMap<String, CachedEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    stale_fallbacks: AtomicU64,
}

fn cache_key(collection: &str, filter: Option<&Filter>) -> String {
    match filter {
        Some(f) if !f.conditions().is_empty() => format!("{collection}?{}", f.cache_key()),
        _ => collection.to_string(),
    }
}

impl ReadThroughCache {
    pub fn new(store: DynStore, audit: AuditLogger, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            audit,
            notifier,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale_fallbacks: AtomicU64::new(0),
        }
    }

    /// Returns the documents of `collection`, reading the store only when the
    /// cached copy is older than `expiration`.
    pub async fn get(
        &self,
        collection: &str,
        expiration: Duration,
        filter: Option<&Filter>,
    ) -> Arc<Vec<Document>> {
        let key = cache_key(collection, filter);

        let cached = self.entries.get(&key).map(|entry| entry.clone());
        if let Some(entry) = &cached
            && entry.is_fresh(expiration)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "cache hit");
            return Arc::clone(&entry.data);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        match self.store.get(collection, filter).await {
            Ok(docs) => {
                let count = docs.len();
                let entry = CachedEntry::new(docs);
                let data = Arc::clone(&entry.data);
                self.entries.insert(key.clone(), entry);
                tracing::debug!(key = %key, count, "cache refreshed from store");

                if self.audit.logs_collection_reads() {
                    self.audit
                        .append(
                            AuditRecord::new(CACHE_PAGE, "Leitura de coleção", collection)
                                .description(format!("{count} documento(s) lidos de {key}"))
                                .actor(self.audit.system_actor()),
                        )
                        .await;
                }
                data
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "collection read failed");
                self.notifier
                    .notify(Notification::warning(
                        "Falha ao carregar dados",
                        format!("Não foi possível ler {collection}; exibindo a última cópia disponível."),
                    ))
                    .await;
                match cached {
                    Some(entry) => {
                        self.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
                        entry.data
                    }
                    None => Arc::new(Vec::new()),
                }
            }
        }
    }

    /// Typed variant of [`ReadThroughCache::get`] over an entity's collection.
    pub async fn get_entities<T: Entity>(
        &self,
        expiration: Duration,
        filter: Option<&Filter>,
    ) -> Result<Vec<T>, CoreError> {
        let docs = self.get(T::COLLECTION, expiration, filter).await;
        docs.iter().map(Document::decode).collect()
    }

    /// Evicts every entry of the named collections, filtered reads included.
    pub fn clear(&self, collections: &[&str]) {
        self.entries.retain(|key, _| {
            let base = key.split_once('?').map_or(key.as_str(), |(base, _)| base);
            !collections.contains(&base)
        });
    }

    pub fn clear_all(&self) {
        self.entries.clear();
        tracing::info!("cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_fallbacks: self.stale_fallbacks.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_separates_filters() {
        assert_eq!(cache_key("setores", None), "setores");
        assert_eq!(cache_key("setores", Some(&Filter::new())), "setores");
        assert_eq!(
            cache_key("leitos", Some(&Filter::eq("status", "vago"))),
            "leitos?status==\"vago\""
        );
    }
}
