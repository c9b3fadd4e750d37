mod common;

use std::sync::Arc;
use std::time::Duration;

use common::seed_ward;
use leitos_core::{Bed, collections};
use leitos_dashboard::config::AuditConfig;
use leitos_dashboard::{AuditLogger, BroadcastNotifier, ReadThroughCache, Severity};
use leitos_db_memory::{Fault, InMemoryStore};
use leitos_storage::{DynStore, Filter};

const TTL: Duration = Duration::from_secs(60);

async fn setup(audit: AuditConfig) -> (InMemoryStore, Arc<BroadcastNotifier>, ReadThroughCache) {
    let store = InMemoryStore::new();
    seed_ward(&store).await;
    let dyn_store: DynStore = Arc::new(store.clone());
    let notifier = Arc::new(BroadcastNotifier::default());
    let cache = ReadThroughCache::new(
        dyn_store.clone(),
        AuditLogger::new(dyn_store, audit),
        notifier.clone(),
    );
    (store, notifier, cache)
}

#[tokio::test(start_paused = true)]
async fn fresh_entry_is_served_without_store_read() {
    let (store, _notifier, cache) = setup(AuditConfig::default()).await;
    let reads = store.stats().reads;

    let first = cache.get(collections::BEDS, TTL, None).await;
    assert_eq!(first.len(), 4);
    assert_eq!(store.stats().reads, reads + 1);

    tokio::time::advance(Duration::from_secs(30)).await;
    let second = cache.get(collections::BEDS, TTL, None).await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.stats().reads, reads + 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    cache.get(collections::BEDS, TTL, None).await;
    assert_eq!(store.stats().reads, reads + 2);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.entries, 1);
}

#[tokio::test(start_paused = true)]
async fn store_reads_are_audited() {
    let (store, _notifier, cache) = setup(AuditConfig::default()).await;

    cache.get(collections::SECTORS, TTL, None).await;
    cache.get(collections::SECTORS, TTL, None).await;
    assert_eq!(store.count(collections::LOGS).await, 1);
}

#[tokio::test(start_paused = true)]
async fn read_audit_can_be_disabled() {
    let audit = AuditConfig {
        log_collection_reads: false,
        ..AuditConfig::default()
    };
    let (store, _notifier, cache) = setup(audit).await;

    cache.get(collections::SECTORS, TTL, None).await;
    assert_eq!(store.count(collections::LOGS).await, 0);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_falls_back_to_stale_entry() {
    let (store, notifier, cache) = setup(AuditConfig::default()).await;
    let mut toasts = notifier.subscribe();

    let cached = cache.get(collections::BEDS, TTL, None).await;
    tokio::time::advance(Duration::from_secs(120)).await;

    store.inject(Fault::Offline);
    let stale = cache.get(collections::BEDS, TTL, None).await;
    assert!(Arc::ptr_eq(&cached, &stale));
    assert_eq!(cache.stats().stale_fallbacks, 1);
    assert_eq!(toasts.try_recv().unwrap().severity, Severity::Warning);

    // Nothing cached: empty result, still warned.
    let patients = cache.get(collections::PATIENTS, TTL, None).await;
    assert!(patients.is_empty());
    assert_eq!(toasts.try_recv().unwrap().severity, Severity::Warning);
}

#[tokio::test(start_paused = true)]
async fn filtered_reads_are_cached_separately() {
    let (store, _notifier, cache) = setup(AuditConfig::default()).await;
    let vacant = Filter::eq("status", "vago");

    let all = cache.get(collections::BEDS, TTL, None).await;
    let only_vacant = cache.get(collections::BEDS, TTL, Some(&vacant)).await;
    assert_eq!(all.len(), 4);
    assert_eq!(only_vacant.len(), 2);
    assert_eq!(cache.stats().entries, 2);

    let beds: Vec<Bed> = cache.get_entities(TTL, Some(&vacant)).await.unwrap();
    assert!(beds.iter().all(|b| !b.is_occupied()));
    assert_eq!(store.stats().reads, 2);
}

#[tokio::test(start_paused = true)]
async fn clear_evicts_named_collections() {
    let (store, _notifier, cache) = setup(AuditConfig::default()).await;
    let vacant = Filter::eq("status", "vago");

    cache.get(collections::BEDS, TTL, None).await;
    cache.get(collections::BEDS, TTL, Some(&vacant)).await;
    cache.get(collections::SECTORS, TTL, None).await;

    cache.clear(&[collections::BEDS]);
    assert_eq!(cache.stats().entries, 1);

    let reads = store.stats().reads;
    cache.get(collections::BEDS, TTL, None).await;
    assert_eq!(store.stats().reads, reads + 1);

    cache.clear_all();
    assert_eq!(cache.stats().entries, 0);
}
