use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use leitos_core::events::{ChangeBroadcaster, DocumentEvent};
use leitos_core::generate_id;
use leitos_storage::{
    DocRef, Document, DocumentStore, Fields, Filter, Snapshot, SnapshotState, StorageError,
    Subscription, WriteBatch, WriteOp,
};
use papaya::HashMap as PapayaHashMap;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::faults::{Fault, FaultInjector};

pub type StoreKey = String; // Format: "collection/id"

pub(crate) fn make_store_key(collection: &str, id: &str) -> StoreKey {
    format!("{collection}/{id}")
}

/// Counters describing the work a store has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub reads: u64,
    pub writes: u64,
    pub batches: u64,
    pub failed_batches: u64,
}

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicU64,
    writes: AtomicU64,
    batches: AtomicU64,
    failed_batches: AtomicU64,
}

#[derive(Debug)]
struct Inner {
    data: PapayaHashMap<StoreKey, Document>,
    /// Readers take it shared so they never observe half of a batch.
    commit_lock: RwLock<()>,
    faults: FaultInjector,
    counters: Counters,
    broadcaster: Arc<ChangeBroadcaster>,
}

/// In-memory document store using a papaya lock-free HashMap.
///
/// This store provides:
/// - point reads and filtered collection reads
/// - last-write-wins single-document writes
/// - all-or-nothing batches with rollback
/// - live subscriptions fed by committed change events
/// - fault injection for exercising offline and partial-failure paths
///
/// Cloning is cheap; clones share the same data.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_broadcaster(ChangeBroadcaster::new_shared())
    }

    /// Creates a store publishing its change events on `broadcaster`.
    pub fn with_broadcaster(broadcaster: Arc<ChangeBroadcaster>) -> Self {
        Self {
            inner: Arc::new(Inner {
                data: PapayaHashMap::new(),
                commit_lock: RwLock::new(()),
                faults: FaultInjector::new(),
                counters: Counters::default(),
                broadcaster,
            }),
        }
    }

    pub fn broadcaster(&self) -> &Arc<ChangeBroadcaster> {
        &self.inner.broadcaster
    }

    /// Makes the store simulate `fault` until [`InMemoryStore::clear_faults`].
    pub fn inject(&self, fault: Fault) {
        self.inner.faults.inject(fault);
    }

    pub fn clear_faults(&self) {
        self.inner.faults.clear();
    }

    pub fn stats(&self) -> StoreStats {
        let c = &self.inner.counters;
        StoreStats {
            reads: c.reads.load(Ordering::Relaxed),
            writes: c.writes.load(Ordering::Relaxed),
            batches: c.batches.load(Ordering::Relaxed),
            failed_batches: c.failed_batches.load(Ordering::Relaxed),
        }
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.inner.collect(collection, None).await.len()
    }

    async fn write(&self, op: WriteOp) -> Result<(), StorageError> {
        self.inner.faults.check_write(op.doc_ref())?;

        let event = {
            let _guard = self.inner.commit_lock.write().await;
            let (now, commit_time) = commit_clock()?;
            self.inner.apply(&op, now, &commit_time)?.1
        };

        self.inner.counters.writes.fetch_add(1, Ordering::Relaxed);
        if let Some(event) = event {
            self.inner.broadcaster.send(event);
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    async fn collect(&self, collection: &str, filter: Option<&Filter>) -> Vec<Document> {
        let _guard = self.commit_lock.read().await;
        let prefix = format!("{collection}/");
        let guard = self.data.pin();
        let mut docs: Vec<Document> = guard
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .filter(|(_, doc)| filter.is_none_or(|f| f.matches(&doc.data)))
            .map(|(_, doc)| doc.clone())
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }

    async fn snapshot(&self, collection: &str, filter: Option<&Filter>) -> Snapshot {
        Snapshot::new(collection, self.collect(collection, filter).await)
    }

    /// Applies one write. Returns the previous document (for rollback) and
    /// the change event to publish once the write is committed.
    fn apply(
        &self,
        op: &WriteOp,
        now: OffsetDateTime,
        commit_time: &str,
    ) -> Result<(Option<Document>, Option<DocumentEvent>), StorageError> {
        let doc = op.doc_ref();
        let key = make_store_key(&doc.collection, &doc.id);
        let guard = self.data.pin();
        let previous = guard.get(&key).cloned();

        match op {
            WriteOp::Set { fields, .. } => {
                let mut body = Map::new();
                fields.apply_to(&mut body, commit_time);
                guard.insert(key, stored(doc, body, now));
                let event = if previous.is_some() {
                    DocumentEvent::updated(&doc.collection, &doc.id)
                } else {
                    DocumentEvent::created(&doc.collection, &doc.id)
                };
                Ok((previous, Some(event)))
            }
            WriteOp::Update { fields, .. } => {
                let Some(existing) = previous.as_ref() else {
                    return Err(StorageError::not_found(&doc.collection, &doc.id));
                };
                let mut body = match &existing.data {
                    Value::Object(map) => map.clone(),
                    _ => Map::new(),
                };
                fields.apply_to(&mut body, commit_time);
                guard.insert(key, stored(doc, body, now));
                Ok((previous, Some(DocumentEvent::updated(&doc.collection, &doc.id))))
            }
            WriteOp::Delete { .. } => {
                let event = guard
                    .remove(&key)
                    .map(|_| DocumentEvent::deleted(&doc.collection, &doc.id));
                Ok((previous, event))
            }
        }
    }

    fn restore(&self, doc: &DocRef, previous: Option<Document>) {
        let key = make_store_key(&doc.collection, &doc.id);
        let guard = self.data.pin();
        match previous {
            Some(document) => {
                guard.insert(key, document);
            }
            None => {
                guard.remove(&key);
            }
        }
    }
}

fn stored(doc: &DocRef, body: Map<String, Value>, now: OffsetDateTime) -> Document {
    Document {
        id: doc.id.clone(),
        collection: doc.collection.clone(),
        data: Value::Object(body),
        update_time: now,
    }
}

fn commit_clock() -> Result<(OffsetDateTime, String), StorageError> {
    let now = leitos_core::now_utc();
    let formatted = leitos_core::time::to_rfc3339(now)?;
    Ok((now, formatted))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(
        &self,
        collection: &str,
        filter: Option<&Filter>,
    ) -> Result<Vec<Document>, StorageError> {
        self.inner.faults.check_read(collection)?;
        self.inner.counters.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.inner.collect(collection, filter).await)
    }

    async fn get_one(&self, doc: &DocRef) -> Result<Option<Document>, StorageError> {
        self.inner.faults.check_read(&doc.collection)?;
        self.inner.counters.reads.fetch_add(1, Ordering::Relaxed);
        let _guard = self.inner.commit_lock.read().await;
        let key = make_store_key(&doc.collection, &doc.id);
        Ok(self.inner.data.pin().get(&key).cloned())
    }

    async fn set(&self, doc: &DocRef, fields: Fields) -> Result<(), StorageError> {
        self.write(WriteOp::Set {
            doc: doc.clone(),
            fields,
        })
        .await
    }

    async fn update(&self, doc: &DocRef, fields: Fields) -> Result<(), StorageError> {
        self.write(WriteOp::Update {
            doc: doc.clone(),
            fields,
        })
        .await
    }

    async fn delete(&self, doc: &DocRef) -> Result<(), StorageError> {
        self.write(WriteOp::Delete { doc: doc.clone() }).await
    }

    async fn add_doc(&self, collection: &str, fields: Fields) -> Result<DocRef, StorageError> {
        let doc = DocRef::new(collection, generate_id());
        self.set(&doc, fields).await?;
        Ok(doc)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let ops = batch.into_ops();
        if ops.is_empty() {
            return Ok(());
        }

        let mut events = Vec::with_capacity(ops.len());
        let outcome = {
            let _guard = self.inner.commit_lock.write().await;
            let (now, commit_time) = commit_clock()?;
            let mut applied: Vec<(&DocRef, Option<Document>)> = Vec::with_capacity(ops.len());

            let mut failure = None;
            for (index, op) in ops.iter().enumerate() {
                let result = self
                    .inner
                    .faults
                    .check_batch_write(index, op.doc_ref())
                    .and_then(|()| self.inner.apply(op, now, &commit_time));
                match result {
                    Ok((previous, event)) => {
                        applied.push((op.doc_ref(), previous));
                        events.extend(event);
                    }
                    Err(err) => {
                        failure = Some(StorageError::transaction_error(format!(
                            "batch write {index} ({}) failed: {err}",
                            op.doc_ref()
                        )));
                        break;
                    }
                }
            }

            match failure {
                Some(err) => {
                    for (doc, previous) in applied.into_iter().rev() {
                        self.inner.restore(doc, previous);
                    }
                    Err(err)
                }
                None => Ok(()),
            }
        };

        if let Err(err) = outcome {
            self.inner
                .counters
                .failed_batches
                .fetch_add(1, Ordering::Relaxed);
            warn!(error = %err, writes = ops.len(), "batch rolled back");
            return Err(err);
        }

        let c = &self.inner.counters;
        c.writes.fetch_add(ops.len() as u64, Ordering::Relaxed);
        c.batches.fetch_add(1, Ordering::Relaxed);
        for event in events {
            self.inner.broadcaster.send(event);
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        collection: &str,
        filter: Option<Filter>,
    ) -> Result<Subscription, StorageError> {
        self.inner.faults.check_read(collection)?;

        // Listen before reading so no commit falls between the two.
        let mut events = self.inner.broadcaster.subscribe();
        let initial = self.inner.snapshot(collection, filter.as_ref()).await;
        let (sender, subscription) = Subscription::channel(collection, initial);

        let inner = Arc::clone(&self.inner);
        let collection = collection.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sender.closed() => break,
                    received = events.recv() => {
                        match received {
                            Ok(event) if !event.affects(&collection) => continue,
                            Ok(_) | Err(RecvError::Lagged(_)) => {}
                            Err(RecvError::Closed) => break,
                        }
                        let state = match inner.faults.check_read(&collection) {
                            Ok(()) => SnapshotState::Ready(Arc::new(
                                inner.snapshot(&collection, filter.as_ref()).await,
                            )),
                            Err(err) => SnapshotState::Failed {
                                message: err.to_string(),
                            },
                        };
                        if sender.send(state).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(collection = %collection, "subscription released");
        });

        Ok(subscription)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
