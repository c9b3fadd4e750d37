//! Storage traits for the document store abstraction layer.
//!
//! This module defines the core trait that all store backends must implement,
//! plus typed read helpers built on top of it.

use async_trait::async_trait;
use leitos_core::Entity;

use crate::error::StorageError;
use crate::subscription::Subscription;
use crate::types::{DocRef, Document, Fields, Filter, WriteBatch};

/// The document store every backend implements.
///
/// Single-document writes are last-write-wins. Only [`DocumentStore::commit`]
/// groups several writes atomically. Implementations must be thread-safe
/// (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use leitos_storage::{DocRef, DocumentStore, Fields, StorageError};
///
/// async fn mark_cleaning(store: &dyn DocumentStore, bed_id: &str) -> Result<(), StorageError> {
///     store
///         .update(
///             &DocRef::new("leitos", bed_id),
///             Fields::new().set("status", "limpeza").server_timestamp("dataAtualizacaoStatus"),
///         )
///         .await
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ==================== Reads ====================

    /// Returns every document of `collection` matching `filter`.
    async fn get(
        &self,
        collection: &str,
        filter: Option<&Filter>,
    ) -> Result<Vec<Document>, StorageError>;

    /// Reads one document. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing documents.
    async fn get_one(&self, doc: &DocRef) -> Result<Option<Document>, StorageError>;

    // ==================== Writes ====================

    /// Creates or replaces a document with exactly `fields`.
    async fn set(&self, doc: &DocRef, fields: Fields) -> Result<(), StorageError>;

    /// Merges `fields` into an existing document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist.
    async fn update(&self, doc: &DocRef, fields: Fields) -> Result<(), StorageError>;

    /// Deletes a document. Deleting a missing document succeeds.
    async fn delete(&self, doc: &DocRef) -> Result<(), StorageError>;

    /// Appends a new document with a generated id.
    async fn add_doc(&self, collection: &str, fields: Fields) -> Result<DocRef, StorageError>;

    /// Commits every write of `batch` or none of them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TransactionError` (or the failing write's error)
    /// and leaves the store untouched.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StorageError>;

    // ==================== Live queries ====================

    /// Opens a live subscription on `collection`.
    ///
    /// The returned subscription starts with the current snapshot and
    /// receives a new one after every committed change to the collection.
    async fn subscribe(
        &self,
        collection: &str,
        filter: Option<Filter>,
    ) -> Result<Subscription, StorageError>;

    // ==================== Metadata ====================

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Reads and decodes one entity.
pub async fn load<T: Entity>(
    store: &dyn DocumentStore,
    id: &str,
) -> Result<Option<T>, StorageError> {
    match store.get_one(&DocRef::of::<T>(id)).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// Reads and decodes one entity, failing with `NotFound` if it is missing.
pub async fn require<T: Entity>(store: &dyn DocumentStore, id: &str) -> Result<T, StorageError> {
    load(store, id)
        .await?
        .ok_or_else(|| StorageError::not_found(T::COLLECTION, id))
}

/// Reads and decodes every entity of a collection matching `filter`.
pub async fn load_all<T: Entity>(
    store: &dyn DocumentStore,
    filter: Option<&Filter>,
) -> Result<Vec<T>, StorageError> {
    let docs = store.get(T::COLLECTION, filter).await?;
    docs.iter()
        .map(|doc| doc.decode::<T>().map_err(StorageError::from))
        .collect()
}

/// Writes an entity as a whole document under its own id.
pub async fn save<T: Entity>(store: &dyn DocumentStore, entity: &T) -> Result<(), StorageError> {
    let fields = Fields::from_document(entity.to_document()?)?;
    store.set(&DocRef::of::<T>(entity.id()), fields).await
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test that DocumentStore is object-safe
    fn _assert_store_object_safe(_: &dyn DocumentStore) {}
}
