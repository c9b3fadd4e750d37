//! # leitos-storage
//!
//! Document store abstraction layer for the bed-management dashboard.
//!
//! This crate defines the traits and types every store backend implements.
//! It does not contain any implementation; those live in separate crates.
//!
//! ## Overview
//!
//! The main trait is [`DocumentStore`], which defines the contract for:
//! - point reads and filtered collection reads
//! - single-document writes (`set`, `update`, `delete`, `add_doc`)
//! - atomic multi-document batches ([`WriteBatch`])
//! - live subscriptions producing collection [`Snapshot`]s
//!
//! ## Example
//!
//! ```ignore
//! use leitos_storage::{DocumentStore, Filter, StorageError};
//!
//! async fn blocked_beds(store: &dyn DocumentStore) -> Result<usize, StorageError> {
//!     let docs = store.get("leitos", Some(&Filter::eq("status", "bloqueado"))).await?;
//!     Ok(docs.len())
//! }
//! ```

mod error;
mod subscription;
mod traits;
mod types;

// Re-export everything from submodules
pub use error::{ErrorCategory, StorageError};
pub use subscription::{SnapshotSender, SnapshotState, Subscription};
pub use traits::{DocumentStore, load, load_all, require, save};
pub use types::{
    Condition, DocRef, Document, FieldValue, Fields, Filter, FilterOp, Snapshot, WriteBatch,
    WriteOp,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared store trait object.
pub type DynStore = std::sync::Arc<dyn DocumentStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use leitos_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::subscription::{SnapshotState, Subscription};
    pub use crate::traits::DocumentStore;
    pub use crate::types::{DocRef, Document, Fields, Filter, Snapshot, WriteBatch};
    pub use crate::{DynStore, StorageResult};
}
