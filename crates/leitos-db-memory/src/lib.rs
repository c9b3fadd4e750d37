//! In-memory document store backend for the bed-management dashboard.
//!
//! This crate provides an in-memory implementation of the `DocumentStore`
//! trait from `leitos-storage`, using papaya lock-free HashMap for concurrent
//! access. It backs local runs and every test that needs a live store.
//!
//! # Example
//!
//! ```ignore
//! use leitos_db_memory::InMemoryStore;
//! use leitos_storage::{DocRef, DocumentStore, Fields};
//!
//! let store = InMemoryStore::new();
//! store
//!     .set(&DocRef::new("leitos", "b1"), Fields::new().set("status", "vago"))
//!     .await?;
//! let mut beds = store.subscribe("leitos", None).await?;
//! ```

pub mod factory;
pub mod faults;
pub mod storage;

// Re-export the DocumentStore trait for convenience
pub use leitos_storage::{DocumentStore, DynStore, StorageError};

pub use factory::{StoreBackend, StoreConfig, create_store};
pub use faults::{Fault, FaultInjector};
pub use storage::{InMemoryStore, StoreKey, StoreStats};
