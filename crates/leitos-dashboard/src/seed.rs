//! Loads initial documents into a store from a JSON file.
//!
//! The file maps collection names to arrays of document bodies:
//!
//! ```json
//! {
//!   "setores": [{ "id": "s-uti", "nome": "UTI", "sigla": "UTI" }],
//!   "leitos": [{ "id": "b1", "codigo": "UTI-01", "setorId": "s-uti", "status": "vago", "tipo": "crítico" }]
//! }
//! ```
//!
//! A body without an `id` gets a generated one.

use std::collections::BTreeMap;
use std::path::Path;

use leitos_core::generate_id;
use leitos_storage::{DocRef, DocumentStore, Fields, StorageError};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("seed file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid seed layout: {0}")]
    Layout(String),
    #[error(transparent)]
    Store(#[from] StorageError),
}

/// Documents written per collection.
pub type SeedReport = BTreeMap<String, usize>;

pub async fn seed_from_file(
    store: &dyn DocumentStore,
    path: impl AsRef<Path>,
) -> Result<SeedReport, SeedError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
    seed_from_value(store, serde_json::from_str(&raw)?).await
}

pub async fn seed_from_value(
    store: &dyn DocumentStore,
    seed: Value,
) -> Result<SeedReport, SeedError> {
    let Value::Object(collections) = seed else {
        return Err(SeedError::Layout("top level must be an object".into()));
    };

    let mut report = SeedReport::new();
    for (collection, docs) in collections {
        let Value::Array(docs) = docs else {
            return Err(SeedError::Layout(format!("{collection} must be an array")));
        };
        let count = docs.len();
        for doc in docs {
            let Value::Object(mut body) = doc else {
                return Err(SeedError::Layout(format!("{collection} holds a non-object entry")));
            };
            let id = match body.remove("id") {
                Some(Value::String(id)) if !id.is_empty() => id,
                _ => generate_id(),
            };
            let fields = Fields::from_document(Value::Object(body))?;
            store.set(&DocRef::new(&collection, id), fields).await?;
        }
        tracing::debug!(collection = %collection, count, "seeded");
        report.insert(collection, count);
    }
    Ok(report)
}
