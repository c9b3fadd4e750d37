//! Storage types for the document store abstraction layer.
//!
//! This module defines all data types used by the storage traits.

use std::fmt;

use leitos_core::{CoreError, Entity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::StorageError;

/// Reference to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocRef {
    pub collection: String,
    pub id: String,
}

impl DocRef {
    #[must_use]
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Reference to the document backing entity type `T` with the given id.
    #[must_use]
    pub fn of<T: Entity>(id: impl Into<String>) -> Self {
        Self::new(T::COLLECTION, id)
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as stored in the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The document ID.
    pub id: String,
    /// The collection the document lives in.
    pub collection: String,
    /// The document body (a JSON object, without the id).
    pub data: Value,
    /// When this document was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub update_time: OffsetDateTime,
}

impl Document {
    #[must_use]
    pub fn doc_ref(&self) -> DocRef {
        DocRef::new(&self.collection, &self.id)
    }

    /// Returns a top-level field of the body.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Decodes the document into its typed entity.
    pub fn decode<T: Entity>(&self) -> Result<T, CoreError> {
        T::from_document(&self.id, &self.data)
    }
}

/// Comparison used by a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Field equals the value.
    Eq,
    /// Field differs from the value (missing fields match).
    NotEq,
    /// Field equals one of the values (the condition value is an array).
    In,
}

/// A single `field <op> value` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Condition {
    fn matches(&self, data: &Value) -> bool {
        let actual = data.get(&self.field);
        match self.op {
            FilterOp::Eq => actual == Some(&self.value),
            FilterOp::NotEq => actual != Some(&self.value),
            FilterOp::In => match (&self.value, actual) {
                (Value::Array(candidates), Some(actual)) => candidates.contains(actual),
                _ => false,
            },
        }
    }
}

/// Conjunction of conditions applied to a collection query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(field, FilterOp::Eq, value)
    }

    #[must_use]
    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new().and(field, FilterOp::In, Value::Array(values))
    }

    #[must_use]
    pub fn and(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns true when every condition holds for `data`.
    #[must_use]
    pub fn matches(&self, data: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(data))
    }

    /// Stable textual form, usable as part of a cache key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.conditions
            .iter()
            .map(|c| {
                let op = match c.op {
                    FilterOp::Eq => "==",
                    FilterOp::NotEq => "!=",
                    FilterOp::In => "in",
                };
                format!("{}{}{}", c.field, op, c.value)
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Value written to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Store the given value.
    Set(Value),
    /// Store the backend's commit time (RFC 3339).
    ServerTimestamp,
    /// Remove the field.
    Delete,
}

/// Ordered list of field writes for `set`, `update` and `add_doc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((field.into(), FieldValue::Set(value.into())));
        self
    }

    #[must_use]
    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.entries.push((field.into(), FieldValue::ServerTimestamp));
        self
    }

    #[must_use]
    pub fn delete(mut self, field: impl Into<String>) -> Self {
        self.entries.push((field.into(), FieldValue::Delete));
        self
    }

    /// Builds a field list from a full document body.
    pub fn from_document(body: Value) -> Result<Self, StorageError> {
        match body {
            Value::Object(map) => Ok(Self {
                entries: map
                    .into_iter()
                    .map(|(k, v)| (k, FieldValue::Set(v)))
                    .collect(),
            }),
            other => Err(StorageError::invalid_document(format!(
                "expected an object body, got {other}"
            ))),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, FieldValue)] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies the writes onto `target`, resolving server timestamps to `commit_time`.
    pub fn apply_to(&self, target: &mut Map<String, Value>, commit_time: &str) {
        for (field, value) in &self.entries {
            match value {
                FieldValue::Set(v) => {
                    target.insert(field.clone(), v.clone());
                }
                FieldValue::ServerTimestamp => {
                    target.insert(field.clone(), Value::String(commit_time.to_string()));
                }
                FieldValue::Delete => {
                    target.remove(field);
                }
            }
        }
    }
}

/// One write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or replace the document.
    Set { doc: DocRef, fields: Fields },
    /// Merge fields into an existing document; fails if it does not exist.
    Update { doc: DocRef, fields: Fields },
    /// Remove the document.
    Delete { doc: DocRef },
}

impl WriteOp {
    #[must_use]
    pub fn doc_ref(&self) -> &DocRef {
        match self {
            WriteOp::Set { doc, .. } | WriteOp::Update { doc, .. } | WriteOp::Delete { doc } => {
                doc
            }
        }
    }
}

/// Group of writes committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, doc: DocRef, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Set { doc, fields });
        self
    }

    pub fn update(&mut self, doc: DocRef, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update { doc, fields });
        self
    }

    pub fn delete(&mut self, doc: DocRef) -> &mut Self {
        self.ops.push(WriteOp::Delete { doc });
        self
    }

    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Full state of a (possibly filtered) collection at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub collection: String,
    pub documents: Vec<Document>,
    #[serde(with = "time::serde::rfc3339")]
    pub read_time: OffsetDateTime,
}

impl Snapshot {
    #[must_use]
    pub fn new(collection: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            collection: collection.into(),
            documents,
            read_time: OffsetDateTime::now_utc(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Decodes every document, failing on the first malformed one.
    pub fn decode_all<T: Entity>(&self) -> Result<Vec<T>, CoreError> {
        self.documents.iter().map(Document::decode).collect()
    }
}
