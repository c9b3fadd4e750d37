//! Mapping between typed domain entities and raw store documents.
//!
//! Documents carry their id outside the JSON body. Decoding injects the id
//! into the body before deserializing; encoding strips it again.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Collection names used by the dashboard store.
pub mod collections {
    pub const SECTORS: &str = "setores";
    pub const BEDS: &str = "leitos";
    pub const PATIENTS: &str = "pacientes";
    pub const PCP_LEVELS: &str = "niveisPCP";
    pub const ISOLATION_TYPES: &str = "isolamentos";
    pub const LOGS: &str = "logs";
}

/// A domain type stored as one document in a fixed collection.
pub trait Entity: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// Decodes a document body, using `id` as the entity id.
    fn from_document(id: &str, data: &Value) -> Result<Self> {
        let Value::Object(map) = data else {
            return Err(CoreError::invalid_document(
                Self::COLLECTION,
                id,
                "document body is not an object",
            ));
        };
        let mut body = map.clone();
        body.insert("id".to_string(), Value::String(id.to_string()));
        serde_json::from_value(Value::Object(body))
            .map_err(|e| CoreError::invalid_document(Self::COLLECTION, id, e.to_string()))
    }

    /// Encodes the entity as a document body (without its id).
    fn to_document(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("id");
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sector;
    use serde_json::json;

    #[test]
    fn test_from_document_injects_id() {
        let sector = Sector::from_document(
            "s1",
            &json!({"nome": "UTI Adulto", "sigla": "UTI", "tipo": "critico"}),
        )
        .unwrap();
        assert_eq!(sector.id, "s1");
        assert_eq!(sector.abbreviation, "UTI");
    }

    #[test]
    fn test_from_document_rejects_non_object() {
        let err = Sector::from_document("s1", &json!(["not", "an", "object"])).unwrap_err();
        assert!(err.to_string().contains("setores/s1"));
    }

    #[test]
    fn test_to_document_strips_id() {
        let sector = Sector::new("s2", "Centro Cirúrgico", "CC");
        let doc = sector.to_document().unwrap();
        assert!(doc.get("id").is_none());
        assert_eq!(doc["sigla"], "CC");
    }
}
