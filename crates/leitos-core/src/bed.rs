use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use crate::entity::{Entity, collections};

/// Operational status of a bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BedStatus {
    #[serde(rename = "vago")]
    Vacant,
    #[serde(rename = "ocupado")]
    Occupied,
    #[serde(rename = "reservado")]
    Reserved,
    #[serde(rename = "bloqueado")]
    Blocked,
    #[serde(rename = "limpeza")]
    Cleaning,
    #[serde(rename = "mecânica")]
    Maintenance,
}

impl BedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedStatus::Vacant => "vago",
            BedStatus::Occupied => "ocupado",
            BedStatus::Reserved => "reservado",
            BedStatus::Blocked => "bloqueado",
            BedStatus::Cleaning => "limpeza",
            BedStatus::Maintenance => "mecânica",
        }
    }

    /// Whether a patient can be moved into a bed in this status.
    pub fn accepts_patient(&self) -> bool {
        matches!(self, BedStatus::Vacant | BedStatus::Reserved)
    }
}

impl fmt::Display for BedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BedType {
    #[serde(rename = "clínico")]
    Clinical,
    #[serde(rename = "crítico")]
    Critical,
    #[serde(rename = "isolamento")]
    Isolation,
}

/// A physical bed tracked for occupancy.
///
/// `status == Occupied` goes together with `current_patient_id` being set;
/// every other status has no current patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "setorId")]
    pub sector_id: String,
    pub status: BedStatus,
    #[serde(rename = "tipo")]
    pub bed_type: BedType,
    #[serde(rename = "isPCP", default)]
    pub is_pcp: bool,
    #[serde(rename = "pacienteId", default, skip_serializing_if = "Option::is_none")]
    pub current_patient_id: Option<String>,
    #[serde(
        rename = "dataAtualizacaoStatus",
        with = "time::serde::rfc3339::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_changed_at: Option<OffsetDateTime>,
    #[serde(rename = "motivoBloqueio", default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    #[serde(rename = "alertas", default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<String>,
}

impl Bed {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        sector_id: impl Into<String>,
        bed_type: BedType,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            sector_id: sector_id.into(),
            status: BedStatus::Vacant,
            bed_type,
            is_pcp: false,
            current_patient_id: None,
            status_changed_at: None,
            block_reason: None,
            alerts: Vec::new(),
        }
    }

    /// Marks the bed occupied by `patient_id`.
    pub fn occupied_by(mut self, patient_id: impl Into<String>) -> Self {
        self.status = BedStatus::Occupied;
        self.current_patient_id = Some(patient_id.into());
        self
    }

    pub fn with_status(mut self, status: BedStatus) -> Self {
        self.status = status;
        self
    }

    pub fn pcp(mut self) -> Self {
        self.is_pcp = true;
        self
    }

    pub fn is_occupied(&self) -> bool {
        self.status == BedStatus::Occupied
    }

    pub fn is_blocked(&self) -> bool {
        self.status == BedStatus::Blocked
    }
}

impl Entity for Bed {
    const COLLECTION: &'static str = collections::BEDS;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bed_status_serialization() {
        assert_eq!(serde_json::to_value(BedStatus::Cleaning).unwrap(), json!("limpeza"));
        assert_eq!(
            serde_json::from_value::<BedStatus>(json!("mecânica")).unwrap(),
            BedStatus::Maintenance
        );
        assert!(serde_json::from_value::<BedStatus>(json!("desconhecido")).is_err());
    }

    #[test]
    fn test_bed_decodes_from_document() {
        let doc = json!({
            "codigo": "UTI-01",
            "setorId": "uti",
            "status": "ocupado",
            "tipo": "crítico",
            "isPCP": true,
            "pacienteId": "p1",
            "dataAtualizacaoStatus": "2024-03-10T08:00:00Z"
        });
        let bed = Bed::from_document("b1", &doc).unwrap();
        assert_eq!(bed.id, "b1");
        assert!(bed.is_occupied());
        assert!(bed.is_pcp);
        assert_eq!(bed.current_patient_id.as_deref(), Some("p1"));
        assert!(bed.status_changed_at.is_some());
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let bed = Bed::new("b2", "CM-12", "cm", BedType::Clinical);
        let doc = bed.to_document().unwrap();
        assert!(doc.get("pacienteId").is_none());
        assert!(doc.get("motivoBloqueio").is_none());
        assert_eq!(doc["status"], "vago");
    }

    #[test]
    fn test_accepts_patient() {
        assert!(BedStatus::Vacant.accepts_patient());
        assert!(BedStatus::Reserved.accepts_patient());
        assert!(!BedStatus::Blocked.accepts_patient());
        assert!(!BedStatus::Occupied.accepts_patient());
    }
}
