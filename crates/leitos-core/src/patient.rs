use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::{Entity, collections};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(other, rename = "I")]
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AdmissionStatus {
    #[default]
    #[serde(rename = "Internado")]
    Admitted,
    #[serde(rename = "Alta")]
    Discharged,
    #[serde(rename = "Transferido")]
    Transferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegulationStatus {
    AwaitingRegulation,
    Regulated,
}

/// Which transfer, if any, a patient is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingTransfer {
    None,
    IcuTransfer {
        requested_at: Option<OffsetDateTime>,
    },
    Reallocation {
        reason: Option<String>,
        requested_at: Option<OffsetDateTime>,
    },
    /// Both flags are set. The store does not forbid it.
    Conflicting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nomeCompleto")]
    pub name: String,
    /// ISO date (`YYYY-MM-DD`).
    #[serde(rename = "dataNascimento", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(rename = "sexo")]
    pub sex: Sex,
    #[serde(rename = "statusInternacao", default)]
    pub admission_status: AdmissionStatus,
    #[serde(rename = "leitoId", default, skip_serializing_if = "Option::is_none")]
    pub bed_id: Option<String>,
    #[serde(rename = "setorId", default, skip_serializing_if = "Option::is_none")]
    pub sector_id: Option<String>,
    #[serde(rename = "statusRegulacao", default, skip_serializing_if = "Option::is_none")]
    pub regulation_status: Option<RegulationStatus>,
    /// Ids of active isolation types.
    #[serde(rename = "isolamentos", default, skip_serializing_if = "Vec::is_empty")]
    pub isolations: Vec<String>,
    #[serde(rename = "aguardaUTI", default)]
    pub awaiting_icu: bool,
    #[serde(
        rename = "dataPedidoUTI",
        with = "time::serde::rfc3339::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub icu_requested_at: Option<OffsetDateTime>,
    #[serde(rename = "leitoDestinoId", default, skip_serializing_if = "Option::is_none")]
    pub destination_bed_id: Option<String>,
    #[serde(rename = "setorDestinoId", default, skip_serializing_if = "Option::is_none")]
    pub destination_sector_id: Option<String>,
    #[serde(rename = "remanejarPaciente", default)]
    pub reallocation_requested: bool,
    #[serde(rename = "motivoRemanejamento", default, skip_serializing_if = "Option::is_none")]
    pub reallocation_reason: Option<String>,
    #[serde(
        rename = "dataPedidoRemanejamento",
        with = "time::serde::rfc3339::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reallocation_requested_at: Option<OffsetDateTime>,
}

impl Patient {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sex: Sex) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            birth_date: None,
            sex,
            admission_status: AdmissionStatus::Admitted,
            bed_id: None,
            sector_id: None,
            regulation_status: None,
            isolations: Vec::new(),
            awaiting_icu: false,
            icu_requested_at: None,
            destination_bed_id: None,
            destination_sector_id: None,
            reallocation_requested: false,
            reallocation_reason: None,
            reallocation_requested_at: None,
        }
    }

    /// Places the patient on a bed inside a sector.
    pub fn in_bed(mut self, bed_id: impl Into<String>, sector_id: impl Into<String>) -> Self {
        self.bed_id = Some(bed_id.into());
        self.sector_id = Some(sector_id.into());
        self
    }

    pub fn in_sector(mut self, sector_id: impl Into<String>) -> Self {
        self.sector_id = Some(sector_id.into());
        self
    }

    pub fn is_admitted(&self) -> bool {
        self.admission_status == AdmissionStatus::Admitted
    }

    pub fn pending_transfer(&self) -> PendingTransfer {
        match (self.awaiting_icu, self.reallocation_requested) {
            (false, false) => PendingTransfer::None,
            (true, false) => PendingTransfer::IcuTransfer {
                requested_at: self.icu_requested_at,
            },
            (false, true) => PendingTransfer::Reallocation {
                reason: self.reallocation_reason.clone(),
                requested_at: self.reallocation_requested_at,
            },
            (true, true) => PendingTransfer::Conflicting,
        }
    }
}

impl Entity for Patient {
    const COLLECTION: &'static str = collections::PATIENTS;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patient_decodes_minimal_document() {
        let doc = json!({"nomeCompleto": "Maria Souza", "sexo": "F"});
        let patient = Patient::from_document("p1", &doc).unwrap();
        assert_eq!(patient.id, "p1");
        assert_eq!(patient.sex, Sex::Female);
        assert!(patient.is_admitted());
        assert!(!patient.awaiting_icu);
        assert_eq!(patient.pending_transfer(), PendingTransfer::None);
    }

    #[test]
    fn test_unknown_sex_maps_to_unspecified() {
        let doc = json!({"nomeCompleto": "J. Doe", "sexo": "X"});
        let patient = Patient::from_document("p2", &doc).unwrap();
        assert_eq!(patient.sex, Sex::Unspecified);
    }

    #[test]
    fn test_regulation_status_wire_format() {
        assert_eq!(
            serde_json::to_value(RegulationStatus::AwaitingRegulation).unwrap(),
            json!("AWAITING_REGULATION")
        );
    }

    #[test]
    fn test_pending_transfer_variants() {
        let mut patient = Patient::new("p3", "Ana", Sex::Female);
        patient.awaiting_icu = true;
        assert!(matches!(
            patient.pending_transfer(),
            PendingTransfer::IcuTransfer { .. }
        ));

        patient.reallocation_requested = true;
        assert_eq!(patient.pending_transfer(), PendingTransfer::Conflicting);

        patient.awaiting_icu = false;
        patient.reallocation_reason = Some("isolamento".into());
        assert_eq!(
            patient.pending_transfer(),
            PendingTransfer::Reallocation {
                reason: Some("isolamento".into()),
                requested_at: None,
            }
        );
    }
}
