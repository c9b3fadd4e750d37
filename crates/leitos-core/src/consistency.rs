//! Occupancy consistency checks between beds and patients.
//!
//! A bed is `ocupado` exactly when it names a current patient that exists
//! and whose own bed reference points back at it. Beds in any other status
//! name no patient.

use std::collections::HashMap;

use thiserror::Error;

use crate::bed::{Bed, BedStatus};
use crate::patient::Patient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OccupancyViolation {
    #[error("bed {bed_id} is occupied but has no current patient")]
    OccupiedWithoutPatient { bed_id: String },

    #[error("bed {bed_id} references missing patient {patient_id}")]
    MissingPatient { bed_id: String, patient_id: String },

    #[error("bed {bed_id} holds patient {patient_id}, who is assigned to {patient_bed:?}")]
    BackReferenceMismatch {
        bed_id: String,
        patient_id: String,
        patient_bed: Option<String>,
    },

    #[error("bed {bed_id} has status {status} but still holds patient {patient_id}")]
    PatientOnFreeBed {
        bed_id: String,
        patient_id: String,
        status: BedStatus,
    },
}

/// Returns every occupancy violation found, in bed order.
pub fn check_occupancy(beds: &[Bed], patients: &[Patient]) -> Vec<OccupancyViolation> {
    let by_id: HashMap<&str, &Patient> = patients.iter().map(|p| (p.id.as_str(), p)).collect();
    let mut violations = Vec::new();

    for bed in beds {
        match (bed.status, bed.current_patient_id.as_deref()) {
            (BedStatus::Occupied, None) => {
                violations.push(OccupancyViolation::OccupiedWithoutPatient {
                    bed_id: bed.id.clone(),
                });
            }
            (BedStatus::Occupied, Some(patient_id)) => match by_id.get(patient_id) {
                None => violations.push(OccupancyViolation::MissingPatient {
                    bed_id: bed.id.clone(),
                    patient_id: patient_id.to_string(),
                }),
                Some(patient) if patient.bed_id.as_deref() != Some(bed.id.as_str()) => {
                    violations.push(OccupancyViolation::BackReferenceMismatch {
                        bed_id: bed.id.clone(),
                        patient_id: patient_id.to_string(),
                        patient_bed: patient.bed_id.clone(),
                    });
                }
                Some(_) => {}
            },
            (status, Some(patient_id)) => {
                violations.push(OccupancyViolation::PatientOnFreeBed {
                    bed_id: bed.id.clone(),
                    patient_id: patient_id.to_string(),
                    status,
                });
            }
            (_, None) => {}
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bed::BedType;
    use crate::patient::Sex;

    #[test]
    fn test_consistent_ward() {
        let beds = vec![
            Bed::new("b1", "CM-01", "cm", BedType::Clinical).occupied_by("p1"),
            Bed::new("b2", "CM-02", "cm", BedType::Clinical),
        ];
        let patients = vec![Patient::new("p1", "Ana", Sex::Female).in_bed("b1", "cm")];
        assert!(check_occupancy(&beds, &patients).is_empty());
    }

    #[test]
    fn test_detects_each_violation() {
        let mut stray = Bed::new("b4", "CM-04", "cm", BedType::Clinical)
            .with_status(BedStatus::Cleaning);
        stray.current_patient_id = Some("p2".into());

        let beds = vec![
            Bed::new("b1", "CM-01", "cm", BedType::Clinical).with_status(BedStatus::Occupied),
            Bed::new("b2", "CM-02", "cm", BedType::Clinical).occupied_by("ghost"),
            Bed::new("b3", "CM-03", "cm", BedType::Clinical).occupied_by("p2"),
            stray,
        ];
        let patients = vec![Patient::new("p2", "Bruno", Sex::Male).in_bed("b9", "cm")];

        let violations = check_occupancy(&beds, &patients);
        assert_eq!(violations.len(), 4);
        assert!(matches!(
            violations[0],
            OccupancyViolation::OccupiedWithoutPatient { .. }
        ));
        assert!(matches!(violations[1], OccupancyViolation::MissingPatient { .. }));
        assert!(matches!(
            violations[2],
            OccupancyViolation::BackReferenceMismatch { .. }
        ));
        assert!(matches!(
            violations[3],
            OccupancyViolation::PatientOnFreeBed {
                status: BedStatus::Cleaning,
                ..
            }
        ));
    }

    #[test]
    fn test_violation_display() {
        let v = OccupancyViolation::MissingPatient {
            bed_id: "b2".into(),
            patient_id: "ghost".into(),
        };
        assert_eq!(v.to_string(), "bed b2 references missing patient ghost");
    }
}
