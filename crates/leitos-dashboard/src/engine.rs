//! Bed/patient state engine.
//!
//! Every operation resolves its bed and patient ids, writes the bed and
//! patient fields together, appends one audit entry and reports the outcome
//! through the notifier. Store failures are returned to the caller; nothing
//! is retried.
//!
//! Bed status machine:
//!
//! ```text
//! vago -> ocupado -> limpeza -> vago
//!   \        (alta / UTI)      /
//!    +--> reservado (UTI) ----+
//! vago | reservado | limpeza | mecânica -> bloqueado
//! ```

use std::fmt;
use std::sync::Arc;

use leitos_core::{Bed, BedStatus, Patient, format_wait, now_utc};
use leitos_storage::{DocRef, DocumentStore, DynStore, Fields, WriteBatch, load};

use crate::audit::{AuditLogger, AuditRecord};
use crate::error::{EngineError, EngineResult, ValidationError};
use crate::notify::{Notification, Notifier};

/// Document field names written by the engine.
mod fields {
    pub const STATUS: &str = "status";
    pub const STATUS_CHANGED_AT: &str = "dataAtualizacaoStatus";
    pub const BED_PATIENT: &str = "pacienteId";
    pub const BLOCK_REASON: &str = "motivoBloqueio";

    pub const PATIENT_BED: &str = "leitoId";
    pub const PATIENT_SECTOR: &str = "setorId";
    pub const AWAITING_ICU: &str = "aguardaUTI";
    pub const ICU_REQUESTED_AT: &str = "dataPedidoUTI";
    pub const DESTINATION_BED: &str = "leitoDestinoId";
    pub const DESTINATION_SECTOR: &str = "setorDestinoId";
    pub const REALLOCATE: &str = "remanejarPaciente";
    pub const REALLOCATION_REASON: &str = "motivoRemanejamento";
    pub const REALLOCATION_REQUESTED_AT: &str = "dataPedidoRemanejamento";
}

const PAGE_BED_MAP: &str = "Mapa de Leitos";
const PAGE_ICU: &str = "Pacientes UTI";
const PAGE_REALLOCATION: &str = "Remanejamentos";

/// The user on whose behalf operations run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FlagAwaitingIcu,
    CancelIcuRequest,
    Discharge,
    RequestReallocation,
    CancelReallocation,
    AssignIcuDestination,
    ConfirmIcuTransfer,
    BlockBed,
}

impl Operation {
    /// Action name recorded in the audit log.
    pub fn action(&self) -> &'static str {
        match self {
            Self::FlagAwaitingIcu => "Pedido de UTI",
            Self::CancelIcuRequest => "Cancelamento de pedido de UTI",
            Self::Discharge => "Alta",
            Self::RequestReallocation => "Pedido de remanejamento",
            Self::CancelReallocation => "Cancelamento de remanejamento",
            Self::AssignIcuDestination => "Reserva de leito de UTI",
            Self::ConfirmIcuTransfer => "Transferência para UTI",
            Self::BlockBed => "Bloqueio de leito",
        }
    }

    fn page(&self) -> &'static str {
        match self {
            Self::FlagAwaitingIcu | Self::Discharge | Self::BlockBed => PAGE_BED_MAP,
            Self::CancelIcuRequest | Self::AssignIcuDestination | Self::ConfirmIcuTransfer => {
                PAGE_ICU
            }
            Self::RequestReallocation | Self::CancelReallocation => PAGE_REALLOCATION,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// What a successful operation reports.
struct Outcome {
    target: String,
    description: String,
}

impl Outcome {
    fn new(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            description: description.into(),
        }
    }
}

#[derive(Clone)]
pub struct BedEngine {
    store: DynStore,
    audit: AuditLogger,
    notifier: Arc<dyn Notifier>,
    icu_sector_id: String,
    actor: Actor,
}

impl BedEngine {
    pub fn new(
        store: DynStore,
        audit: AuditLogger,
        notifier: Arc<dyn Notifier>,
        icu_sector_id: impl Into<String>,
    ) -> Self {
        let actor = Actor::new(audit.system_actor());
        Self {
            store,
            audit,
            notifier,
            icu_sector_id: icu_sector_id.into(),
            actor,
        }
    }

    /// Returns an engine acting on behalf of `actor`.
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    // ==================== ICU requests ====================

    /// Flags the patient in `bed_id` as waiting for an ICU bed.
    pub async fn flag_awaiting_icu(&self, bed_id: &str, patient_id: &str) -> EngineResult<()> {
        let outcome = self.try_flag_awaiting_icu(bed_id, patient_id).await;
        self.finish(Operation::FlagAwaitingIcu, outcome).await
    }

    /// Withdraws an ICU request. `reason` is recorded as given.
    ///
    /// A destination bed already reserved for the patient is released.
    pub async fn cancel_icu_request(&self, patient_id: &str, reason: &str) -> EngineResult<()> {
        let outcome = self.try_cancel_icu_request(patient_id, reason).await;
        self.finish(Operation::CancelIcuRequest, outcome).await
    }

    /// Reserves `destination_bed_id` for a patient awaiting ICU.
    pub async fn assign_icu_destination(
        &self,
        patient_id: &str,
        destination_bed_id: &str,
    ) -> EngineResult<()> {
        let outcome = self.try_assign_icu_destination(patient_id, destination_bed_id).await;
        self.finish(Operation::AssignIcuDestination, outcome).await
    }

    /// Moves a patient into an ICU bed.
    ///
    /// The patient, the bed they leave (if any) and the destination bed are
    /// written in one atomic batch. The audit entry is written after the
    /// commit and records how long the patient waited.
    pub async fn confirm_icu_transfer(
        &self,
        patient_id: &str,
        destination_bed_id: &str,
    ) -> EngineResult<()> {
        let outcome = self.try_confirm_icu_transfer(patient_id, destination_bed_id).await;
        self.finish(Operation::ConfirmIcuTransfer, outcome).await
    }

    // ==================== Discharge ====================

    /// Discharges the patient: the patient document is removed and the bed
    /// goes to cleaning, in one batch.
    pub async fn discharge_patient(&self, bed_id: &str, patient_id: &str) -> EngineResult<()> {
        let outcome = self.try_discharge_patient(bed_id, patient_id).await;
        self.finish(Operation::Discharge, outcome).await
    }

    // ==================== Reallocation ====================

    pub async fn request_reallocation(
        &self,
        bed_id: &str,
        patient_id: &str,
        reason: &str,
    ) -> EngineResult<()> {
        let outcome = self.try_request_reallocation(bed_id, patient_id, reason).await;
        self.finish(Operation::RequestReallocation, outcome).await
    }

    pub async fn cancel_reallocation(&self, patient_id: &str) -> EngineResult<()> {
        let outcome = self.try_cancel_reallocation(patient_id).await;
        self.finish(Operation::CancelReallocation, outcome).await
    }

    // ==================== Beds ====================

    /// Blocks a bed. A blank reason fails before the store is touched.
    pub async fn block_bed(&self, bed_id: &str, reason: &str) -> EngineResult<()> {
        let outcome = self.try_block_bed(bed_id, reason).await;
        self.finish(Operation::BlockBed, outcome).await
    }

    // ==================== Operation bodies ====================

    async fn try_flag_awaiting_icu(&self, bed_id: &str, patient_id: &str) -> EngineResult<Outcome> {
        let bed = self.bed(bed_id).await?;
        let patient = self.patient(patient_id).await?;
        if patient.reallocation_requested {
            tracing::warn!(
                patient_id,
                "patient has a pending reallocation and is now also awaiting ICU"
            );
        }

        self.store
            .update(
                &DocRef::of::<Patient>(patient_id),
                Fields::new()
                    .set(fields::AWAITING_ICU, true)
                    .server_timestamp(fields::ICU_REQUESTED_AT),
            )
            .await?;

        Ok(Outcome::new(
            patient_id,
            format!(
                "Paciente {} (leito {}) aguardando leito de UTI",
                patient.name, bed.code
            ),
        ))
    }

    async fn try_cancel_icu_request(
        &self,
        patient_id: &str,
        reason: &str,
    ) -> EngineResult<Outcome> {
        let patient = self.patient(patient_id).await?;

        let mut batch = WriteBatch::new();
        batch.update(
            DocRef::of::<Patient>(patient_id),
            Fields::new()
                .set(fields::AWAITING_ICU, false)
                .delete(fields::ICU_REQUESTED_AT)
                .delete(fields::DESTINATION_BED)
                .delete(fields::DESTINATION_SECTOR),
        );
        if let Some(reserved) = patient.destination_bed_id.as_deref() {
            self.release_reservation(&mut batch, reserved).await?;
        }
        self.store.commit(batch).await?;

        Ok(Outcome::new(
            patient_id,
            format!(
                "Pedido de UTI do paciente {} cancelado. Motivo: {reason}",
                patient.name
            ),
        ))
    }

    async fn try_assign_icu_destination(
        &self,
        patient_id: &str,
        destination_bed_id: &str,
    ) -> EngineResult<Outcome> {
        let patient = self.patient(patient_id).await?;
        if !patient.awaiting_icu {
            return Err(ValidationError::NotAwaitingIcu {
                patient_id: patient_id.to_string(),
            }
            .into());
        }
        let destination = self.bed(destination_bed_id).await?;
        check_destination(&destination, &patient)?;

        let mut batch = WriteBatch::new();
        batch
            .update(
                DocRef::of::<Patient>(patient_id),
                Fields::new()
                    .set(fields::DESTINATION_BED, destination_bed_id)
                    .set(fields::DESTINATION_SECTOR, destination.sector_id.as_str()),
            )
            .update(
                DocRef::of::<Bed>(destination_bed_id),
                Fields::new()
                    .set(fields::STATUS, BedStatus::Reserved.as_str())
                    .server_timestamp(fields::STATUS_CHANGED_AT),
            );
        if let Some(previous) = patient.destination_bed_id.as_deref()
            && previous != destination_bed_id
        {
            self.release_reservation(&mut batch, previous).await?;
        }
        self.store.commit(batch).await?;

        Ok(Outcome::new(
            patient_id,
            format!(
                "Leito {} reservado para o paciente {}",
                destination.code, patient.name
            ),
        ))
    }

    async fn try_confirm_icu_transfer(
        &self,
        patient_id: &str,
        destination_bed_id: &str,
    ) -> EngineResult<Outcome> {
        let patient = self.patient(patient_id).await?;

        // The code is only used for the log message.
        let destination = match load::<Bed>(self.store.as_ref(), destination_bed_id).await {
            Ok(Some(bed)) => Some(bed),
            Ok(None) => return Err(EngineError::not_found("bed", destination_bed_id)),
            Err(e) => {
                tracing::warn!(bed_id = destination_bed_id, error = %e, "destination bed lookup failed");
                None
            }
        };
        if let Some(bed) = &destination {
            check_destination(bed, &patient)?;
        }
        let code = destination.map(|b| b.code).unwrap_or_default();

        let mut batch = WriteBatch::new();
        batch.update(
            DocRef::of::<Patient>(patient_id),
            Fields::new()
                .set(fields::PATIENT_BED, destination_bed_id)
                .set(fields::PATIENT_SECTOR, self.icu_sector_id.as_str())
                .delete(fields::DESTINATION_BED)
                .delete(fields::DESTINATION_SECTOR)
                .set(fields::AWAITING_ICU, false)
                .delete(fields::ICU_REQUESTED_AT),
        );
        if let Some(prior) = patient.bed_id.as_deref()
            && prior != destination_bed_id
        {
            if self.store.get_one(&DocRef::of::<Bed>(prior)).await?.is_some() {
                batch.update(DocRef::of::<Bed>(prior), Self::vacate_for_cleaning());
            } else {
                tracing::warn!(bed_id = prior, patient_id, "prior bed no longer exists");
            }
        }
        batch.update(
            DocRef::of::<Bed>(destination_bed_id),
            Fields::new()
                .set(fields::STATUS, BedStatus::Occupied.as_str())
                .set(fields::BED_PATIENT, patient_id)
                .server_timestamp(fields::STATUS_CHANGED_AT),
        );
        if let Some(reserved) = patient.destination_bed_id.as_deref()
            && reserved != destination_bed_id
        {
            self.release_reservation(&mut batch, reserved).await?;
        }
        self.store.commit(batch).await?;

        let wait = patient
            .icu_requested_at
            .map(|since| format_wait(since, now_utc()))
            .unwrap_or_else(|| "não informado".to_string());
        Ok(Outcome::new(
            patient_id,
            format!(
                "Paciente {} transferido para o leito {code} da UTI. Tempo de espera: {wait}",
                patient.name
            ),
        ))
    }

    async fn try_discharge_patient(&self, bed_id: &str, patient_id: &str) -> EngineResult<Outcome> {
        let bed = self.bed(bed_id).await?;
        let patient = self.patient(patient_id).await?;
        // A bed naming someone else keeps that patient; only an empty bed
        // may be claimed through the patient's own reference.
        let linked = match bed.current_patient_id.as_deref() {
            Some(holder) => holder == patient_id,
            None => patient.bed_id.as_deref() == Some(bed_id),
        };
        if !linked {
            return Err(ValidationError::PatientNotInBed {
                bed_id: bed_id.to_string(),
                patient_id: patient_id.to_string(),
            }
            .into());
        }

        let mut batch = WriteBatch::new();
        batch
            .delete(DocRef::of::<Patient>(patient_id))
            .update(DocRef::of::<Bed>(bed_id), Self::vacate_for_cleaning());
        if let Some(reserved) = patient.destination_bed_id.as_deref() {
            self.release_reservation(&mut batch, reserved).await?;
        }
        self.store.commit(batch).await?;

        Ok(Outcome::new(
            bed_id,
            format!("Alta do paciente {} no leito {}", patient.name, bed.code),
        ))
    }

    async fn try_request_reallocation(
        &self,
        bed_id: &str,
        patient_id: &str,
        reason: &str,
    ) -> EngineResult<Outcome> {
        let bed = self.bed(bed_id).await?;
        let patient = self.patient(patient_id).await?;
        if patient.awaiting_icu {
            tracing::warn!(
                patient_id,
                "patient is awaiting ICU and now also has a pending reallocation"
            );
        }

        self.store
            .update(
                &DocRef::of::<Patient>(patient_id),
                Fields::new()
                    .set(fields::REALLOCATE, true)
                    .set(fields::REALLOCATION_REASON, reason)
                    .server_timestamp(fields::REALLOCATION_REQUESTED_AT),
            )
            .await?;

        Ok(Outcome::new(
            patient_id,
            format!(
                "Remanejamento solicitado para o paciente {} (leito {}). Motivo: {reason}",
                patient.name, bed.code
            ),
        ))
    }

    async fn try_cancel_reallocation(&self, patient_id: &str) -> EngineResult<Outcome> {
        let patient = self.patient(patient_id).await?;
        self.store
            .update(
                &DocRef::of::<Patient>(patient_id),
                Fields::new()
                    .set(fields::REALLOCATE, false)
                    .delete(fields::REALLOCATION_REASON)
                    .delete(fields::REALLOCATION_REQUESTED_AT),
            )
            .await?;
        Ok(Outcome::new(
            patient_id,
            format!("Remanejamento do paciente {} cancelado", patient.name),
        ))
    }

    async fn try_block_bed(&self, bed_id: &str, reason: &str) -> EngineResult<Outcome> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::EmptyBlockReason.into());
        }
        let bed = self.bed(bed_id).await?;
        if bed.is_occupied() || bed.current_patient_id.is_some() {
            return Err(ValidationError::BedOccupied {
                bed_id: bed_id.to_string(),
            }
            .into());
        }

        self.store
            .update(
                &DocRef::of::<Bed>(bed_id),
                Fields::new()
                    .set(fields::STATUS, BedStatus::Blocked.as_str())
                    .set(fields::BLOCK_REASON, reason)
                    .server_timestamp(fields::STATUS_CHANGED_AT),
            )
            .await?;

        Ok(Outcome::new(
            bed_id,
            format!("Leito {} bloqueado. Motivo: {reason}", bed.code),
        ))
    }

    // ==================== Helpers ====================

    async fn bed(&self, id: &str) -> EngineResult<Bed> {
        load::<Bed>(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| EngineError::not_found("bed", id))
    }

    async fn patient(&self, id: &str) -> EngineResult<Patient> {
        load::<Patient>(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| EngineError::not_found("patient", id))
    }

    fn vacate_for_cleaning() -> Fields {
        Fields::new()
            .set(fields::STATUS, BedStatus::Cleaning.as_str())
            .delete(fields::BED_PATIENT)
            .server_timestamp(fields::STATUS_CHANGED_AT)
    }

    /// Adds the release of a reserved bed to `batch`, if it is still reserved.
    async fn release_reservation(&self, batch: &mut WriteBatch, bed_id: &str) -> EngineResult<()> {
        match load::<Bed>(self.store.as_ref(), bed_id).await? {
            Some(bed) if bed.status == BedStatus::Reserved && bed.current_patient_id.is_none() => {
                batch.update(
                    DocRef::of::<Bed>(bed_id),
                    Fields::new()
                        .set(fields::STATUS, BedStatus::Vacant.as_str())
                        .server_timestamp(fields::STATUS_CHANGED_AT),
                );
            }
            _ => {}
        }
        Ok(())
    }

    /// Records and reports the outcome of an operation.
    async fn finish(&self, op: Operation, outcome: EngineResult<Outcome>) -> EngineResult<()> {
        match outcome {
            Ok(Outcome {
                target,
                description,
            }) => {
                tracing::info!(operation = %op, target = %target, actor = %self.actor, "{description}");
                self.audit
                    .append(
                        AuditRecord::new(op.page(), op.action(), target)
                            .description(description.clone())
                            .actor(self.actor.name.as_str()),
                    )
                    .await;
                self.notifier
                    .notify(Notification::success(op.action(), description))
                    .await;
                Ok(())
            }
            Err(e) => {
                if e.is_validation() {
                    tracing::warn!(operation = %op, error = %e, "operation rejected");
                } else {
                    tracing::error!(operation = %op, error = %e, category = ?e.category(), "operation failed");
                }
                self.notifier
                    .notify(Notification::error(format!("Falha: {}", op.action()), e.to_string()))
                    .await;
                Err(e)
            }
        }
    }
}

/// Whether `patient` may be moved into `bed`.
///
/// A `reservado` bed is only open to the patient it was reserved for, i.e.
/// the one whose destination already names it.
fn check_destination(bed: &Bed, patient: &Patient) -> Result<(), ValidationError> {
    if bed.current_patient_id.as_deref() == Some(patient.id.as_str()) {
        return Ok(());
    }
    let reserved_for_patient = patient.destination_bed_id.as_deref() == Some(bed.id.as_str());
    match bed.status {
        BedStatus::Reserved if !reserved_for_patient => Err(ValidationError::ReservedForOther {
            bed_id: bed.id.clone(),
        }),
        status if status.accepts_patient() => Ok(()),
        status => Err(ValidationError::DestinationUnavailable {
            bed_id: bed.id.clone(),
            status,
        }),
    }
}

impl fmt::Debug for BedEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BedEngine")
            .field("backend", &self.store.backend_name())
            .field("icu_sector_id", &self.icu_sector_id)
            .field("actor", &self.actor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_pages() {
        assert_eq!(Operation::BlockBed.page(), PAGE_BED_MAP);
        assert_eq!(Operation::ConfirmIcuTransfer.page(), PAGE_ICU);
        assert_eq!(Operation::CancelReallocation.page(), PAGE_REALLOCATION);
        assert_eq!(Operation::Discharge.to_string(), "Alta");
    }

    #[test]
    fn test_reserved_bed_only_open_to_its_patient() {
        use leitos_core::{BedType, Sex};

        let bed = Bed::new("u1", "UTI-01", "UTI", BedType::Critical).with_status(BedStatus::Reserved);
        let mut owner = Patient::new("p1", "Maria", Sex::Female);
        owner.destination_bed_id = Some("u1".into());
        let other = Patient::new("p2", "João", Sex::Male);

        assert!(check_destination(&bed, &owner).is_ok());
        assert_eq!(
            check_destination(&bed, &other),
            Err(ValidationError::ReservedForOther { bed_id: "u1".into() })
        );

        let vacant = bed.clone().with_status(BedStatus::Vacant);
        assert!(check_destination(&vacant, &other).is_ok());

        let cleaning = bed.with_status(BedStatus::Cleaning);
        assert!(matches!(
            check_destination(&cleaning, &owner),
            Err(ValidationError::DestinationUnavailable { .. })
        ));
    }

    #[test]
    fn test_vacate_for_cleaning_clears_patient() {
        let fields = BedEngine::vacate_for_cleaning();
        let mut body = serde_json::Map::new();
        body.insert("pacienteId".into(), "p1".into());
        fields.apply_to(&mut body, "2024-01-01T00:00:00Z");
        assert_eq!(body["status"], "limpeza");
        assert!(!body.contains_key("pacienteId"));
    }
}
