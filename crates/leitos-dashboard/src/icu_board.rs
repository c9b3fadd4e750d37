//! ICU wait board: patients awaiting an ICU bed, longest wait first.
//!
//! Waits are recomputed on a fixed interval from the latest patients
//! snapshot, so the displayed times advance without any store traffic.

use std::time::Duration;

use leitos_core::{Entity, Patient, WaitTime, now_utc};
use leitos_storage::{DocumentStore, DynStore, StorageError, Subscription};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IcuWaitEntry {
    pub patient_id: String,
    pub patient_name: String,
    pub bed_id: Option<String>,
    pub destination_bed_id: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub requested_at: Option<OffsetDateTime>,
    pub wait: WaitTime,
    /// `"45min"`, `"2h 5min"`
    pub wait_label: String,
}

/// Builds the board for `now`. Patients without a request time sort last.
pub fn build_board(patients: &[Patient], now: OffsetDateTime) -> Vec<IcuWaitEntry> {
    let mut entries: Vec<IcuWaitEntry> = patients
        .iter()
        .filter(|p| p.awaiting_icu && p.is_admitted())
        .map(|p| {
            let wait = p
                .icu_requested_at
                .map(|since| WaitTime::between(since, now))
                .unwrap_or_default();
            IcuWaitEntry {
                patient_id: p.id.clone(),
                patient_name: p.name.clone(),
                bed_id: p.bed_id.clone(),
                destination_bed_id: p.destination_bed_id.clone(),
                requested_at: p.icu_requested_at,
                wait,
                wait_label: wait.to_string(),
            }
        })
        .collect();

    entries.sort_by(|a, b| match (a.requested_at, b.requested_at) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.patient_id.cmp(&b.patient_id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.patient_id.cmp(&b.patient_id),
    });
    entries
}

pub struct IcuWaitBoard {
    board: watch::Receiver<Vec<IcuWaitEntry>>,
    task: JoinHandle<()>,
}

fn latest_patients(subscription: &Subscription) -> Option<Vec<Patient>> {
    match subscription.latest() {
        Ok(snapshot) => Some(
            snapshot
                .documents
                .iter()
                .filter_map(|doc| doc.decode::<Patient>().ok())
                .collect(),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "patients snapshot unavailable; keeping ICU board");
            None
        }
    }
}

impl IcuWaitBoard {
    /// Starts the board, refreshing every `refresh` and on every patient change.
    pub async fn spawn(store: DynStore, refresh: Duration) -> Result<Self, StorageError> {
        let mut patients = store.subscribe(Patient::COLLECTION, None).await?;
        let initial = latest_patients(&patients)
            .map(|p| build_board(&p, now_utc()))
            .unwrap_or_default();
        let (tx, board) = watch::channel(initial);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresh);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = ticker.tick() => {}
                    changed = patients.changed() => {
                        if changed.is_err() && patients.is_closed() {
                            break;
                        }
                    }
                }
                if let Some(current) = latest_patients(&patients) {
                    tx.send_replace(build_board(&current, now_utc()));
                }
            }
            tracing::debug!("ICU wait board stopped");
        });

        Ok(Self { board, task })
    }

    pub fn current(&self) -> Vec<IcuWaitEntry> {
        self.board.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<IcuWaitEntry>> {
        self.board.clone()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leitos_core::Sex;
    use time::macros::datetime;

    fn waiting(id: &str, since: Option<OffsetDateTime>) -> Patient {
        let mut p = Patient::new(id, format!("Paciente {id}"), Sex::Male).in_bed(format!("b-{id}"), "s1");
        p.awaiting_icu = true;
        p.icu_requested_at = since;
        p
    }

    #[test]
    fn test_board_sorted_by_longest_wait() {
        let now = datetime!(2024-05-01 12:00 UTC);
        let patients = vec![
            waiting("p1", Some(datetime!(2024-05-01 11:15 UTC))),
            waiting("p2", Some(datetime!(2024-05-01 09:55 UTC))),
            waiting("p3", None),
            Patient::new("p4", "Sem pedido", Sex::Female),
        ];

        let board = build_board(&patients, now);
        let ids: Vec<_> = board.iter().map(|e| e.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1", "p3"]);
        assert_eq!(board[0].wait_label, "2h 5min");
        assert_eq!(board[1].wait_label, "45min");
        assert_eq!(board[2].wait_label, "0min");
    }

    #[test]
    fn test_discharged_patients_leave_board() {
        let mut p = waiting("p1", None);
        p.admission_status = leitos_core::AdmissionStatus::Discharged;
        assert!(build_board(&[p], now_utc()).is_empty());
    }
}
