//! Shared fixtures: a small ward and an ICU over an in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use leitos_core::{Bed, BedStatus, BedType, Patient, PcpLevel, Sector, Sex};
use leitos_dashboard::config::AuditConfig;
use leitos_dashboard::{AuditLogger, BedEngine, BroadcastNotifier};
use leitos_db_memory::InMemoryStore;
use leitos_storage::{DynStore, load, save};

pub const ICU_SECTOR: &str = "UTI";

pub struct Fixture {
    pub store: InMemoryStore,
    pub notifier: Arc<BroadcastNotifier>,
    pub engine: BedEngine,
}

impl Fixture {
    /// Ward `s-dcl` with beds `b1` (holding `p1`) and `b2` (vacant), ICU beds
    /// `u1` (vacant) and `u2` (cleaning).
    pub async fn new() -> Self {
        let store = InMemoryStore::new();
        seed_ward(&store).await;

        let notifier = Arc::new(BroadcastNotifier::default());
        let dyn_store: DynStore = Arc::new(store.clone());
        let audit = AuditLogger::new(dyn_store.clone(), AuditConfig::default());
        let engine = BedEngine::new(dyn_store, audit, notifier.clone(), ICU_SECTOR);

        Self {
            store,
            notifier,
            engine,
        }
    }

    pub fn dyn_store(&self) -> DynStore {
        Arc::new(self.store.clone())
    }

    pub async fn bed(&self, id: &str) -> Bed {
        load::<Bed>(&self.store, id).await.unwrap().unwrap()
    }

    pub async fn patient(&self, id: &str) -> Option<Patient> {
        load::<Patient>(&self.store, id).await.unwrap()
    }

    pub async fn log_count(&self) -> usize {
        self.store.count(leitos_core::collections::LOGS).await
    }
}

pub async fn seed_ward(store: &InMemoryStore) {
    for sector in [
        Sector::new("s-dcl", "Clínica Médica", "DCL"),
        Sector::new(ICU_SECTOR, "Unidade de Terapia Intensiva", "UTI"),
    ] {
        save(store, &sector).await.unwrap();
    }
    for bed in [
        Bed::new("b1", "L-101", "s-dcl", BedType::Clinical).occupied_by("p1"),
        Bed::new("b2", "L-102", "s-dcl", BedType::Clinical),
        Bed::new("u1", "UTI-01", ICU_SECTOR, BedType::Critical),
        Bed::new("u2", "UTI-02", ICU_SECTOR, BedType::Critical).with_status(BedStatus::Cleaning),
    ] {
        save(store, &bed).await.unwrap();
    }
    save(
        store,
        &Patient::new("p1", "Maria da Silva", Sex::Female).in_bed("b1", "s-dcl"),
    )
    .await
    .unwrap();
}

pub async fn seed_levels(store: &InMemoryStore, levels: &[PcpLevel]) {
    for level in levels {
        save(store, level).await.unwrap();
    }
}
