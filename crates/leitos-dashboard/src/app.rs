//! Wiring of the dashboard services over one store.

use std::sync::Arc;

use leitos_core::{Bed, OccupancyViolation, Patient, check_occupancy};
use leitos_storage::{DocumentStore, DynStore, StorageError, load_all};

use crate::audit::AuditLogger;
use crate::cache::ReadThroughCache;
use crate::config::AppConfig;
use crate::engine::{Actor, BedEngine};
use crate::icu_board::IcuWaitBoard;
use crate::notify::Notifier;
use crate::pcp::PcpMonitor;

/// The running dashboard: engine, cache and the two live displays.
pub struct Dashboard {
    pub engine: BedEngine,
    pub cache: ReadThroughCache,
    pub pcp: PcpMonitor,
    pub icu_board: IcuWaitBoard,
    store: DynStore,
}

impl Dashboard {
    pub async fn start(
        store: DynStore,
        config: &AppConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, StorageError> {
        let audit = AuditLogger::new(store.clone(), config.audit.clone());
        let engine = BedEngine::new(
            store.clone(),
            audit.clone(),
            notifier.clone(),
            config.hospital.icu_sector_id.clone(),
        );
        let cache = ReadThroughCache::new(store.clone(), audit, notifier);
        let pcp = PcpMonitor::spawn(store.clone(), config.hospital.pcp.clone()).await?;
        let icu_board = IcuWaitBoard::spawn(store.clone(), config.icu_refresh()).await?;

        tracing::info!(
            backend = store.backend_name(),
            icu_sector = %config.hospital.icu_sector_id,
            "dashboard started"
        );
        Ok(Self {
            engine,
            cache,
            pcp,
            icu_board,
            store,
        })
    }

    /// An engine for one session user.
    pub fn engine_for(&self, actor: Actor) -> BedEngine {
        self.engine.clone().with_actor(actor)
    }

    /// Reads beds and patients and lists every occupancy violation.
    pub async fn occupancy_report(&self) -> Result<Vec<OccupancyViolation>, StorageError> {
        let beds: Vec<Bed> = load_all(self.store.as_ref(), None).await?;
        let patients: Vec<Patient> = load_all(self.store.as_ref(), None).await?;
        Ok(check_occupancy(&beds, &patients))
    }

    pub fn stop(&self) {
        self.pcp.stop();
        self.icu_board.stop();
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.stop();
    }
}
