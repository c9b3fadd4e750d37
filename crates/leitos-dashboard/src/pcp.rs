//! PCP (full-capacity protocol) level evaluation.
//!
//! The headline figure is the number of admitted patients in the decision
//! sectors. The level table maps it to a discrete surge level. The monitor
//! keeps the evaluation current from live subscriptions.

use std::collections::HashMap;

use leitos_core::{Bed, Entity, Patient, PcpLevel, Sector, overlapping_levels, select_level};
use leitos_storage::{DocumentStore, DynStore, StorageError, Subscription};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

/// Sector abbreviations the evaluation looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcpSettings {
    /// Summed into the headline total
    #[serde(default = "default_decision_sectors")]
    pub decision_sectors: Vec<String>,
    /// Counted for display only
    #[serde(default = "default_tracked_sectors")]
    pub tracked_sectors: Vec<String>,
    /// Surgical rooms; blocked beds here are reported
    #[serde(default = "default_surgical_sector")]
    pub surgical_sector: String,
}

fn default_decision_sectors() -> Vec<String> {
    vec!["DCL".to_string(), "DCX".to_string()]
}

fn default_tracked_sectors() -> Vec<String> {
    vec!["SRPA".to_string(), "SE".to_string()]
}

fn default_surgical_sector() -> String {
    "CC".to_string()
}

impl Default for PcpSettings {
    fn default() -> Self {
        Self {
            decision_sectors: default_decision_sectors(),
            tracked_sectors: default_tracked_sectors(),
            surgical_sector: default_surgical_sector(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorCount {
    pub abbreviation: String,
    pub patients: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcpStatus {
    pub headline_total: u32,
    pub decision_counts: Vec<SectorCount>,
    pub tracked_counts: Vec<SectorCount>,
    pub occupied_pcp_beds: u32,
    pub blocked_surgical_beds: u32,
    /// `None` when no level's bounds contain the headline total.
    pub level: Option<PcpLevel>,
}

impl PcpStatus {
    pub fn level_name(&self) -> &str {
        self.level.as_ref().map_or("none", |l| l.name.as_str())
    }
}

/// Evaluates the PCP status from current collection contents.
pub fn evaluate(
    beds: &[Bed],
    patients: &[Patient],
    sectors: &[Sector],
    levels: &[PcpLevel],
    settings: &PcpSettings,
) -> PcpStatus {
    let abbreviation: HashMap<&str, &str> = sectors
        .iter()
        .map(|s| (s.id.as_str(), s.abbreviation.as_str()))
        .collect();

    let mut per_sector: HashMap<&str, u32> = HashMap::new();
    for patient in patients.iter().filter(|p| p.is_admitted()) {
        if let Some(abbr) = patient
            .sector_id
            .as_deref()
            .and_then(|id| abbreviation.get(id))
        {
            *per_sector.entry(*abbr).or_default() += 1;
        }
    }

    let count = |abbrs: &[String]| -> Vec<SectorCount> {
        abbrs
            .iter()
            .map(|abbr| SectorCount {
                abbreviation: abbr.clone(),
                patients: per_sector.get(abbr.as_str()).copied().unwrap_or(0),
            })
            .collect()
    };
    let decision_counts = count(&settings.decision_sectors);
    let tracked_counts = count(&settings.tracked_sectors);
    let headline_total: u32 = decision_counts.iter().map(|c| c.patients).sum();

    let occupied_pcp_beds = beds.iter().filter(|b| b.is_pcp && b.is_occupied()).count() as u32;
    let blocked_surgical_beds = beds
        .iter()
        .filter(|b| b.is_blocked())
        .filter(|b| abbreviation.get(b.sector_id.as_str()) == Some(&settings.surgical_sector.as_str()))
        .count() as u32;

    PcpStatus {
        headline_total,
        decision_counts,
        tracked_counts,
        occupied_pcp_beds,
        blocked_surgical_beds,
        level: select_level(levels, headline_total).cloned(),
    }
}

/// Live PCP evaluation over store subscriptions.
///
/// Re-evaluates whenever the level table or the beds change; patients and
/// sectors are taken from their latest snapshots at that moment. The
/// background task ends once the monitor and every status receiver are gone.
pub struct PcpMonitor {
    status: watch::Receiver<PcpStatus>,
    task: JoinHandle<()>,
}

struct Feeds {
    levels: Subscription,
    beds: Subscription,
    patients: Subscription,
    sectors: Subscription,
}

impl Feeds {
    fn evaluate(&self, settings: &PcpSettings) -> Option<PcpStatus> {
        let levels: Vec<PcpLevel> = decode_latest(&self.levels)?;
        let beds: Vec<Bed> = decode_latest(&self.beds)?;
        let patients: Vec<Patient> = decode_latest(&self.patients)?;
        let sectors: Vec<Sector> = decode_latest(&self.sectors)?;
        Some(evaluate(&beds, &patients, &sectors, &levels, settings))
    }
}

/// Decodes the newest snapshot, skipping malformed documents.
fn decode_latest<T: Entity>(subscription: &Subscription) -> Option<Vec<T>> {
    let snapshot = match subscription.latest() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(collection = subscription.collection(), error = %e, "PCP input unavailable");
            return None;
        }
    };
    let decoded = snapshot
        .documents
        .iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed document");
                None
            }
        })
        .collect();
    Some(decoded)
}

impl PcpMonitor {
    pub async fn spawn(store: DynStore, settings: PcpSettings) -> Result<Self, StorageError> {
        let mut feeds = Feeds {
            levels: store.subscribe(PcpLevel::COLLECTION, None).await?,
            beds: store.subscribe(Bed::COLLECTION, None).await?,
            patients: store.subscribe(Patient::COLLECTION, None).await?,
            sectors: store.subscribe(Sector::COLLECTION, None).await?,
        };

        let initial = feeds.evaluate(&settings).unwrap_or_default();
        report_overlaps(&feeds);
        let (tx, status) = watch::channel(initial);

        let task = tokio::spawn(async move {
            loop {
                let levels_changed = tokio::select! {
                    _ = tx.closed() => break,
                    r = feeds.levels.changed() => r.map(|_| true),
                    r = feeds.beds.changed() => r.map(|_| false),
                };
                match levels_changed {
                    Ok(true) => report_overlaps(&feeds),
                    Ok(false) => {}
                    Err(e) => {
                        if feeds.levels.is_closed() || feeds.beds.is_closed() {
                            tracing::debug!("PCP monitor inputs closed");
                            break;
                        }
                        tracing::warn!(error = %e, "PCP input failed; keeping last status");
                        continue;
                    }
                }
                if let Some(next) = feeds.evaluate(&settings) {
                    tx.send_if_modified(|current| {
                        if *current == next {
                            return false;
                        }
                        tracing::debug!(total = next.headline_total, level = next.level_name(), "PCP status updated");
                        *current = next;
                        true
                    });
                }
            }
        });

        Ok(Self { status, task })
    }

    pub fn current(&self) -> PcpStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PcpStatus> {
        self.status.clone()
    }

    /// Status updates as a stream, starting with the current one.
    pub fn stream(&self) -> WatchStream<PcpStatus> {
        WatchStream::new(self.status.clone())
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

fn report_overlaps(feeds: &Feeds) {
    let Some(levels) = decode_latest::<PcpLevel>(&feeds.levels) else {
        return;
    };
    for (a, b) in overlapping_levels(&levels) {
        tracing::warn!(first = %a, second = %b, "PCP levels overlap; the lower order wins");
    }
}
