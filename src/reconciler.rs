use crate::error::{Result, SyncError};
use crate::storage::Storage;
use crate::types::{Presenter, ScheduleEntry, WeeklySchedule};
use chrono::NaiveTime;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Change types for reconciliation operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

/// What a reconciliation run was synchronising
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncTarget {
    Schedule,
    Presenters,
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncTarget::Schedule => f.write_str("schedule"),
            SyncTarget::Presenters => f.write_str("presenters"),
        }
    }
}

/// A single change applied to the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeRecord {
    pub change_type: ChangeType,
    pub change_log: String,
}

/// Outcome of reconciling one station
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncReport {
    pub station: String,
    pub target: SyncTarget,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// True when the run was a deliberate no-op.
    pub skipped: bool,
    pub changes: Vec<ChangeRecord>,
}

impl SyncReport {
    pub fn new(station: &str, target: SyncTarget) -> Self {
        Self {
            station: station.to_string(),
            target,
            created: 0,
            updated: 0,
            deleted: 0,
            skipped: false,
            changes: Vec::new(),
        }
    }

    pub fn skipped(station: &str, target: SyncTarget) -> Self {
        Self {
            skipped: true,
            ..Self::new(station, target)
        }
    }

    fn record(&mut self, change_type: ChangeType, change_log: String) {
        match change_type {
            ChangeType::Created => self.created += 1,
            ChangeType::Updated => self.updated += 1,
            ChangeType::Deleted => self.deleted += 1,
        }
        debug!("{:?}: {}", change_type, change_log);
        self.changes.push(ChangeRecord {
            change_type,
            change_log,
        });
    }

    fn publish_metrics(&self) {
        let target = self.target.to_string();
        counter!("station_sync_created_total", "station" => self.station.clone(), "target" => target.clone())
            .increment(self.created as u64);
        counter!("station_sync_updated_total", "station" => self.station.clone(), "target" => target.clone())
            .increment(self.updated as u64);
        counter!("station_sync_deleted_total", "station" => self.station.clone(), "target" => target)
            .increment(self.deleted as u64);
    }
}

/// Brings a station's persisted schedule in line with a freshly parsed week
pub struct ScheduleReconciler {
    storage: Arc<dyn Storage>,
}

impl fmt::Debug for ScheduleReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleReconciler")
            .field("storage", &"<Arc<dyn Storage>>")
            .finish()
    }
}

impl ScheduleReconciler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Reconcile every day Monday to Sunday, then drop rows with no day.
    ///
    /// Any store failure aborts the run for this station.
    #[instrument(skip(self, schedule), fields(entries = schedule.len()))]
    pub async fn synchronize(&self, station: &str, schedule: &WeeklySchedule) -> Result<SyncReport> {
        let mut report = SyncReport::new(station, SyncTarget::Schedule);

        for (day, entries) in schedule.iter() {
            self.synchronize_day(station, day, entries, &mut report)
                .await
                .map_err(|e| SyncError::reconciliation(station, e))?;
        }

        self.remove_unassigned(station, &mut report)
            .await
            .map_err(|e| SyncError::reconciliation(station, e))?;

        info!(
            "Synchronised schedule for {}: {} created, {} updated, {} deleted",
            station, report.created, report.updated, report.deleted
        );
        report.publish_metrics();
        Ok(report)
    }

    async fn synchronize_day(
        &self,
        station: &str,
        day: u8,
        entries: &[ScheduleEntry],
        report: &mut SyncReport,
    ) -> Result<()> {
        // Persisted rows for the day, keyed by start; several rows may share a start.
        let mut working: BTreeMap<NaiveTime, VecDeque<ScheduleEntry>> = BTreeMap::new();
        for existing in self.storage.list_schedule_entries(station, day).await? {
            working.entry(existing.start).or_default().push_back(existing);
        }

        for entry in entries {
            match working.get_mut(&entry.start).and_then(VecDeque::pop_front) {
                Some(mut existing) => {
                    existing.apply_attributes(entry);
                    self.storage.update_schedule_entry(&existing).await?;
                    report.record(ChangeType::Updated, format!("Updated {}", existing));
                }
                None => {
                    // A repeated start time after the first lands here and is created.
                    let mut created = entry.clone().for_station(station).on_day(day);
                    created.id = None;
                    self.storage.create_schedule_entry(&mut created).await?;
                    report.record(ChangeType::Created, format!("Created {}", created));
                }
            }
        }

        for stale in working.into_values().flatten() {
            self.storage.delete_schedule_entry(&stale).await?;
            report.record(ChangeType::Deleted, format!("Deleted {}", stale));
        }

        Ok(())
    }

    async fn remove_unassigned(&self, station: &str, report: &mut SyncReport) -> Result<()> {
        for legacy in self.storage.list_unassigned_schedule_entries(station).await? {
            self.storage.delete_schedule_entry(&legacy).await?;
            report.record(ChangeType::Deleted, format!("Deleted unassigned {}", legacy));
        }
        Ok(())
    }
}

/// Brings a station's persisted presenters in line with a freshly parsed roster
pub struct PresenterReconciler {
    storage: Arc<dyn Storage>,
}

impl fmt::Debug for PresenterReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterReconciler")
            .field("storage", &"<Arc<dyn Storage>>")
            .finish()
    }
}

impl PresenterReconciler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Replace the station's roster with `presenters`.
    ///
    /// A missing station or an empty roster leaves the store untouched: an
    /// empty upstream fetch must never wipe an existing roster.
    #[instrument(skip(self, presenters), fields(count = presenters.map(|p| p.len())))]
    pub async fn synchronize(
        &self,
        station: Option<&str>,
        presenters: Option<&[Presenter]>,
    ) -> Result<SyncReport> {
        let (station, presenters) = match (station, presenters) {
            (Some(station), Some(presenters)) if !presenters.is_empty() => (station, presenters),
            (station, _) => {
                info!("No presenters to synchronise, leaving roster untouched");
                return Ok(SyncReport::skipped(
                    station.unwrap_or_default(),
                    SyncTarget::Presenters,
                ));
            }
        };

        let mut report = SyncReport::new(station, SyncTarget::Presenters);
        self.apply_roster(station, presenters, &mut report)
            .await
            .map_err(|e| SyncError::reconciliation(station, e))?;

        info!(
            "Synchronised presenters for {}: {} created, {} updated, {} deleted",
            station, report.created, report.updated, report.deleted
        );
        report.publish_metrics();
        Ok(report)
    }

    async fn apply_roster(
        &self,
        station: &str,
        presenters: &[Presenter],
        report: &mut SyncReport,
    ) -> Result<()> {
        // Name order follows first appearance; the last duplicate supplies the data.
        let mut order: Vec<&str> = Vec::new();
        let mut roster: HashMap<&str, &Presenter> = HashMap::new();
        for presenter in presenters {
            if roster.insert(presenter.name.as_str(), presenter).is_none() {
                order.push(presenter.name.as_str());
            }
        }

        let mut existing: HashMap<String, Presenter> = HashMap::new();
        for persisted in self.storage.list_presenters(station).await? {
            if roster.contains_key(persisted.name.as_str()) {
                existing.insert(persisted.name.clone(), persisted);
            } else {
                self.storage.delete_presenter(&persisted).await?;
                report.record(ChangeType::Deleted, format!("Deleted presenter {}", persisted.name));
            }
        }

        for name in order {
            let Some(incoming) = roster.get(name) else {
                continue;
            };
            match existing.remove(name) {
                Some(mut persisted) => {
                    persisted.biography = incoming.biography.clone();
                    persisted.image = incoming.image.clone();
                    self.storage.update_presenter(&persisted).await?;
                    report.record(ChangeType::Updated, format!("Updated presenter {}", name));
                }
                None => {
                    let mut created = (*incoming).clone();
                    created.id = None;
                    created.station = station.to_string();
                    self.storage.create_presenter(&mut created).await?;
                    report.record(ChangeType::Created, format!("Created presenter {}", name));
                }
            }
        }

        Ok(())
    }
}
