use crate::error::{Result, SyncError};
use crate::types::{Presenter, ScheduleEntry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

/// Storage trait for persisted schedule entries and presenters, partitioned by station
#[async_trait]
pub trait Storage: Send + Sync {
    // Schedule entry operations
    async fn list_schedule_entries(&self, station: &str, day: u8) -> Result<Vec<ScheduleEntry>>;
    async fn list_unassigned_schedule_entries(&self, station: &str) -> Result<Vec<ScheduleEntry>>;
    async fn list_all_schedule_entries(&self, station: &str) -> Result<Vec<ScheduleEntry>>;
    async fn create_schedule_entry(&self, entry: &mut ScheduleEntry) -> Result<()>;
    async fn update_schedule_entry(&self, entry: &ScheduleEntry) -> Result<()>;
    async fn delete_schedule_entry(&self, entry: &ScheduleEntry) -> Result<()>;

    // Presenter operations
    async fn list_presenters(&self, station: &str) -> Result<Vec<Presenter>>;
    async fn create_presenter(&self, presenter: &mut Presenter) -> Result<()>;
    async fn update_presenter(&self, presenter: &Presenter) -> Result<()>;
    async fn delete_presenter(&self, presenter: &Presenter) -> Result<()>;
}

/// On-disk form of the in-memory store.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageSnapshot {
    pub schedule_entries: Vec<ScheduleEntry>,
    pub presenters: Vec<Presenter>,
}

/// In-memory storage implementation, optionally persisted as a JSON snapshot
#[derive(Default)]
pub struct InMemoryStorage {
    schedule_entries: Mutex<HashMap<Uuid, ScheduleEntry>>,
    presenters: Mutex<HashMap<Uuid, Presenter>>,
}

fn lock<'a, T>(table: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>> {
    table
        .lock()
        .map_err(|_| SyncError::Storage(format!("{} table lock poisoned", name)))
}

fn sorted_entries(mut entries: Vec<ScheduleEntry>) -> Vec<ScheduleEntry> {
    entries.sort_by(|a, b| (a.day, a.start, &a.title).cmp(&(b.day, b.start, &b.title)));
    entries
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`save_snapshot`](Self::save_snapshot).
    /// A missing file gives an empty store.
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No store snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let snapshot: StorageSnapshot = serde_json::from_str(&content)?;
        Self::from_snapshot(snapshot)
    }

    pub fn from_snapshot(snapshot: StorageSnapshot) -> Result<Self> {
        let mut schedule_entries = HashMap::new();
        for entry in snapshot.schedule_entries {
            let id = entry
                .id
                .ok_or_else(|| SyncError::Storage(format!("snapshot entry without id: {}", entry)))?;
            schedule_entries.insert(id, entry);
        }

        let mut presenters = HashMap::new();
        for presenter in snapshot.presenters {
            let id = presenter.id.ok_or_else(|| {
                SyncError::Storage(format!("snapshot presenter without id: {}", presenter.name))
            })?;
            presenters.insert(id, presenter);
        }

        debug!(
            "Loaded {} schedule entries and {} presenters",
            schedule_entries.len(),
            presenters.len()
        );
        Ok(Self {
            schedule_entries: Mutex::new(schedule_entries),
            presenters: Mutex::new(presenters),
        })
    }

    pub fn snapshot(&self) -> Result<StorageSnapshot> {
        let schedule_entries = lock(&self.schedule_entries, "schedule")?
            .values()
            .cloned()
            .collect();
        let mut presenters: Vec<Presenter> =
            lock(&self.presenters, "presenter")?.values().cloned().collect();
        presenters.sort_by(|a, b| (&a.station, &a.name).cmp(&(&b.station, &b.name)));

        Ok(StorageSnapshot {
            schedule_entries: sorted_entries(schedule_entries),
            presenters,
        })
    }

    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Stage beside the target, then rename over it.
        let directory = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(directory)?;
        serde_json::to_writer_pretty(&mut staged, &self.snapshot()?)?;
        staged.flush()?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| e.error)?;
        info!("Saved store snapshot to {}", path.display());
        Ok(())
    }

    fn filter_entries<F>(&self, predicate: F) -> Result<Vec<ScheduleEntry>>
    where
        F: Fn(&ScheduleEntry) -> bool,
    {
        let entries = lock(&self.schedule_entries, "schedule")?;
        Ok(sorted_entries(
            entries.values().filter(|&e| predicate(e)).cloned().collect(),
        ))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn list_schedule_entries(&self, station: &str, day: u8) -> Result<Vec<ScheduleEntry>> {
        self.filter_entries(|e| e.station.as_deref() == Some(station) && e.day == Some(day))
    }

    async fn list_unassigned_schedule_entries(&self, station: &str) -> Result<Vec<ScheduleEntry>> {
        self.filter_entries(|e| e.station.as_deref() == Some(station) && e.day.is_none())
    }

    async fn list_all_schedule_entries(&self, station: &str) -> Result<Vec<ScheduleEntry>> {
        self.filter_entries(|e| e.station.as_deref() == Some(station))
    }

    async fn create_schedule_entry(&self, entry: &mut ScheduleEntry) -> Result<()> {
        if entry.station.is_none() {
            return Err(SyncError::Storage(format!(
                "Cannot create schedule entry without station: {}",
                entry
            )));
        }
        let id = Uuid::new_v4();
        entry.id = Some(id);

        lock(&self.schedule_entries, "schedule")?.insert(id, entry.clone());

        debug!("Created schedule entry: {} with id {}", entry, id);
        Ok(())
    }

    async fn update_schedule_entry(&self, entry: &ScheduleEntry) -> Result<()> {
        let id = entry.id.ok_or_else(|| {
            SyncError::Storage("Cannot update schedule entry without ID".to_string())
        })?;

        let mut entries = lock(&self.schedule_entries, "schedule")?;
        let stored = entries
            .get_mut(&id)
            .ok_or_else(|| SyncError::Storage(format!("No schedule entry with id {}", id)))?;
        *stored = entry.clone();

        debug!("Updated schedule entry: {} with id {}", entry, id);
        Ok(())
    }

    async fn delete_schedule_entry(&self, entry: &ScheduleEntry) -> Result<()> {
        let id = entry.id.ok_or_else(|| {
            SyncError::Storage("Cannot delete schedule entry without ID".to_string())
        })?;

        lock(&self.schedule_entries, "schedule")?
            .remove(&id)
            .ok_or_else(|| SyncError::Storage(format!("No schedule entry with id {}", id)))?;

        debug!("Deleted schedule entry: {} with id {}", entry, id);
        Ok(())
    }

    async fn list_presenters(&self, station: &str) -> Result<Vec<Presenter>> {
        let presenters = lock(&self.presenters, "presenter")?;
        let mut listed: Vec<Presenter> = presenters
            .values()
            .filter(|p| p.station == station)
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    async fn create_presenter(&self, presenter: &mut Presenter) -> Result<()> {
        let mut presenters = lock(&self.presenters, "presenter")?;
        if presenters
            .values()
            .any(|p| p.station == presenter.station && p.name == presenter.name)
        {
            return Err(SyncError::Storage(format!(
                "Presenter {} already exists for {}",
                presenter.name, presenter.station
            )));
        }

        let id = Uuid::new_v4();
        presenter.id = Some(id);
        presenters.insert(id, presenter.clone());

        debug!("Created presenter: {} with id {}", presenter.name, id);
        Ok(())
    }

    async fn update_presenter(&self, presenter: &Presenter) -> Result<()> {
        let id = presenter
            .id
            .ok_or_else(|| SyncError::Storage("Cannot update presenter without ID".to_string()))?;

        let mut presenters = lock(&self.presenters, "presenter")?;
        let stored = presenters
            .get_mut(&id)
            .ok_or_else(|| SyncError::Storage(format!("No presenter with id {}", id)))?;
        *stored = presenter.clone();

        debug!("Updated presenter: {} with id {}", presenter.name, id);
        Ok(())
    }

    async fn delete_presenter(&self, presenter: &Presenter) -> Result<()> {
        let id = presenter
            .id
            .ok_or_else(|| SyncError::Storage("Cannot delete presenter without ID".to_string()))?;

        lock(&self.presenters, "presenter")?
            .remove(&id)
            .ok_or_else(|| SyncError::Storage(format!("No presenter with id {}", id)))?;

        debug!("Deleted presenter: {} with id {}", presenter.name, id);
        Ok(())
    }
}
