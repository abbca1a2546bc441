use crate::app::ports::HttpClientPort;
use crate::error::{Result, SyncError};
use crate::parser::{schedule_parser_for, WordpressPresenterImage, WordpressPresenterParser};
use crate::reconciler::{PresenterReconciler, ScheduleReconciler, SyncReport, SyncTarget};
use crate::storage::Storage;
use crate::types::{Presenter, PresenterSource, Station};
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one station in a batch run
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum StationStatus {
    Synchronised(SyncReport),
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StationOutcome {
    pub station: String,
    pub target: SyncTarget,
    pub status: StationStatus,
}

/// Result of a complete batch run
#[derive(Debug, Default, Serialize)]
pub struct PipelineResult {
    pub outcomes: Vec<StationOutcome>,
}

impl PipelineResult {
    pub fn synchronised(&self) -> usize {
        self.count(|s| matches!(s, StationStatus::Synchronised(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, StationStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, StationStatus::Failed { .. }))
    }

    fn count<F: Fn(&StationStatus) -> bool>(&self, predicate: F) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }

    pub fn extend(&mut self, other: PipelineResult) {
        self.outcomes.extend(other.outcomes);
    }
}

/// Fetch a document body, treating any non-success status as a fetch failure.
pub async fn fetch_document(http: &dyn HttpClientPort, url: &str) -> Result<String> {
    let response = http.get(url).await?;
    if !response.is_success() {
        return Err(SyncError::Fetch {
            url: url.to_string(),
            message: format!("HTTP status {}", response.status),
        });
    }
    Ok(response.body)
}

/// Fetches, parses and reconciles schedules and presenter rosters per station.
pub struct Pipeline {
    http: Arc<dyn HttpClientPort>,
    schedules: ScheduleReconciler,
    presenters: PresenterReconciler,
}

impl Pipeline {
    pub fn new(http: Arc<dyn HttpClientPort>, storage: Arc<dyn Storage>) -> Self {
        Self {
            http,
            schedules: ScheduleReconciler::new(storage.clone()),
            presenters: PresenterReconciler::new(storage),
        }
    }

    /// Fetch, parse and reconcile one station's schedule.
    ///
    /// A page that parses to an empty week is skipped rather than reconciled,
    /// so an empty upstream page never wipes the stored schedule. Rows with no
    /// day are only swept when a non-empty week is reconciled, so they stay in
    /// place while the page remains empty.
    #[instrument(skip(self, station), fields(station = %station.name))]
    pub async fn sync_schedule(&self, station: &Station) -> Result<StationStatus> {
        let Some(source) = &station.schedule else {
            return Ok(StationStatus::Skipped {
                reason: "no schedule source configured".to_string(),
            });
        };

        info!("📡 Fetching {} schedule from {}", source.kind(), source.url());
        let content = fetch_document(&*self.http, source.url()).await?;
        let parser = schedule_parser_for(source);
        debug!("Parsing {} bytes with the {} parser", content.len(), parser.source_kind());
        let schedule = parser.parse(&content)?;

        if schedule.is_empty() {
            warn!(
                "Schedule for {} parsed to an empty week, not reconciling (rows without a day are kept until a non-empty week arrives)",
                station.name
            );
            return Ok(StationStatus::Skipped {
                reason: format!("no schedule entries found at {}", source.url()),
            });
        }

        let report = self.schedules.synchronize(&station.name, &schedule).await?;
        Ok(StationStatus::Synchronised(report))
    }

    /// Fetch the roster, enrich it with images and reconcile it.
    #[instrument(skip(self, station), fields(station = %station.name))]
    pub async fn sync_presenters(&self, station: &Station) -> Result<StationStatus> {
        let Some(source) = &station.presenters else {
            return Ok(StationStatus::Skipped {
                reason: "no presenter source configured".to_string(),
            });
        };

        let mut presenters = match source {
            PresenterSource::Wordpress { presenter_list_url } => {
                info!("📡 Fetching presenter list from {}", presenter_list_url);
                let xml = fetch_document(&*self.http, presenter_list_url).await?;
                WordpressPresenterParser::new().parse(&xml, &station.name)?
            }
        };

        if presenters.is_empty() {
            warn!("Extracted no presenters from {}", source.url());
            return Ok(StationStatus::Skipped {
                reason: format!("no presenters found at {}", source.url()),
            });
        }

        self.attach_images(&mut presenters).await;

        let report = self
            .presenters
            .synchronize(Some(station.name.as_str()), Some(presenters.as_slice()))
            .await?;
        Ok(StationStatus::Synchronised(report))
    }

    /// Look up each presenter's image on their biography page. A page that
    /// cannot be fetched leaves that presenter without an image.
    async fn attach_images(&self, presenters: &mut [Presenter]) {
        let image_parser = WordpressPresenterImage::new();

        for presenter in presenters.iter_mut() {
            let Some(url) = presenter.url.clone() else {
                continue;
            };
            match fetch_document(&*self.http, &url).await {
                Ok(html) => {
                    presenter.image = image_parser.parse(Some(&html));
                    debug!("Image for {}: {:?}", presenter.name, presenter.image);
                }
                Err(e) => {
                    warn!("Failed to extract presenter image from {}: {}", url, e);
                }
            }
        }
    }

    /// Synchronise schedules for every station, isolating failures.
    pub async fn run_schedules(&self, stations: &[Station]) -> PipelineResult {
        let mut result = PipelineResult::default();
        for station in stations {
            let started = Instant::now();
            let status = self.sync_schedule(station).await;
            result.outcomes.push(Self::outcome(station, SyncTarget::Schedule, status, started));
        }
        result
    }

    /// Synchronise presenter rosters for every station, isolating failures.
    pub async fn run_presenters(&self, stations: &[Station]) -> PipelineResult {
        let mut result = PipelineResult::default();
        for station in stations {
            let started = Instant::now();
            let status = self.sync_presenters(station).await;
            result.outcomes.push(Self::outcome(station, SyncTarget::Presenters, status, started));
        }
        result
    }

    pub async fn run_all(&self, stations: &[Station]) -> PipelineResult {
        let mut result = self.run_schedules(stations).await;
        result.extend(self.run_presenters(stations).await);
        result
    }

    fn outcome(
        station: &Station,
        target: SyncTarget,
        status: Result<StationStatus>,
        started: Instant,
    ) -> StationOutcome {
        let target_label = target.to_string();
        counter!("station_sync_runs_total", "target" => target_label.clone()).increment(1);
        histogram!("station_sync_duration_seconds", "target" => target_label.clone())
            .record(started.elapsed().as_secs_f64());

        let status = match status {
            Ok(StationStatus::Skipped { reason }) => {
                info!("Skipped {} for {}: {}", target, station.name, reason);
                StationStatus::Skipped { reason }
            }
            Ok(status) => {
                info!("✅ Synchronised {} for {}", target, station.name);
                status
            }
            Err(e) => {
                if e.is_upstream() {
                    warn!("No {} update for {} this cycle: {}", target, station.name, e);
                } else {
                    error!("Failed to synchronise {} for {}: {}", target, station.name, e);
                }
                counter!("station_sync_failures_total", "station" => station.name.clone(), "target" => target_label)
                    .increment(1);
                StationStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        StationOutcome {
            station: station.name.clone(),
            target,
            status,
        }
    }
}
