mod common;

use anyhow::Result;
use chrono::NaiveTime;
use common::{
    on_air_page, on_air_week, FakeHttp, PRESENTER_FEED, PRESENTER_IMAGE, PRESENTER_NAMES,
    PRESENTER_PAGE, WEEK_COUNTS,
};
use station_sync::error::SyncError;
use station_sync::pipeline::{fetch_document, Pipeline, StationStatus};
use station_sync::reconciler::SyncTarget;
use station_sync::storage::{InMemoryStorage, Storage};
use station_sync::types::{PresenterSource, ScheduleEntry, ScheduleSource, Station};
use std::sync::Arc;
use tempfile::tempdir;

const PRO_RADIO_PAGE: &str = include_str!("fixtures/pro_radio.html");

const SOLID_SCHEDULE: &str = "https://www.solidradio.co.uk/schedule/";
const SOLID_PRESENTERS: &str = "https://www.solidradio.co.uk/presenters/feed/";
const ALT_SCHEDULE: &str = "https://alt.example.com/schedule/";
const BROKEN_SCHEDULE: &str = "https://broken.example.com/schedule/";

fn on_air_station(name: &str, url: &str) -> Station {
    Station {
        schedule: Some(ScheduleSource::OnAir {
            schedule_url: url.to_string(),
        }),
        ..Station::new(name)
    }
}

fn solid_radio() -> Station {
    Station {
        presenters: Some(PresenterSource::Wordpress {
            presenter_list_url: SOLID_PRESENTERS.to_string(),
        }),
        ..on_air_station("Solid Radio", SOLID_SCHEDULE)
    }
}

fn alternate_digital() -> Station {
    Station {
        schedule: Some(ScheduleSource::ProRadio {
            schedule_url: ALT_SCHEDULE.to_string(),
        }),
        ..Station::new("Alternate Digital")
    }
}

fn presenter_url(slug: &str) -> String {
    format!("https://www.solidradio.co.uk/presenters/{}/", slug)
}

#[tokio::test]
async fn test_fetch_document_rejects_error_status() -> Result<()> {
    let http = FakeHttp::new()
        .with_page(SOLID_SCHEDULE, "<html></html>")
        .with_status(BROKEN_SCHEDULE, 503);

    assert_eq!(fetch_document(&http, SOLID_SCHEDULE).await?, "<html></html>");

    let err = fetch_document(&http, BROKEN_SCHEDULE).await.unwrap_err();
    assert!(matches!(err, SyncError::Fetch { ref url, .. } if url == BROKEN_SCHEDULE));
    assert!(err.is_upstream());
    Ok(())
}

#[tokio::test]
async fn test_failed_station_does_not_stop_the_batch() -> Result<()> {
    let http = Arc::new(
        FakeHttp::new()
            .with_page(SOLID_SCHEDULE, &on_air_week())
            .with_page(ALT_SCHEDULE, PRO_RADIO_PAGE)
            .with_status(BROKEN_SCHEDULE, 500),
    );
    let storage = Arc::new(InMemoryStorage::new());
    let pipeline = Pipeline::new(http, storage.clone());

    let stations = vec![
        on_air_station("Broken FM", BROKEN_SCHEDULE),
        solid_radio(),
        alternate_digital(),
    ];
    let result = pipeline.run_schedules(&stations).await;

    assert_eq!(result.outcomes.len(), 3);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.synchronised(), 2);
    assert!(matches!(result.outcomes[0].status, StationStatus::Failed { .. }));
    assert_eq!(result.outcomes[0].station, "Broken FM");

    let solid = storage.list_all_schedule_entries("Solid Radio").await?;
    assert_eq!(solid.len(), WEEK_COUNTS.iter().sum::<usize>());

    let monday = storage.list_schedule_entries("Alternate Digital", 0).await?;
    let titles: Vec<&str> = monday.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Alternate Breakfast", "Alternate Evenings"]);
    assert_eq!(monday[1].start, NaiveTime::from_hms_opt(19, 0, 0).unwrap());
    assert_eq!(monday[0].description, "Waking up the city with new music.");

    let tuesday = storage.list_schedule_entries("Alternate Digital", 1).await?;
    assert_eq!(tuesday.len(), 1);
    assert_eq!(tuesday[0].start, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    assert!(storage.list_schedule_entries("Alternate Digital", 2).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_schedule_page_keeps_existing_rows() -> Result<()> {
    let storage = Arc::new(InMemoryStorage::new());

    let full = Pipeline::new(
        Arc::new(FakeHttp::new().with_page(SOLID_SCHEDULE, &on_air_week())),
        storage.clone(),
    );
    full.run_schedules(&[solid_radio()]).await;
    let mut legacy = ScheduleEntry::new(
        "Legacy Show".to_string(),
        String::new(),
        String::new(),
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
    )
    .for_station("Solid Radio");
    storage.create_schedule_entry(&mut legacy).await?;
    let before = storage.list_all_schedule_entries("Solid Radio").await?;

    let empty = Pipeline::new(
        Arc::new(FakeHttp::new().with_page(SOLID_SCHEDULE, &on_air_page(&[]))),
        storage.clone(),
    );
    let result = empty.run_schedules(&[solid_radio()]).await;

    assert_eq!(result.skipped(), 1);
    assert_eq!(storage.list_all_schedule_entries("Solid Radio").await?, before);
    // Rows without a day wait for the next non-empty week to be swept.
    assert_eq!(
        storage.list_unassigned_schedule_entries("Solid Radio").await?,
        vec![legacy]
    );
    Ok(())
}

#[tokio::test]
async fn test_station_without_source_is_skipped() -> Result<()> {
    let pipeline = Pipeline::new(Arc::new(FakeHttp::new()), Arc::new(InMemoryStorage::new()));

    let result = pipeline.run_all(&[Station::new("Silent FM")]).await;

    assert_eq!(result.outcomes.len(), 2);
    assert_eq!(result.skipped(), 2);
    assert_eq!(result.outcomes[0].target, SyncTarget::Schedule);
    assert_eq!(result.outcomes[1].target, SyncTarget::Presenters);
    Ok(())
}

#[tokio::test]
async fn test_presenters_are_enriched_with_images() -> Result<()> {
    // Only Tony's page is reachable; everyone else's bio page 404s.
    let http = Arc::new(
        FakeHttp::new()
            .with_page(SOLID_PRESENTERS, PRESENTER_FEED)
            .with_page(&presenter_url("tony-t"), PRESENTER_PAGE),
    );
    let storage = Arc::new(InMemoryStorage::new());
    let pipeline = Pipeline::new(http, storage.clone());

    let result = pipeline.run_presenters(&[solid_radio()]).await;
    assert_eq!(result.synchronised(), 1);

    let presenters = storage.list_presenters("Solid Radio").await?;
    assert_eq!(presenters.len(), PRESENTER_NAMES.len());

    let tony = presenters.iter().find(|p| p.name == "Tony T").unwrap();
    assert_eq!(tony.image.as_deref(), Some(PRESENTER_IMAGE));
    assert!(presenters
        .iter()
        .filter(|p| p.name != "Tony T")
        .all(|p| p.image.is_none()));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_presenter_feed_leaves_roster() -> Result<()> {
    let storage = Arc::new(InMemoryStorage::new());
    let mut billy = station_sync::types::Presenter::new(
        "Solid Radio",
        "Billy No Mates".to_string(),
        String::new(),
    );
    storage.create_presenter(&mut billy).await?;

    let pipeline = Pipeline::new(Arc::new(FakeHttp::new()), storage.clone());
    let result = pipeline.run_presenters(&[solid_radio()]).await;

    assert_eq!(result.failed(), 1);
    assert_eq!(storage.list_presenters("Solid Radio").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_full_run_survives_snapshot_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let snapshot = dir.path().join("state").join("store.json");
    let http = Arc::new(
        FakeHttp::new()
            .with_page(SOLID_SCHEDULE, &on_air_week())
            .with_page(SOLID_PRESENTERS, PRESENTER_FEED),
    );

    let storage = Arc::new(InMemoryStorage::load_snapshot(&snapshot)?);
    let result = Pipeline::new(http.clone(), storage.clone())
        .run_all(&[solid_radio()])
        .await;
    assert_eq!(result.synchronised(), 2);
    storage.save_snapshot(&snapshot)?;

    let reloaded = Arc::new(InMemoryStorage::load_snapshot(&snapshot)?);
    assert_eq!(
        reloaded.list_all_schedule_entries("Solid Radio").await?,
        storage.list_all_schedule_entries("Solid Radio").await?
    );

    // A second run against the reloaded store changes nothing but updates.
    let result = Pipeline::new(http, reloaded.clone())
        .run_all(&[solid_radio()])
        .await;
    for outcome in &result.outcomes {
        match &outcome.status {
            StationStatus::Synchronised(report) => {
                assert_eq!(report.created, 0);
                assert_eq!(report.deleted, 0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    Ok(())
}
