#![allow(dead_code)]

use async_trait::async_trait;
use station_sync::app::ports::{HttpClientPort, HttpGetResult};
use station_sync::constants::DAY_NAMES;
use station_sync::error::{Result, SyncError};
use station_sync::storage::{InMemoryStorage, Storage};
use station_sync::types::{Presenter, ScheduleEntry};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

pub const PRESENTER_FEED: &str = include_str!("../fixtures/presenters.xml");
pub const PRESENTER_PAGE: &str = include_str!("../fixtures/presenter.html");

pub const PRESENTER_NAMES: [&str; 8] = [
    "Tony T",
    "Rich Swales",
    "Jennifer Jones",
    "Stephen Hall",
    "Jenny Steele",
    "Marc Steele",
    "Dave Stocks",
    "Chris Brown",
];

pub const PRESENTER_IMAGE: &str =
    "https://www.solidradio.co.uk/wp-content/uploads/2020/06/urban-1658436_640.jpg";

/// Shows per day, Monday first, in the generated OnAir week.
pub const WEEK_COUNTS: [usize; 7] = [9, 9, 10, 10, 11, 10, 9];

/// Serves canned bodies by URL; anything else is a 404.
#[derive(Default)]
pub struct FakeHttp {
    pages: HashMap<String, (u16, String)>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), (200, body.to_string()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), (status, String::new()));
        self
    }
}

#[async_trait]
impl HttpClientPort for FakeHttp {
    async fn get(&self, url: &str) -> Result<HttpGetResult> {
        let (status, body) = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or((404, String::new()));
        Ok(HttpGetResult {
            status,
            body,
            content_type: "text/html".to_string(),
        })
    }
}

/// Delegates to an in-memory store, failing every write once armed.
#[derive(Default)]
pub struct FailingStorage {
    inner: InMemoryStorage,
    fail_writes: AtomicBool,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Storage("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn list_schedule_entries(&self, station: &str, day: u8) -> Result<Vec<ScheduleEntry>> {
        self.inner.list_schedule_entries(station, day).await
    }

    async fn list_unassigned_schedule_entries(&self, station: &str) -> Result<Vec<ScheduleEntry>> {
        self.inner.list_unassigned_schedule_entries(station).await
    }

    async fn list_all_schedule_entries(&self, station: &str) -> Result<Vec<ScheduleEntry>> {
        self.inner.list_all_schedule_entries(station).await
    }

    async fn create_schedule_entry(&self, entry: &mut ScheduleEntry) -> Result<()> {
        self.check()?;
        self.inner.create_schedule_entry(entry).await
    }

    async fn update_schedule_entry(&self, entry: &ScheduleEntry) -> Result<()> {
        self.check()?;
        self.inner.update_schedule_entry(entry).await
    }

    async fn delete_schedule_entry(&self, entry: &ScheduleEntry) -> Result<()> {
        self.check()?;
        self.inner.delete_schedule_entry(entry).await
    }

    async fn list_presenters(&self, station: &str) -> Result<Vec<Presenter>> {
        self.inner.list_presenters(station).await
    }

    async fn create_presenter(&self, presenter: &mut Presenter) -> Result<()> {
        self.check()?;
        self.inner.create_presenter(presenter).await
    }

    async fn update_presenter(&self, presenter: &Presenter) -> Result<()> {
        self.check()?;
        self.inner.update_presenter(presenter).await
    }

    async fn delete_presenter(&self, presenter: &Presenter) -> Result<()> {
        self.check()?;
        self.inner.delete_presenter(presenter).await
    }
}

/// One OnAir 2 show block.
pub fn on_air_show(day: &str, time: &str, title: &str) -> String {
    let slug = title.to_lowercase().replace(' ', "-");
    format!(
        r#"<div class="qt-part-show-schedule-day-item">
  <div class="qt-header-bg"><img src="https://www.solidradio.co.uk/wp-content/uploads/2020/06/{slug}-300x300.jpg" alt="{title}"></div>
  <h3 class="qt-title"><a href="https://www.solidradio.co.uk/shows/{slug}/">{title}</a></h3>
  <p class="qt-ellipsis-2">Your {title} show</p>
  <p class="qt-small"><span class="qt-day">{day}</span> <span class="qt-time">{time}</span></p>
</div>"#
    )
}

pub fn on_air_page(shows: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><body><div id=\"qtschedule\">{}</div></body></html>",
        shows.concat()
    )
}

/// A full week of OnAir shows distributed as [`WEEK_COUNTS`], every day
/// starting at midnight with two-hour slots.
pub fn on_air_week() -> String {
    let mut shows = Vec::new();
    for (day, count) in DAY_NAMES.iter().zip(WEEK_COUNTS) {
        for slot in 0..count {
            let time = format!("{:02}:{:02}", slot * 2, if slot % 2 == 1 { 30 } else { 0 });
            shows.push(on_air_show(day, &time, &format!("{} Show {}", day, slot + 1)));
        }
    }
    on_air_page(&shows)
}
