use crate::constants::{self, ON_AIR_SOURCE, PRO_RADIO_SOURCE, WORDPRESS_SOURCE};
use crate::error::{Result, SyncError};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One scheduled programme, recurring weekly at `start` on `day`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Option<Uuid>,
    pub station: Option<String>,
    pub title: String,
    pub description: String,
    pub image: String,
    pub start: NaiveTime,
    /// Monday = 0 … Sunday = 6. Legacy rows may have no day.
    pub day: Option<u8>,
}

impl ScheduleEntry {
    pub fn new(title: String, description: String, image: String, start: NaiveTime) -> Self {
        Self {
            id: None,
            station: None,
            title,
            description,
            image,
            start,
            day: None,
        }
    }

    pub fn on_day(mut self, day: u8) -> Self {
        self.day = Some(day);
        self
    }

    pub fn for_station(mut self, station: &str) -> Self {
        self.station = Some(station.to_string());
        self
    }

    /// Copy the mutable attributes of `other` onto this entry.
    pub fn apply_attributes(&mut self, other: &ScheduleEntry) {
        self.title = other.title.clone();
        self.description = other.description.clone();
        self.image = other.image.clone();
    }
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start.format("%H:%M");
        match self.day.and_then(constants::day_name) {
            Some(day) => write!(f, "[{}][{}] {}", day, start, self.title)?,
            None => write!(f, "[{}] {}", start, self.title)?,
        }
        if let Some(station) = &self.station {
            write!(f, " on {}", station)?;
        }
        Ok(())
    }
}

/// A week of programmes: always exactly seven day buckets, Monday first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    days: [Vec<ScheduleEntry>; 7],
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to a day bucket, tagging it with that day.
    pub fn push(&mut self, day: u8, entry: ScheduleEntry) -> Result<()> {
        let bucket = self
            .days
            .get_mut(day as usize)
            .ok_or_else(|| SyncError::Parse(format!("day index {} out of range", day)))?;
        bucket.push(entry.on_day(day));
        Ok(())
    }

    /// Replace a whole day bucket.
    pub fn set_day(&mut self, day: u8, entries: Vec<ScheduleEntry>) -> Result<()> {
        let bucket = self
            .days
            .get_mut(day as usize)
            .ok_or_else(|| SyncError::Parse(format!("day index {} out of range", day)))?;
        *bucket = entries.into_iter().map(|entry| entry.on_day(day)).collect();
        Ok(())
    }

    /// Entries for one day in document order. Out-of-range days are empty.
    pub fn day(&self, day: u8) -> &[ScheduleEntry] {
        self.days.get(day as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(day, entries)` for Monday through Sunday.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &[ScheduleEntry])> {
        self.days
            .iter()
            .enumerate()
            .map(|(day, entries)| (day as u8, entries.as_slice()))
    }

    pub fn counts(&self) -> [usize; 7] {
        let mut counts = [0; 7];
        for (day, entries) in self.days.iter().enumerate() {
            counts[day] = entries.len();
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }
}

/// An on-air personality belonging to one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presenter {
    pub id: Option<Uuid>,
    pub station: String,
    pub name: String,
    pub biography: String,
    pub image: Option<String>,
    /// Biography page the image is scraped from; never persisted.
    #[serde(skip)]
    pub url: Option<String>,
}

impl Presenter {
    pub fn new(station: &str, name: String, biography: String) -> Self {
        Self {
            id: None,
            station: station.to_string(),
            name,
            biography,
            image: None,
            url: None,
        }
    }
}

/// Where a station's weekly schedule comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleSource {
    /// OnAir 2 theme page with day-labelled show blocks.
    OnAir { schedule_url: String },
    /// Pro Radio theme page with one tab per day.
    ProRadio { schedule_url: String },
}

impl ScheduleSource {
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleSource::OnAir { .. } => ON_AIR_SOURCE,
            ScheduleSource::ProRadio { .. } => PRO_RADIO_SOURCE,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            ScheduleSource::OnAir { schedule_url } | ScheduleSource::ProRadio { schedule_url } => {
                schedule_url
            }
        }
    }
}

/// Where a station's presenter roster comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresenterSource {
    /// WordPress RSS feed of presenter posts.
    Wordpress { presenter_list_url: String },
}

impl PresenterSource {
    pub fn kind(&self) -> &'static str {
        match self {
            PresenterSource::Wordpress { .. } => WORDPRESS_SOURCE,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            PresenterSource::Wordpress { presenter_list_url } => presenter_list_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    #[serde(default)]
    pub schedule: Option<ScheduleSource>,
    #[serde(default)]
    pub presenters: Option<PresenterSource>,
}

impl Station {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            schedule: None,
            presenters: None,
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
