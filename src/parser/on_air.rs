use super::{element_text, non_empty, required_attr, required_text, selector, ScheduleParser};
use crate::constants::{
    self, ON_AIR_CURRENT_CLASS, ON_AIR_DAY_SELECTOR, ON_AIR_DESCRIPTION_SELECTOR,
    ON_AIR_SHOW_CLASS, ON_AIR_SOURCE, ON_AIR_TIME_FORMAT, ON_AIR_TIME_SELECTOR,
};
use crate::error::{Result, SyncError};
use crate::types::{ScheduleEntry, WeeklySchedule};
use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

/// Forced thumbnail resolution WordPress appends to image file names.
static RESOLUTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\d{3}x\d{3}").expect("resolution pattern is valid"));

/// Strip every `-DDDxDDD` token from an image URL.
pub fn strip_resolution(url: &str) -> String {
    RESOLUTION_TOKEN.replace_all(url, "").into_owned()
}

/// Parses the schedule page of the OnAir 2 WordPress theme, where every show
/// block carries its own day label.
pub struct OnAirParser;

impl Default for OnAirParser {
    fn default() -> Self {
        Self::new()
    }
}

struct ShowSelectors {
    image: Selector,
    title: Selector,
    description: Selector,
    day: Selector,
    time: Selector,
}

impl ShowSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            image: selector("img")?,
            title: selector("a")?,
            description: selector(ON_AIR_DESCRIPTION_SELECTOR)?,
            day: selector(ON_AIR_DAY_SELECTOR)?,
            time: selector(ON_AIR_TIME_SELECTOR)?,
        })
    }
}

impl OnAirParser {
    pub fn new() -> Self {
        Self
    }

    fn show_selector() -> Result<Selector> {
        selector(&format!(".{}", ON_AIR_SHOW_CLASS))
    }

    /// Title, description, image and start of one show block. Day is left unset.
    fn parse_show(&self, block: ElementRef<'_>, selectors: &ShowSelectors) -> Result<ScheduleEntry> {
        let image = required_attr(block, &selectors.image, "src", "show image")?;
        let title = non_empty(required_text(block, &selectors.title, "show title")?, "show title")?;
        let description = required_text(block, &selectors.description, "show description")?;
        let start_text = required_text(block, &selectors.time, "show start time")?;
        let start = NaiveTime::parse_from_str(&start_text, ON_AIR_TIME_FORMAT).map_err(|e| {
            SyncError::Parse(format!("invalid start time '{}' for {}: {}", start_text, title, e))
        })?;

        Ok(ScheduleEntry::new(
            title,
            description,
            strip_resolution(&image),
            start,
        ))
    }

    fn parse_day(&self, block: ElementRef<'_>, selectors: &ShowSelectors) -> Result<u8> {
        let label = block
            .select(&selectors.day)
            .next()
            .map(element_text)
            .ok_or_else(|| SyncError::MissingField("show day".to_string()))?;
        constants::day_index(&label)
            .ok_or_else(|| SyncError::Parse(format!("unrecognised day label '{}'", label)))
    }

    /// Find the single block flagged as currently on air.
    ///
    /// The returned entry has no day: it describes a point in time rather than
    /// a slot in the week.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub fn parse_current(&self, content: &str) -> Result<Option<ScheduleEntry>> {
        let document = Html::parse_document(content);
        let current = selector(&format!(".{}.{}", ON_AIR_SHOW_CLASS, ON_AIR_CURRENT_CLASS))?;
        let selectors = ShowSelectors::new()?;

        match document.select(&current).next() {
            Some(block) => {
                let entry = self.parse_show(block, &selectors)?;
                debug!("Current show is {}", entry.title);
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }
}

impl ScheduleParser for OnAirParser {
    fn source_kind(&self) -> &'static str {
        ON_AIR_SOURCE
    }

    #[instrument(skip(self, content), fields(content_len = content.len()))]
    fn parse(&self, content: &str) -> Result<WeeklySchedule> {
        let mut week = WeeklySchedule::new();
        let document = Html::parse_document(content);
        let shows = Self::show_selector()?;
        let selectors = ShowSelectors::new()?;

        for block in document.select(&shows) {
            let entry = self.parse_show(block, &selectors)?;
            let day = self.parse_day(block, &selectors)?;
            week.push(day, entry)?;
        }

        info!("Parsed {} OnAir shows {:?}", week.len(), week.counts());
        Ok(week)
    }
}
