use super::{element_text, non_empty, required_attr, required_text, selector, ScheduleParser};
use crate::constants::{
    self, DAY_NAMES, PRO_RADIO_META_SELECTOR, PRO_RADIO_PAPER_SELECTOR, PRO_RADIO_SOURCE,
    PRO_RADIO_TAB_SELECTOR, PRO_RADIO_TIME_FORMAT, PRO_RADIO_TITLE_SELECTOR,
};
use crate::error::{Result, SyncError};
use crate::types::{ScheduleEntry, WeeklySchedule};
use chrono::NaiveTime;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Parses the schedule page of the Pro Radio WordPress theme: one tab per day,
/// each tab holding an `article` per show.
pub struct ProRadioParser;

impl Default for ProRadioParser {
    fn default() -> Self {
        Self::new()
    }
}

struct ArticleSelectors {
    title: Selector,
    paper: Selector,
    paragraph: Selector,
    meta: Selector,
    image: Selector,
}

impl ArticleSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            title: selector(PRO_RADIO_TITLE_SELECTOR)?,
            paper: selector(PRO_RADIO_PAPER_SELECTOR)?,
            paragraph: selector("p")?,
            meta: selector(PRO_RADIO_META_SELECTOR)?,
            image: selector("img")?,
        })
    }
}

/// Parse the leading time of a "6:00 am - 9:00 am" style meta line.
pub fn parse_start_time(meta: &str) -> Result<NaiveTime> {
    let start = meta.split('-').next().unwrap_or("").trim().to_uppercase();
    NaiveTime::parse_from_str(&start, PRO_RADIO_TIME_FORMAT)
        .map_err(|e| SyncError::Parse(format!("invalid start time '{}': {}", start, e)))
}

impl ProRadioParser {
    pub fn new() -> Self {
        Self
    }

    /// Map each recognised day name to the id of the tab holding its shows.
    fn day_fragments(&self, document: &Html) -> Result<HashMap<u8, String>> {
        let tabs = selector(PRO_RADIO_TAB_SELECTOR)?;
        let mut fragments = HashMap::new();

        for tab in document.select(&tabs) {
            let label = element_text(tab);
            let Some(day) = constants::day_index(&label) else {
                debug!("Ignoring tab '{}'", label);
                continue;
            };
            let Some(href) = tab.value().attr("href") else {
                warn!("Tab for {} has no href", label);
                continue;
            };
            let fragment = href.strip_prefix('#').unwrap_or(href);
            fragments.insert(day, fragment.to_string());
        }

        Ok(fragments)
    }

    fn find_fragment<'a>(&self, document: &'a Html, divs: &Selector, id: &str) -> Option<ElementRef<'a>> {
        document
            .select(divs)
            .find(|div| div.value().attr("id") == Some(id))
    }

    fn article_to_entry(&self, article: ElementRef<'_>, selectors: &ArticleSelectors) -> Result<ScheduleEntry> {
        let title = non_empty(required_text(article, &selectors.title, "show title")?, "show title")?;
        let paper = article
            .select(&selectors.paper)
            .next()
            .ok_or_else(|| SyncError::MissingField("show description block".to_string()))?;
        let description = required_text(paper, &selectors.paragraph, "show description")?;
        let meta = required_text(article, &selectors.meta, "show times")?;
        let image = required_attr(article, &selectors.image, "src", "show image")?;

        Ok(ScheduleEntry::new(title, description, image, parse_start_time(&meta)?))
    }
}

impl ScheduleParser for ProRadioParser {
    fn source_kind(&self) -> &'static str {
        PRO_RADIO_SOURCE
    }

    #[instrument(skip(self, content), fields(content_len = content.len()))]
    fn parse(&self, content: &str) -> Result<WeeklySchedule> {
        let mut week = WeeklySchedule::new();
        let document = Html::parse_document(content);
        let fragments = self.day_fragments(&document)?;
        let divs = selector("div")?;
        let articles = selector("article")?;
        let selectors = ArticleSelectors::new()?;

        for (index, name) in DAY_NAMES.iter().enumerate() {
            let day = index as u8;
            let Some(fragment_id) = fragments.get(&day) else {
                debug!("No tab found for {}", name);
                continue;
            };
            let Some(fragment) = self.find_fragment(&document, &divs, fragment_id) else {
                warn!("Tab {} for {} is missing from the page", fragment_id, name);
                continue;
            };

            let entries = fragment
                .select(&articles)
                .map(|article| self.article_to_entry(article, &selectors))
                .collect::<Result<Vec<_>>>()?;
            week.set_day(day, entries)?;
        }

        info!("Parsed {} Pro Radio shows {:?}", week.len(), week.counts());
        Ok(week)
    }
}
