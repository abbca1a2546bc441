//! Format parsers: raw upstream documents in, canonical structures out.
//!
//! Every parser here is pure. Fetching and persistence live elsewhere.

pub mod on_air;
pub mod pro_radio;
pub mod wordpress;

use crate::error::{Result, SyncError};
use crate::types::{ScheduleSource, WeeklySchedule};
use scraper::{ElementRef, Selector};

pub use on_air::OnAirParser;
pub use pro_radio::ProRadioParser;
pub use wordpress::{WordpressPresenterImage, WordpressPresenterParser};

/// A parser that turns one schedule page into a full week.
pub trait ScheduleParser: Send + Sync {
    /// Source kind this parser understands, as used in config and logs.
    fn source_kind(&self) -> &'static str;

    fn parse(&self, content: &str) -> Result<WeeklySchedule>;
}

/// Pick the parser matching a station's configured schedule source.
pub fn schedule_parser_for(source: &ScheduleSource) -> Box<dyn ScheduleParser> {
    match source {
        ScheduleSource::OnAir { .. } => Box::new(OnAirParser::new()),
        ScheduleSource::ProRadio { .. } => Box::new(ProRadioParser::new()),
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SyncError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Concatenated, trimmed text of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of the first descendant matching `selector`; missing is an error.
pub(crate) fn required_text(
    parent: ElementRef<'_>,
    selector: &Selector,
    field: &str,
) -> Result<String> {
    parent
        .select(selector)
        .next()
        .map(element_text)
        .ok_or_else(|| SyncError::MissingField(field.to_string()))
}

/// Blank text counts as missing for fields that identify a record.
pub(crate) fn non_empty(text: String, field: &str) -> Result<String> {
    if text.is_empty() {
        return Err(SyncError::MissingField(format!("{} (empty)", field)));
    }
    Ok(text)
}

/// An attribute of the first descendant matching `selector`; missing is an error.
pub(crate) fn required_attr(
    parent: ElementRef<'_>,
    selector: &Selector,
    attr: &str,
    field: &str,
) -> Result<String> {
    parent
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .ok_or_else(|| SyncError::MissingField(field.to_string()))
}
