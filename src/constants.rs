//! Markup markers and naming constants shared by the parsers and the CLI.

/// Full English day names, indexed Monday = 0.
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

// OnAir 2 schedule pages
pub const ON_AIR_SHOW_CLASS: &str = "qt-part-show-schedule-day-item";
pub const ON_AIR_CURRENT_CLASS: &str = "qt-current";
pub const ON_AIR_DESCRIPTION_SELECTOR: &str = "p.qt-ellipsis-2";
pub const ON_AIR_DAY_SELECTOR: &str = "span.qt-day";
pub const ON_AIR_TIME_SELECTOR: &str = "span.qt-time";
pub const ON_AIR_TIME_FORMAT: &str = "%H:%M";

// Pro Radio schedule pages
pub const PRO_RADIO_TAB_SELECTOR: &str = "a[data-proradio-target=\"#proradio-tabslist\"]";
pub const PRO_RADIO_TITLE_SELECTOR: &str = "h3.proradio-post__title";
pub const PRO_RADIO_PAPER_SELECTOR: &str = "div.proradio-paper";
pub const PRO_RADIO_META_SELECTOR: &str = "p.proradio-itemmetas";
pub const PRO_RADIO_TIME_FORMAT: &str = "%I:%M %p";

// WordPress presenter feeds and biography pages
pub const RSS_CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";
pub const PRESENTER_HEADER_SELECTOR: &str = "div.qt-header-bg";
pub const PRESENTER_IMAGE_ATTR: &str = "data-bgimage";

// Source kinds as they appear in configuration and logs
pub const ON_AIR_SOURCE: &str = "on_air";
pub const PRO_RADIO_SOURCE: &str = "pro_radio";
pub const WORDPRESS_SOURCE: &str = "wordpress";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "STATION_SYNC_CONFIG";

/// Map a case-sensitive full English day name to its index (Monday = 0).
pub fn day_index(name: &str) -> Option<u8> {
    DAY_NAMES
        .iter()
        .position(|day| *day == name)
        .map(|index| index as u8)
}

/// Name for a day index, if it is in range.
pub fn day_name(day: u8) -> Option<&'static str> {
    DAY_NAMES.get(day as usize).copied()
}
