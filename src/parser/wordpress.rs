use super::{non_empty, selector};
use crate::constants::{PRESENTER_HEADER_SELECTOR, PRESENTER_IMAGE_ATTR, RSS_CONTENT_NAMESPACE};
use crate::error::{Result, SyncError};
use crate::types::Presenter;
use roxmltree::{Document, Node};
use scraper::Html;
use tracing::{debug, info, instrument};

/// Parses the presenter roster from a WordPress RSS feed.
pub struct WordpressPresenterParser;

impl Default for WordpressPresenterParser {
    fn default() -> Self {
        Self::new()
    }
}

fn child<'a, 'input>(item: Node<'a, 'input>, name: (Option<&str>, &str)) -> Option<Node<'a, 'input>> {
    item.children().find(|node| match name {
        (Some(namespace), local) => node.has_tag_name((namespace, local)),
        (None, local) => {
            node.is_element()
                && node.tag_name().name() == local
                && node.tag_name().namespace().is_none()
        }
    })
}

fn required_child_text(item: Node<'_, '_>, name: (Option<&str>, &str), field: &str) -> Result<String> {
    child(item, name)
        .map(|node| node.text().unwrap_or_default().trim().to_string())
        .ok_or_else(|| SyncError::MissingField(field.to_string()))
}

impl WordpressPresenterParser {
    pub fn new() -> Self {
        Self
    }

    /// Presenters in feed order, each attributed to `station`.
    #[instrument(skip(self, xml), fields(xml_len = xml.len()))]
    pub fn parse(&self, xml: &str, station: &str) -> Result<Vec<Presenter>> {
        let document = Document::parse(xml)
            .map_err(|e| SyncError::Parse(format!("presenter feed is not valid XML: {}", e)))?;

        let items = document
            .root_element()
            .children()
            .filter(|node| node.has_tag_name("channel"))
            .flat_map(|channel| channel.children().filter(|node| node.has_tag_name("item")));

        let mut presenters = Vec::new();
        for item in items {
            let name = non_empty(
                required_child_text(item, (None, "title"), "presenter title")?,
                "presenter title",
            )?;
            let biography = required_child_text(
                item,
                (Some(RSS_CONTENT_NAMESPACE), "encoded"),
                "presenter content:encoded",
            )?;
            let url = non_empty(
                required_child_text(item, (None, "link"), "presenter link")?,
                "presenter link",
            )?;

            debug!("Found presenter {}", name);
            let mut presenter = Presenter::new(station, name, biography);
            presenter.url = Some(url);
            presenters.push(presenter);
        }

        info!("Parsed {} presenters for {}", presenters.len(), station);
        Ok(presenters)
    }
}

/// Pulls the header image out of a presenter's biography page.
pub struct WordpressPresenterImage;

impl Default for WordpressPresenterImage {
    fn default() -> Self {
        Self::new()
    }
}

impl WordpressPresenterImage {
    pub fn new() -> Self {
        Self
    }

    /// `None` when there is no page, no header block or no image attribute.
    pub fn parse(&self, html: Option<&str>) -> Option<String> {
        let html = html.filter(|content| !content.trim().is_empty())?;
        let header = selector(PRESENTER_HEADER_SELECTOR).ok()?;
        let document = Html::parse_document(html);

        let image = document
            .select(&header)
            .next()?
            .value()
            .attr(PRESENTER_IMAGE_ATTR)
            .map(|url| url.trim().to_string());
        debug!("Presenter image: {:?}", image);
        image
    }
}
