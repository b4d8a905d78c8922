//! Markup extractor for listing and detail pages
//!
//! Field locations are fixed paths into the site's markup. Two kinds of path
//! are treated differently:
//! - Structural paths (the result list, the next-page link) must match,
//!   otherwise the page is not what we expect and extraction fails.
//! - Per-item paths (each result's anchor, link and identifier) may fail for
//!   single items; those items are set aside and the rest of the page is kept.
//! - Content paths (the six document fields) may match nothing; the field is
//!   then recorded as absent.

use crate::crawler::record::{DetailFields, ListingPage, ResultStub};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Result list on a listing page
pub const LIST_CONTAINER_PATH: &str = "ul.list05";

/// One result inside the list
pub const LIST_ITEM_PATH: &str = "ul.list05 > li";

/// Result anchor, relative to a list item
pub const ITEM_ANCHOR_PATH: &str = "div.div05 > h2 > a";

/// Attribute of the result anchor holding the document identifier
pub const IDENTIFIER_ATTR: &str = "rjs8";

/// "Next page" link in the pagination form
pub const NEXT_LINK_PATH: &str = r#"form[name="pageform"] > div > a.xyy"#;

const INFO_LIST: &str =
    "body > div:nth-of-type(8) > div > div > div:nth-of-type(3) > ul";

/// Errors raised when a structural or per-item path does not match
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error("No node matched path: {path}")]
    MissingNode { path: String },

    #[error("Invalid link '{href}'")]
    InvalidLink { href: String },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Result type for extraction
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Named content fields of a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailField {
    IssuingReference,
    PublishDate,
    EffectiveDate,
    IssuingAuthority,
    LegalTier,
    BodyText,
}

impl DetailField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::IssuingReference => "issuing_reference",
            Self::PublishDate => "publish_date",
            Self::EffectiveDate => "effective_date",
            Self::IssuingAuthority => "issuing_authority",
            Self::LegalTier => "legal_tier",
            Self::BodyText => "body_text",
        }
    }

    /// The `DetailFields` slot this field is written to
    fn slot(self, fields: &mut DetailFields) -> &mut Option<Vec<String>> {
        match self {
            Self::IssuingReference => &mut fields.issuing_reference,
            Self::PublishDate => &mut fields.publish_date,
            Self::EffectiveDate => &mut fields.effective_date,
            Self::IssuingAuthority => &mut fields.issuing_authority,
            Self::LegalTier => &mut fields.legal_tier,
            Self::BodyText => &mut fields.body_text,
        }
    }
}

/// Where each content field lives on a detail page
pub fn detail_paths() -> Vec<(DetailField, String)> {
    vec![
        (
            DetailField::IssuingReference,
            format!("{INFO_LIST} > li:nth-of-type(2) > p"),
        ),
        (DetailField::PublishDate, "p#tdat".to_string()),
        (
            DetailField::EffectiveDate,
            format!("{INFO_LIST} > li:nth-of-type(4) > p"),
        ),
        (DetailField::IssuingAuthority, "p#tdpt".to_string()),
        (
            DetailField::LegalTier,
            format!("{INFO_LIST} > li:nth-of-type(6) > p"),
        ),
        (DetailField::BodyText, "div#maintext".to_string()),
    ]
}

/// Compiled selectors for both page kinds
///
/// Build once and share; selectors are immutable.
#[derive(Debug)]
pub struct Extractor {
    list_container: Selector,
    list_item: Selector,
    item_anchor: Selector,
    next_link: Selector,
    fields: Vec<(DetailField, Selector)>,
}

impl Extractor {
    pub fn new() -> ExtractResult<Self> {
        let fields = detail_paths()
            .into_iter()
            .map(|(field, path)| Ok((field, create_selector(&path)?)))
            .collect::<ExtractResult<Vec<_>>>()?;

        Ok(Self {
            list_container: create_selector(LIST_CONTAINER_PATH)?,
            list_item: create_selector(LIST_ITEM_PATH)?,
            item_anchor: create_selector(ITEM_ANCHOR_PATH)?,
            next_link: create_selector(NEXT_LINK_PATH)?,
            fields,
        })
    }

    /// Extracts the result stubs and next-page link from a listing page
    ///
    /// # Arguments
    ///
    /// * `page` - Raw listing page body
    /// * `base_url` - Base URL for resolving result links
    ///
    /// # Returns
    ///
    /// * `Ok(ListingPage)` - Stubs in page order, the items that could not be
    ///   read, and the next-page link
    /// * `Err(ExtractError::MissingNode)` - The result list or the next-page
    ///   link is missing
    pub fn extract_listing(&self, page: &[u8], base_url: &Url) -> ExtractResult<ListingPage> {
        let html = String::from_utf8_lossy(page);
        let document = Html::parse_document(&html);

        if document.select(&self.list_container).next().is_none() {
            return Err(missing(LIST_CONTAINER_PATH));
        }

        let mut stubs = Vec::new();
        let mut rejected = Vec::new();
        for (index, item) in document.select(&self.list_item).enumerate() {
            match self.extract_stub(item, index, base_url) {
                Ok(stub) => stubs.push(stub),
                Err(e) => rejected.push(e),
            }
        }

        // The pagination form repeats the link; the last one wins
        let next_link = document
            .select(&self.next_link)
            .filter_map(|a| a.value().attr("href"))
            .last()
            .map(|href| href.trim().to_string())
            .ok_or_else(|| missing(NEXT_LINK_PATH))?;

        Ok(ListingPage {
            stubs,
            rejected,
            next_link,
        })
    }

    fn extract_stub(
        &self,
        item: ElementRef<'_>,
        index: usize,
        base_url: &Url,
    ) -> ExtractResult<ResultStub> {
        let item_path = |suffix: &str| format!("{LIST_ITEM_PATH}[{}] {suffix}", index + 1);

        let anchor = item
            .select(&self.item_anchor)
            .next()
            .ok_or_else(|| missing(item_path(ITEM_ANCHOR_PATH)))?;

        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| missing(item_path(&format!("{ITEM_ANCHOR_PATH}@href"))))?;

        let identifier = item
            .select(&self.item_anchor)
            .filter_map(|a| a.value().attr(IDENTIFIER_ATTR))
            .last()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                missing(item_path(&format!("{ITEM_ANCHOR_PATH}@{IDENTIFIER_ATTR}")))
            })?;

        let url = base_url
            .join(href.trim())
            .map_err(|_| ExtractError::InvalidLink {
                href: href.to_string(),
            })?;

        let title = anchor
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| anchor.text().collect::<String>().trim().to_string());

        Ok(ResultStub {
            identifier,
            url: url.to_string(),
            title,
        })
    }

    /// Extracts the content fields from a detail page
    ///
    /// Never fails: a field whose path matches no text node is left as
    /// `None`. A field whose text nodes are all whitespace is present with
    /// no lines.
    pub fn extract_detail(&self, page: &[u8]) -> DetailFields {
        let html = String::from_utf8_lossy(page);
        let document = Html::parse_document(&html);

        let mut fields = DetailFields::default();
        for (field, selector) in &self.fields {
            let nodes: Vec<&str> = document.select(selector).flat_map(direct_text).collect();

            if nodes.is_empty() {
                tracing::debug!("Field {} absent", field.name());
                continue;
            }

            let lines = nodes
                .into_iter()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            *field.slot(&mut fields) = Some(lines);
        }
        fields
    }
}

/// Text nodes that are direct children of `element`
fn direct_text(element: ElementRef<'_>) -> Vec<&str> {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect()
}

#[inline]
fn create_selector(path: &str) -> ExtractResult<Selector> {
    Selector::parse(path).map_err(|_| ExtractError::InvalidSelector(path.to_string()))
}

fn missing(path: impl Into<String>) -> ExtractError {
    ExtractError::MissingNode { path: path.into() }
}
