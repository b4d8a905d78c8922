//! Scraped data types
//!
//! A listing page yields `ResultStub`s; each stub plus its detail page
//! becomes one `Record`.

use crate::crawler::extractor::ExtractError;
use serde::{Deserialize, Serialize};

/// One entry of a search-result listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultStub {
    /// Site identifier of the document (the `rjs8` attribute)
    pub identifier: String,

    /// Absolute URL of the detail page
    pub url: String,

    pub title: String,
}

/// Everything extracted from one listing page
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub stubs: Vec<ResultStub>,

    /// Result items that could not be read, one error per item
    pub rejected: Vec<ExtractError>,

    /// Link to the following listing page, as written in the markup
    pub next_link: String,
}

/// Optional fields pulled from a detail page
///
/// Each field is `None` when its markup path matched no text, otherwise the
/// trimmed non-blank text lines found there. A path that matched only
/// whitespace gives an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFields {
    /// Document number (法规文号)
    pub issuing_reference: Option<Vec<String>>,

    /// Publish date (发布日期)
    pub publish_date: Option<Vec<String>>,

    /// Effective date (实施日期)
    pub effective_date: Option<Vec<String>>,

    /// Issuing department (发布部门)
    pub issuing_authority: Option<Vec<String>>,

    /// Legal effect level (效力等级)
    pub legal_tier: Option<Vec<String>>,

    /// Main text (正文)
    pub body_text: Option<Vec<String>>,
}

impl DetailFields {
    /// Number of fields that were found on the page
    pub fn present_count(&self) -> usize {
        [
            &self.issuing_reference,
            &self.publish_date,
            &self.effective_date,
            &self.issuing_authority,
            &self.legal_tier,
            &self.body_text,
        ]
        .iter()
        .filter(|field| field.is_some())
        .count()
    }
}

/// A fully scraped document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique key in the store
    pub identifier: String,
    pub url: String,
    pub title: String,
    #[serde(flatten)]
    pub fields: DetailFields,
}

impl Record {
    /// Merges a stub with the fields extracted from its detail page
    pub fn from_parts(stub: ResultStub, fields: DetailFields) -> Self {
        Self {
            identifier: stub.identifier,
            url: stub.url,
            title: stub.title,
            fields,
        }
    }
}
