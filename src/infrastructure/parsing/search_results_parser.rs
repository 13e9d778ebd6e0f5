//! Search results page parsing and URL construction
//!
//! The search page lists matching products as cards inside a results grid.
//! Only the first card matters: its first link leads to the product page.

use scraper::{Html, Selector};
use url::Url;

use super::{ParsingError, ParsingResult, SelectorConfig, compile_selector};
use crate::infrastructure::config::site;

/// Locates the first product link on a search results page
#[derive(Debug, Clone)]
pub struct SearchResultsParser {
    container: Selector,
    card: Selector,
    link: Selector,
}

impl SearchResultsParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&SelectorConfig::default())
    }

    pub fn with_config(selectors: &SelectorConfig) -> ParsingResult<Self> {
        Ok(Self {
            container: compile_selector(&selectors.results_container)?,
            card: compile_selector(&selectors.product_card)?,
            link: compile_selector(&selectors.card_link)?,
        })
    }

    /// Raw `href` of the first card's first link, if any.
    pub fn first_product_href(&self, document: &Html) -> Option<String> {
        let container = document.select(&self.container).next()?;
        let card = container.select(&self.card).next()?;
        card.select(&self.link)
            .filter_map(|link| link.value().attr("href"))
            .map(str::trim)
            .find(|href| !href.is_empty())
            .map(ToString::to_string)
    }

    /// Parse `html` and return the first product link.
    pub fn parse(&self, html: &str) -> Option<String> {
        self.first_product_href(&Html::parse_document(html))
    }
}

/// Build the search URL for one part.
///
/// `brand` is expected to be normalized already. Both values are
/// percent-encoded.
pub fn build_search_url(origin: &str, code: &str, brand: &str) -> String {
    format!(
        "{}{}?utf8=%E2%9C%93&keywords={}&sort_by=&brand%5B%5D={}",
        origin.trim_end_matches('/'),
        site::SEARCH_PATH,
        urlencoding::encode(code),
        urlencoding::encode(brand),
    )
}

/// Resolve a (usually relative) product link against the site origin.
pub fn resolve_link(origin: &str, href: &str) -> ParsingResult<String> {
    let base = Url::parse(origin)
        .map_err(|e| ParsingError::url_resolution_failed(origin, e, None))?;
    base.join(href)
        .map(String::from)
        .map_err(|e| ParsingError::url_resolution_failed(href, e, Some(origin)))
}
