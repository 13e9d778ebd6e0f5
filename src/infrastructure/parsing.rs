//! HTML parsing for the catalog's search and product pages
//!
//! All knowledge of the site's markup lives under this module. Selectors
//! come from [`SelectorConfig`] so a layout change is a config change
//! first and a code change only when the structure itself moves.

pub mod cross_reference_parser;
pub mod error;
pub mod product_detail_parser;
pub mod search_results_parser;

pub use cross_reference_parser::CrossReferenceExtractor;
pub use error::{ParsingError, ParsingResult};
pub use product_detail_parser::ProductDetailParser;
pub use search_results_parser::{SearchResultsParser, build_search_url, resolve_link};

pub use crate::infrastructure::config::SelectorConfig;

use scraper::{ElementRef, Selector};

/// Compile one selector string, mapping the error to [`ParsingError`]
pub(crate) fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

/// Trimmed concatenated text of an element
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// True when the element carries every listed class
pub(crate) fn has_all_classes(element: &ElementRef<'_>, classes: &[String]) -> bool {
    classes
        .iter()
        .all(|wanted| element.value().classes().any(|class| class == wanted))
}
