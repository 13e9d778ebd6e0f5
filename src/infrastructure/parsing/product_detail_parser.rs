//! Product detail page parsing

use scraper::{Html, Selector};

use super::{
    CrossReferenceExtractor, ParsingResult, SelectorConfig, compile_selector, element_text,
};
use crate::domain::ProductPage;

/// Turns a product page body into [`ProductPage::Parsed`]
#[derive(Debug, Clone)]
pub struct ProductDetailParser {
    title: Selector,
    price: Selector,
    cross_refs: CrossReferenceExtractor,
}

impl ProductDetailParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&SelectorConfig::default())
    }

    pub fn with_config(selectors: &SelectorConfig) -> ParsingResult<Self> {
        Ok(Self {
            title: compile_selector(&selectors.product_title)?,
            price: compile_selector(&selectors.product_price)?,
            cross_refs: CrossReferenceExtractor::with_config(selectors)?,
        })
    }

    /// Missing title or price become empty strings.
    pub fn parse(&self, html: &str, url: &str) -> ProductPage {
        let document = Html::parse_document(html);

        ProductPage::Parsed {
            title: Self::first_text(&document, &self.title),
            price: Self::first_text(&document, &self.price),
            cross_refs: self.cross_refs.extract(&document),
            url: url.to_string(),
        }
    }

    fn first_text(document: &Html, selector: &Selector) -> String {
        document
            .select(selector)
            .next()
            .map(|element| element_text(&element))
            .unwrap_or_default()
    }
}
