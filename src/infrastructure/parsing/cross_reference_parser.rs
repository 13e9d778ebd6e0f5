//! Cross-reference section extraction
//!
//! The product page lists interchange numbers under a heading titled
//! "Cross-Reference Numbers". Each following sibling that carries all
//! row marker classes is one brand row: a label column with the brand
//! and a value column with one inline element per code. The first
//! sibling missing a marker ends the section.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{ParsingResult, SelectorConfig, compile_selector, element_text, has_all_classes};
use crate::domain::CrossRefGroup;

/// Extracts [`CrossRefGroup`]s from a parsed product page
#[derive(Debug, Clone)]
pub struct CrossReferenceExtractor {
    heading: Selector,
    heading_text: String,
    marker_classes: Vec<String>,
    label: Selector,
    values: Selector,
}

impl CrossReferenceExtractor {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&SelectorConfig::default())
    }

    pub fn with_config(selectors: &SelectorConfig) -> ParsingResult<Self> {
        Ok(Self {
            heading: compile_selector(&selectors.cross_ref_heading)?,
            heading_text: selectors.cross_ref_heading_text.clone(),
            marker_classes: selectors.row_marker_classes.clone(),
            label: compile_selector(&selectors.label_column)?,
            values: compile_selector(&selectors.value_elements)?,
        })
    }

    /// Groups in page order; empty when the page has no such section.
    pub fn extract(&self, document: &Html) -> Vec<CrossRefGroup> {
        let Some(heading) = document
            .select(&self.heading)
            .find(|heading| element_text(heading) == self.heading_text)
        else {
            debug!("No cross-reference heading on page");
            return Vec::new();
        };

        let groups: Vec<CrossRefGroup> = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|sibling| has_all_classes(sibling, &self.marker_classes))
            .map(|row| self.extract_group(&row))
            .collect();

        debug!("Extracted {} cross-reference groups", groups.len());
        groups
    }

    fn extract_group(&self, row: &ElementRef<'_>) -> CrossRefGroup {
        let brand = row
            .select(&self.label)
            .next()
            .map(|label| element_text(&label))
            .unwrap_or_default();

        let values = row
            .select(&self.values)
            .map(|value| element_text(&value))
            .filter(|text| !text.is_empty())
            .collect();

        CrossRefGroup { brand, values }
    }
}
