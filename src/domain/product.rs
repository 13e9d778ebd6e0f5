//! Product-related domain types
//!
//! One [`InputItem`] goes in, exactly one [`ResolutionResult`] comes out.
//! Everything in between (search page, product page, cross-reference
//! groups) is represented here as plain immutable values.

use serde::{Deserialize, Serialize};

/// One requested part: a brand and a single part code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputItem {
    pub brand: String,
    pub code: String,
}

impl InputItem {
    pub fn new(brand: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            code: code.into(),
        }
    }
}

/// One interchange brand and its equivalent codes, in page order.
///
/// Duplicates are kept as they appear on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRefGroup {
    pub brand: String,
    pub values: Vec<String>,
}

impl CrossRefGroup {
    pub fn new(brand: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            brand: brand.into(),
            values,
        }
    }
}

/// Parsed product detail page, or the reason it could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductPage {
    Parsed {
        title: String,
        price: String,
        #[serde(rename = "crossRefs")]
        cross_refs: Vec<CrossRefGroup>,
        url: String,
    },
    Failed {
        error: String,
        url: String,
    },
}

impl ProductPage {
    pub fn url(&self) -> &str {
        match self {
            Self::Parsed { url, .. } | Self::Failed { url, .. } => url,
        }
    }

    /// Cross-reference groups; empty for a failed page.
    pub fn cross_refs(&self) -> &[CrossRefGroup] {
        match self {
            Self::Parsed { cross_refs, .. } => cross_refs,
            Self::Failed { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Parsed { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcome of resolving one [`InputItem`].
///
/// - `found == false`, no `error`: the search legitimately returned nothing.
/// - `found == false` with `error`: the search page could not be fetched or
///   the resolver failed before a product link was known.
/// - `found == true`: a product link was located; `product_data` may still
///   carry a nested failure when the product page itself could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub brand: String,
    pub code: String,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_data: Option<ProductPage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolutionResult {
    pub fn not_found(brand: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            code: code.into(),
            found: false,
            href: None,
            product_data: None,
            error: None,
        }
    }

    pub fn failed(
        brand: impl Into<String>,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::not_found(brand, code)
        }
    }

    pub fn found(
        brand: impl Into<String>,
        code: impl Into<String>,
        href: impl Into<String>,
        product_data: ProductPage,
    ) -> Self {
        Self {
            brand: brand.into(),
            code: code.into(),
            found: true,
            href: Some(href.into()),
            product_data: Some(product_data),
            error: None,
        }
    }

    /// Counts as a success only when found with no error at any level.
    ///
    /// A found product whose page failed to load is an error for the
    /// batch counters even though `found` is true.
    pub fn is_success(&self) -> bool {
        self.found
            && self.error.is_none()
            && !self.product_data.as_ref().is_some_and(ProductPage::is_failed)
    }

    /// Cross-reference groups of the found product, empty otherwise.
    pub fn cross_refs(&self) -> &[CrossRefGroup] {
        self.product_data
            .as_ref()
            .map(ProductPage::cross_refs)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed_page(groups: Vec<CrossRefGroup>) -> ProductPage {
        ProductPage::Parsed {
            title: "Brake pad set".to_string(),
            price: "12.50".to_string(),
            cross_refs: groups,
            url: "https://spareto.com/p/1".to_string(),
        }
    }

    #[test]
    fn test_success_classification() {
        let ok = ResolutionResult::found("BOSCH", "0001", "https://spareto.com/p/1", parsed_page(vec![]));
        assert!(ok.is_success());

        let clean_miss = ResolutionResult::not_found("BOSCH", "0001");
        assert!(!clean_miss.is_success());

        let transport = ResolutionResult::failed("BOSCH", "0001", "timed out");
        assert!(!transport.is_success());

        let degraded = ResolutionResult::found(
            "BOSCH",
            "0001",
            "https://spareto.com/p/1",
            ProductPage::Failed {
                error: "HTTP 503".to_string(),
                url: "https://spareto.com/p/1".to_string(),
            },
        );
        assert!(degraded.found);
        assert!(!degraded.is_success());
        assert!(degraded.cross_refs().is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let result = ResolutionResult::found(
            "BOSCH",
            "0001",
            "https://spareto.com/p/1",
            parsed_page(vec![CrossRefGroup::new("ATE", vec!["111".to_string()])]),
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["found"], true);
        assert_eq!(json["productData"]["crossRefs"][0]["brand"], "ATE");
        assert!(json.get("error").is_none());

        let back: ResolutionResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_failed_page_deserializes_as_failed() {
        let page: ProductPage =
            serde_json::from_str(r#"{"error":"boom","url":"https://spareto.com/p/2"}"#).unwrap();
        assert!(page.is_failed());
        assert_eq!(page.error(), Some("boom"));
        assert_eq!(page.url(), "https://spareto.com/p/2");
    }
}
