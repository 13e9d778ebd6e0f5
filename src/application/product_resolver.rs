//! Product resolution: one input item → one result
//!
//! Search page first, then (after a pacing delay) the first matching
//! product page. Every failure is turned into a [`ResolutionResult`]
//! here so nothing escapes into the batch.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::{InputItem, ProductPage, ResolutionResult, normalize_brand};
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::http_client::{FetchError, FetchPolicy, ResilientFetcher, Transport};
use crate::infrastructure::parsing::{
    ParsingError, ParsingResult, ProductDetailParser, SearchResultsParser, SelectorConfig,
    build_search_url, resolve_link,
};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parsing(#[from] ParsingError),
}

/// Anything that can turn an [`InputItem`] into a [`ResolutionResult`].
///
/// Implementations must not fail: errors belong inside the result.
#[async_trait]
pub trait ItemResolver: Send + Sync {
    async fn resolve(&self, item: &InputItem) -> ResolutionResult;
}

/// Pacing between requests of one item
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Wait before the product page fetch
    pub before_product: Duration,
    /// Wait once the item has settled, whatever the outcome
    pub after_item: Option<Duration>,
}

/// Resolves items against the catalog site
pub struct ProductResolver {
    fetcher: ResilientFetcher,
    search_parser: SearchResultsParser,
    detail_parser: ProductDetailParser,
    origin: String,
    pacing: Pacing,
}

impl ProductResolver {
    pub fn new(
        fetcher: ResilientFetcher,
        selectors: &SelectorConfig,
        origin: impl Into<String>,
        pacing: Pacing,
    ) -> ParsingResult<Self> {
        Ok(Self {
            fetcher,
            search_parser: SearchResultsParser::with_config(selectors)?,
            detail_parser: ProductDetailParser::with_config(selectors)?,
            origin: origin.into(),
            pacing,
        })
    }

    pub fn from_config(config: &CrawlerConfig, transport: Arc<dyn Transport>) -> ParsingResult<Self> {
        let fetcher = ResilientFetcher::new(
            transport,
            FetchPolicy::from_config(&config.site, &config.http),
        );
        let pacing = Pacing {
            before_product: config.pipeline.pacing_delay(),
            after_item: config
                .pipeline
                .trailing_delay
                .then(|| config.pipeline.pacing_delay()),
        };
        Self::new(fetcher, &config.selectors, config.site.origin.clone(), pacing)
    }

    /// Resolve one item; never fails.
    pub async fn resolve_item(&self, item: &InputItem) -> ResolutionResult {
        let brand = normalize_brand(&item.brand);

        let result = match self.try_resolve(&brand, &item.code).await {
            Ok(result) => result,
            Err(e) => {
                warn!("❌ {} {}: {}", brand, item.code, e);
                ResolutionResult::failed(brand, item.code.clone(), e.to_string())
            }
        };

        if let Some(delay) = self.pacing.after_item {
            sleep(delay).await;
        }
        result
    }

    async fn try_resolve(&self, brand: &str, code: &str) -> Result<ResolutionResult, ResolveError> {
        let search_url = build_search_url(&self.origin, code, brand);
        debug!("Searching {} {}: {}", brand, code, search_url);

        let search_html = self.fetcher.fetch(&search_url).await?;
        let Some(href) = self.search_parser.parse(&search_html) else {
            info!("🔍 No product found for {} {}", brand, code);
            return Ok(ResolutionResult::not_found(brand, code));
        };
        let product_url = resolve_link(&self.origin, &href)?;

        sleep(self.pacing.before_product).await;

        let product_data = self.fetch_product_page(&product_url).await;
        if let Some(error) = product_data.error() {
            warn!("⚠️ Product page for {} {} unavailable: {}", brand, code, error);
        } else {
            debug!(
                "Resolved {} {} → {} ({} cross-reference groups)",
                brand,
                code,
                product_url,
                product_data.cross_refs().len()
            );
        }

        Ok(ResolutionResult::found(brand, code, product_url, product_data))
    }

    /// Fetch and parse a product page; a fetch failure is kept inside the page.
    pub async fn fetch_product_page(&self, url: &str) -> ProductPage {
        match self.fetcher.fetch(url).await {
            Ok(html) => self.detail_parser.parse(&html, url),
            Err(e) => ProductPage::Failed {
                error: e.to_string(),
                url: url.to_string(),
            },
        }
    }
}

#[async_trait]
impl ItemResolver for ProductResolver {
    async fn resolve(&self, item: &InputItem) -> ResolutionResult {
        self.resolve_item(item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CrossRefGroup;
    use crate::infrastructure::http_client::FetchRequest;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::time::Instant;

    const ORIGIN: &str = "https://spareto.com";

    const SEARCH_HIT: &str = r#"<html><body><div id="products-js">
        <div class="card-col"><a href="/p/1">Bosch 0001</a></div>
    </div></body></html>"#;

    const SEARCH_MISS: &str = r#"<html><body><div id="products-js"></div></body></html>"#;

    const PRODUCT: &str = r#"<html><body><div>
        <h1 class="product-title">Brake pads</h1>
        <h3 class="mt-3">Cross-Reference Numbers</h3>
        <div class="row py-2"><div class="col-md-2">ATE</div>
            <div class="col-md-10"><span>111</span><span>222</span></div></div>
    </div></body></html>"#;

    /// Per-URL-prefix scripted answers with call timestamps
    #[derive(Default)]
    struct RoutedTransport {
        routes: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
        calls: Mutex<Vec<(Instant, String)>>,
    }

    impl RoutedTransport {
        fn route(self, prefix: &str, responses: Vec<Result<String, FetchError>>) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert(prefix.to_string(), responses.into());
            self
        }
    }

    #[async_trait]
    impl Transport for RoutedTransport {
        async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((Instant::now(), request.url.clone()));
            let mut routes = self.routes.lock().unwrap();
            routes
                .iter_mut()
                .find(|(prefix, _)| request.url.starts_with(prefix.as_str()))
                .and_then(|(_, queue)| queue.pop_front())
                .unwrap_or_else(|| Err(FetchError::Status { url: request.url.clone(), status: 404 }))
        }
    }

    fn resolver(transport: Arc<RoutedTransport>, pacing: Pacing) -> ProductResolver {
        let fetcher = ResilientFetcher::new(
            transport,
            FetchPolicy {
                user_agent: "test".to_string(),
                timeout: Duration::from_secs(15),
                max_retries: 0,
                retry_delay: Duration::from_millis(1000),
            },
        );
        ProductResolver::new(fetcher, &SelectorConfig::default(), ORIGIN, pacing).unwrap()
    }

    fn paced() -> Pacing {
        Pacing {
            before_product: Duration::from_millis(800),
            after_item: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_found_product_with_cross_refs() {
        let transport = Arc::new(
            RoutedTransport::default()
                .route("https://spareto.com/products?", vec![Ok(SEARCH_HIT.to_string())])
                .route("https://spareto.com/p/1", vec![Ok(PRODUCT.to_string())]),
        );
        let resolver = resolver(transport.clone(), paced());

        let result = resolver.resolve(&InputItem::new(" bosch ", "0001")).await;

        assert!(result.found);
        assert!(result.is_success());
        assert_eq!(result.brand, "BOSCH");
        assert_eq!(result.href.as_deref(), Some("https://spareto.com/p/1"));
        assert_eq!(
            result.cross_refs(),
            &[CrossRefGroup::new("ATE", vec!["111".to_string(), "222".to_string()])]
        );

        let calls = transport.calls.lock().unwrap();
        assert!(calls[0].1.contains("keywords=0001"));
        assert!(calls[0].1.contains("brand%5B%5D=BOSCH"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_delay_precedes_product_fetch() {
        let transport = Arc::new(
            RoutedTransport::default()
                .route("https://spareto.com/products?", vec![Ok(SEARCH_HIT.to_string())])
                .route("https://spareto.com/p/1", vec![Ok(PRODUCT.to_string())]),
        );
        let resolver = resolver(transport.clone(), paced());

        resolver.resolve(&InputItem::new("bosch", "0001")).await;

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].0 - calls[0].0 >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_miss_has_no_error() {
        let transport = Arc::new(
            RoutedTransport::default()
                .route("https://spareto.com/products?", vec![Ok(SEARCH_MISS.to_string())]),
        );
        let resolver = resolver(transport.clone(), paced());

        let result = resolver.resolve(&InputItem::new("bosch", "0001")).await;

        assert_eq!(result, ResolutionResult::not_found("BOSCH", "0001"));
        assert_eq!(transport.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_becomes_error_result() {
        let transport = Arc::new(RoutedTransport::default().route(
            "https://spareto.com/products?",
            vec![Err(FetchError::transport("https://spareto.com/products", "connection reset"))],
        ));
        let resolver = resolver(transport, paced());

        let result = resolver.resolve(&InputItem::new("bosch", "0001")).await;

        assert!(!result.found);
        assert!(result.error.as_deref().unwrap().contains("connection reset"));
        assert!(result.product_data.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_product_page_failure_is_degraded_not_fatal() {
        let transport = Arc::new(
            RoutedTransport::default()
                .route("https://spareto.com/products?", vec![Ok(SEARCH_HIT.to_string())])
                .route(
                    "https://spareto.com/p/1",
                    vec![Err(FetchError::Status { url: "https://spareto.com/p/1".to_string(), status: 503 })],
                ),
        );
        let resolver = resolver(transport, paced());

        let result = resolver.resolve(&InputItem::new("bosch", "0001")).await;

        assert!(result.found);
        assert!(result.error.is_none());
        assert!(!result.is_success());
        let page = result.product_data.unwrap();
        assert_eq!(page.error(), Some("HTTP 503 for https://spareto.com/p/1"));
        assert_eq!(page.url(), "https://spareto.com/p/1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_delay_applies_after_every_item() {
        let transport = Arc::new(
            RoutedTransport::default()
                .route("https://spareto.com/products?", vec![Ok(SEARCH_MISS.to_string())]),
        );
        let resolver = resolver(
            transport,
            Pacing {
                before_product: Duration::ZERO,
                after_item: Some(Duration::from_millis(800)),
            },
        );

        let started = Instant::now();
        resolver.resolve(&InputItem::new("bosch", "0001")).await;
        assert!(started.elapsed() >= Duration::from_millis(800));
    }
}
