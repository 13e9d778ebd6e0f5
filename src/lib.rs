//! Crossref Harvester - resolves (brand, part code) pairs on a parts
//! catalog and exports the cross-reference numbers it finds.
//!
//! The crate is layered the usual way:
//! - [`domain`]: plain value types, brand normalization, progress port
//! - [`infrastructure`]: config, logging, HTTP, HTML parsing, I/O adapters
//! - [`application`]: item resolution, batch pipeline, report export

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{CrawlingPipeline, PipelineReport, ProductResolver, ReportExporter};
pub use domain::{InputItem, ProgressSink, ProgressSnapshot, ResolutionResult};
pub use infrastructure::CrawlerConfig;
