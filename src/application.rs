//! Application layer
//!
//! Use cases built on the domain types and infrastructure adapters:
//! resolving single items, running a whole batch and exporting the report.

pub mod crawling_pipeline;
pub mod product_resolver;
pub mod report_exporter;

pub use crawling_pipeline::{CrawlingPipeline, PipelineReport, PipelineStats};
pub use product_resolver::{ItemResolver, Pacing, ProductResolver, ResolveError};
pub use report_exporter::ReportExporter;
