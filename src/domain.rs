//! Domain module - core value types of a cross-reference run
//!
//! Everything here is plain data plus the brand normalizer and the
//! progress port. No I/O happens in this layer.

pub mod brand;
pub mod events;
pub mod product;
pub mod report;

pub use brand::{normalize_brand, normalize_optional_brand};
pub use events::{ProgressSink, ProgressSnapshot};
pub use product::{CrossRefGroup, InputItem, ProductPage, ResolutionResult};
pub use report::{ReportRow, ReportTable};
