//! Infrastructure layer: configuration, logging, HTTP, HTML parsing,
//! input loading, spreadsheet output and progress fan-out.

pub mod config;
pub mod http_client;
pub mod input_loader;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod progress_broadcaster;
pub mod spreadsheet_writer;

pub use config::{CrawlerConfig, site};
pub use http_client::{
    FetchError, FetchPolicy, FetchRequest, ReqwestTransport, ResilientFetcher, Transport,
};
pub use input_loader::{InputError, load_input_file, parse_input};
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{
    CrossReferenceExtractor, ParsingError, ParsingResult, ProductDetailParser, SearchResultsParser,
};
pub use progress_broadcaster::{LoggingProgressSink, ProgressBroadcaster};
pub use spreadsheet_writer::{ExportError, SpreadsheetWriter, XlsxSpreadsheetWriter};
