//! Report flattening and export
//!
//! Every result becomes a row group: one row per cross-reference value,
//! or a single labelled row when the product was not found or lists no
//! analogs. Item brand/code appear on the first row of a group only
//! unless `repeat_item_labels` is set.

use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::domain::{ReportRow, ReportTable, ResolutionResult};
use crate::infrastructure::config::{CrawlerConfig, ReportConfig};
use crate::infrastructure::spreadsheet_writer::{ExportError, SpreadsheetWriter, XlsxSpreadsheetWriter};

pub struct ReportExporter {
    config: ReportConfig,
    writer: Arc<dyn SpreadsheetWriter>,
}

impl ReportExporter {
    pub fn new(config: ReportConfig, writer: Arc<dyn SpreadsheetWriter>) -> Self {
        Self { config, writer }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.report.clone(), Arc::new(XlsxSpreadsheetWriter))
    }

    /// Flatten results into rows, keeping the order of `results`.
    pub fn build_rows(&self, results: &[ResolutionResult]) -> Vec<ReportRow> {
        results
            .iter()
            .flat_map(|result| self.rows_for(result))
            .collect()
    }

    fn rows_for(&self, result: &ResolutionResult) -> Vec<ReportRow> {
        if !result.found {
            return vec![ReportRow::new(
                &result.brand,
                &result.code,
                &self.config.not_found_label,
                "",
            )];
        }

        let pairs: Vec<(&str, &str)> = result
            .cross_refs()
            .iter()
            .flat_map(|group| {
                group
                    .values
                    .iter()
                    .map(move |value| (group.brand.as_str(), value.as_str()))
            })
            .collect();

        if pairs.is_empty() {
            return vec![ReportRow::new(
                &result.brand,
                &result.code,
                &self.config.no_analogs_label,
                "",
            )];
        }

        pairs
            .into_iter()
            .enumerate()
            .map(|(index, (analog_brand, value))| {
                if index == 0 || self.config.repeat_item_labels {
                    ReportRow::new(&result.brand, &result.code, analog_brand, value)
                } else {
                    ReportRow::new("", "", analog_brand, value)
                }
            })
            .collect()
    }

    /// Widest cell per column (header included), clamped to the configured range.
    pub fn column_widths(&self, headers: &[String; 4], rows: &[ReportRow]) -> [usize; 4] {
        let mut widths = headers.clone().map(|header| header.chars().count());
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row.cells()) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths.map(|width| {
            width.clamp(self.config.min_column_width, self.config.max_column_width)
        })
    }

    pub fn build_table(&self, results: &[ResolutionResult]) -> ReportTable {
        let headers = self.config.headers.clone();
        let rows = self.build_rows(results);
        let column_widths = self.column_widths(&headers, &rows);

        ReportTable {
            sheet_name: self.config.sheet_name.clone(),
            headers,
            rows,
            column_widths,
        }
    }

    /// Write the report for `results` to `path` and return the path.
    pub fn export(&self, results: &[ResolutionResult], path: &Path) -> Result<PathBuf, ExportError> {
        let table = self.build_table(results);
        self.writer.write(&table, path)?;
        info!(
            "📄 Exported {} results ({} rows) to {:?}",
            results.len(),
            table.rows.len(),
            path
        );
        Ok(path.to_path_buf())
    }

    /// `<output_dir>/crossrefs-<YYYYMMDD-HHMMSS>.xlsx`
    pub fn default_report_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        self.config.output_dir.join(format!("crossrefs-{stamp}.xlsx"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CrossRefGroup, ProductPage};
    use rstest::rstest;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        written: Mutex<Vec<(ReportTable, PathBuf)>>,
    }

    impl SpreadsheetWriter for RecordingWriter {
        fn write(&self, table: &ReportTable, path: &Path) -> Result<(), ExportError> {
            self.written
                .lock()
                .unwrap()
                .push((table.clone(), path.to_path_buf()));
            Ok(())
        }
    }

    fn exporter(config: ReportConfig) -> ReportExporter {
        ReportExporter::new(config, Arc::new(RecordingWriter::default()))
    }

    fn found(groups: Vec<CrossRefGroup>) -> ResolutionResult {
        ResolutionResult::found(
            "BOSCH",
            "0001",
            "https://spareto.com/p/1",
            ProductPage::Parsed {
                title: "Brake pads".to_string(),
                price: String::new(),
                cross_refs: groups,
                url: "https://spareto.com/p/1".to_string(),
            },
        )
    }

    fn group(brand: &str, values: &[&str]) -> CrossRefGroup {
        CrossRefGroup::new(brand, values.iter().map(ToString::to_string).collect())
    }

    #[rstest]
    #[case::not_found(ResolutionResult::not_found("BOSCH", "0001"), 1)]
    #[case::search_failed(ResolutionResult::failed("BOSCH", "0001", "timeout"), 1)]
    #[case::no_groups(found(vec![]), 1)]
    #[case::groups_without_values(found(vec![group("ATE", &[])]), 1)]
    #[case::one_group_two_values(found(vec![group("X", &["A", "B"])]), 2)]
    #[case::two_groups(found(vec![group("X", &["A", "B"]), group("Y", &["C"])]), 3)]
    fn test_row_count_per_result(#[case] result: ResolutionResult, #[case] expected: usize) {
        let rows = exporter(ReportConfig::default()).build_rows(&[result]);
        assert_eq!(rows.len(), expected);
    }

    #[test]
    fn test_sentinel_rows() {
        let exporter = exporter(ReportConfig::default());
        let degraded = ResolutionResult::found(
            "BOSCH",
            "0002",
            "https://spareto.com/p/2",
            ProductPage::Failed {
                error: "HTTP 503".to_string(),
                url: "https://spareto.com/p/2".to_string(),
            },
        );

        let rows = exporter.build_rows(&[ResolutionResult::not_found("TRW", "GDB1"), degraded]);

        assert_eq!(
            rows,
            vec![
                ReportRow::new("TRW", "GDB1", "Page not found", ""),
                ReportRow::new("BOSCH", "0002", "No analogs found", ""),
            ]
        );
    }

    #[test]
    fn test_continuation_rows_are_blank() {
        let rows = exporter(ReportConfig::default())
            .build_rows(&[found(vec![group("X", &["A", "B"]), group("Y", &["C"])])]);

        assert_eq!(
            rows,
            vec![
                ReportRow::new("BOSCH", "0001", "X", "A"),
                ReportRow::new("", "", "X", "B"),
                ReportRow::new("", "", "Y", "C"),
            ]
        );
    }

    #[test]
    fn test_repeat_item_labels() {
        let config = ReportConfig {
            repeat_item_labels: true,
            ..ReportConfig::default()
        };
        let rows = exporter(config).build_rows(&[found(vec![group("X", &["A", "B"])])]);

        assert!(rows.iter().all(|row| row.brand == "BOSCH" && row.code == "0001"));
    }

    #[test]
    fn test_rows_follow_result_order() {
        let rows = exporter(ReportConfig::default()).build_rows(&[
            ResolutionResult::not_found("B", "2"),
            ResolutionResult::not_found("A", "1"),
        ]);
        assert_eq!(rows[0].brand, "B");
        assert_eq!(rows[1].brand, "A");
    }

    #[test]
    fn test_column_widths_are_clamped() {
        let exporter = exporter(ReportConfig::default());
        let long_value = "9".repeat(80);
        let table = exporter.build_table(&[
            found(vec![group("MANN-FILTER GMBH CO", &[long_value.as_str()])]),
        ]);

        // "Brand"/"Code" are short, "MANN-FILTER GMBH CO" is 19 chars
        assert_eq!(table.column_widths, [10, 10, 19, 60]);
    }

    #[test]
    fn test_column_width_counts_characters_not_bytes() {
        let exporter = exporter(ReportConfig::default());
        let table = exporter.build_table(&[ResolutionResult::not_found("ЖЖЖЖЖЖЖЖЖЖЖЖ", "1")]);
        assert_eq!(table.column_widths[0], 12);
    }

    #[test]
    fn test_export_hands_table_to_writer() {
        let writer = Arc::new(RecordingWriter::default());
        let exporter = ReportExporter::new(ReportConfig::default(), writer.clone());

        let path = exporter
            .export(&[found(vec![group("ATE", &["111"])])], Path::new("out/report.xlsx"))
            .unwrap();

        assert_eq!(path, PathBuf::from("out/report.xlsx"));
        let written = writer.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(
            written[0].0.to_cells(),
            vec![
                ["Brand", "Code", "Analogs", "Value"].map(ToString::to_string),
                ["BOSCH", "0001", "ATE", "111"].map(ToString::to_string),
            ]
        );
    }

    #[test]
    fn test_default_report_path() {
        let config = ReportConfig {
            output_dir: PathBuf::from("reports"),
            ..ReportConfig::default()
        };
        let path = exporter(config).default_report_path();

        assert!(path.starts_with("reports"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("crossrefs-"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(name.len(), "crossrefs-20240101-120000.xlsx".len());
    }
}
