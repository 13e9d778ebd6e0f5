//! Spreadsheet output
//!
//! The exporter hands over a finished [`ReportTable`]; writers only know
//! how to lay it out in a file format.

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::domain::ReportTable;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Failed to prepare output {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report has too many rows for one sheet: {0}")]
    TooManyRows(usize),
}

/// Writes a [`ReportTable`] to `path`.
pub trait SpreadsheetWriter: Send + Sync {
    fn write(&self, table: &ReportTable, path: &Path) -> Result<(), ExportError>;
}

/// `.xlsx` writer with a bold, frozen header row
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxSpreadsheetWriter;

impl XlsxSpreadsheetWriter {
    #[allow(clippy::cast_precision_loss)]
    fn build_workbook(table: &ReportTable) -> Result<Workbook, ExportError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(table.sheet_name.as_str())?;

        for (col, (header, width)) in (0u16..).zip(table.headers.iter().zip(table.column_widths)) {
            worksheet.write_string_with_format(0, col, header.as_str(), &header_format)?;
            worksheet.set_column_width(col, width as f64)?;
        }

        for (index, row) in table.rows.iter().enumerate() {
            let row_num =
                u32::try_from(index + 1).map_err(|_| ExportError::TooManyRows(table.rows.len()))?;
            for (col, cell) in (0u16..).zip(row.cells()) {
                worksheet.write_string(row_num, col, cell)?;
            }
        }
        worksheet.set_freeze_panes(1, 0)?;

        Ok(workbook)
    }
}

impl SpreadsheetWriter for XlsxSpreadsheetWriter {
    fn write(&self, table: &ReportTable, path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut workbook = Self::build_workbook(table)?;
        workbook.save(path)?;

        info!("Wrote {} report rows to {:?}", table.rows.len(), path);
        Ok(())
    }
}
