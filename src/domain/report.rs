//! Flattened report rows

use serde::{Deserialize, Serialize};

/// One rendered line of the cross-reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub brand: String,
    pub code: String,
    pub analog_brand: String,
    pub analog_value: String,
}

impl ReportRow {
    pub fn new(
        brand: impl Into<String>,
        code: impl Into<String>,
        analog_brand: impl Into<String>,
        analog_value: impl Into<String>,
    ) -> Self {
        Self {
            brand: brand.into(),
            code: code.into(),
            analog_brand: analog_brand.into(),
            analog_value: analog_value.into(),
        }
    }

    /// Cells in column order.
    pub fn cells(&self) -> [&str; 4] {
        [
            &self.brand,
            &self.code,
            &self.analog_brand,
            &self.analog_value,
        ]
    }
}

/// Rectangular table ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTable {
    pub sheet_name: String,
    pub headers: [String; 4],
    pub rows: Vec<ReportRow>,
    /// Width of each column in character units
    pub column_widths: [usize; 4],
}

impl ReportTable {
    /// Header followed by every row, as plain cells.
    pub fn to_cells(&self) -> Vec<[String; 4]> {
        std::iter::once(self.headers.clone())
            .chain(
                self.rows
                    .iter()
                    .map(|row| row.cells().map(ToString::to_string)),
            )
            .collect()
    }
}
