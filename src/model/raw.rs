//! The raw, unparsed rows fetched from the expense sheet.

use crate::model::mapping::{Column, Mapping};
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every cell of every fetched worksheet, as text, with the worksheet title attached to each row.
///
/// Worksheets are concatenated in the order they were fetched. Their headers do not need to
/// match: `columns` is the union of all headers in first-seen order, and a row has no cell for a
/// column its worksheet lacks.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RawTable {
    columns: Vec<Column>,
    rows: Vec<RawRow>,
}

/// A single row of a worksheet.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RawRow {
    /// The title of the worksheet (tab) the row came from.
    worksheet: String,
    /// The 1-based row number in the worksheet. The header is row 1.
    row: usize,
    cells: BTreeMap<Column, String>,
}

impl RawTable {
    /// Parses the cell grid of one worksheet. The first row holds the headers.
    ///
    /// Rows shorter than the header row are padded with empty cells (the Sheets API leaves off
    /// trailing blanks). Rows with no non-blank cells are skipped. A row longer than the header
    /// row is an error.
    pub fn from_worksheet<S, R>(
        worksheet: impl Into<String>,
        sheet_data: impl IntoIterator<Item = R>,
    ) -> Result<Self>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
    {
        let worksheet = worksheet.into();
        let mut rows = sheet_data.into_iter();
        let mapping = match rows.next() {
            Some(header_row) => Mapping::new(header_row)
                .with_context(|| format!("Unable to read the headers of '{worksheet}'"))?,
            None => return Ok(Self::default()),
        };

        let len = mapping.len();
        let mut data = Vec::new();
        for (row_ix, row) in rows.enumerate() {
            let values: Vec<String> = row.into_iter().map(|s| s.into()).collect();
            let row_number = row_ix + 2;
            if values.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            if values.len() > len {
                bail!(
                    "A row longer than the headers list was encountered in '{worksheet}' \
                    at row {row_number}"
                );
            }
            let mut cells: BTreeMap<Column, String> = mapping
                .columns()
                .iter()
                .map(|c| (c.clone(), String::new()))
                .collect();
            for (column, value) in mapping.columns().iter().zip(values) {
                cells.insert(column.clone(), value);
            }
            data.push(RawRow {
                worksheet: worksheet.clone(),
                row: row_number,
                cells,
            });
        }

        Ok(Self {
            columns: mapping.columns().to_vec(),
            rows: data,
        })
    }

    /// Appends the rows of `other`, adding any columns not yet seen.
    pub fn append(&mut self, other: RawTable) {
        for column in other.columns {
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
    }

    /// Concatenates tables in order.
    pub fn concat(tables: impl IntoIterator<Item = RawTable>) -> Self {
        tables.into_iter().fold(Self::default(), |mut acc, t| {
            acc.append(t);
            acc
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.as_ref() == column)
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RawRow {
    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Whether the row's worksheet has `column`. A row only has cells for its own worksheet's
    /// headers.
    pub fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// The cell under `column`, or the empty string when the row's worksheet has no such column.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or_default()
    }

    pub fn cells(&self) -> &BTreeMap<Column, String> {
        &self.cells
    }
}
