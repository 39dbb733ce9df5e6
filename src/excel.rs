
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    hash::Hash,
};

use calamine::{Reader, open_workbook_auto, DataType};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExcelError {
    #[error("failed to open workbook {}: {message}", path.display())]
    Open { path: PathBuf, message: String },
    #[error("workbook {} has no worksheets", .0.display())]
    NoWorksheet(PathBuf),
    #[error("worksheet has no header row")]
    EmptySheet,
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}, column `{column}`: {message}")]
    Cell { row: usize, column: String, message: String },
}

/// Reads the first worksheet of a workbook as a table with a single header row
#[derive(Debug, Default)]
pub struct TableReader<H: HeaderColumn> {
    header: HashMap<H, usize>
}

impl<H: HeaderColumn> TableReader<H> {
    pub fn new() -> Self {
        Self {
            header: HashMap::new(),
        }
    }

    fn unmatched_columns(&self) -> Vec<String> {
        H::columns_to_match()
            .into_iter()
            .filter(|col| !self.header.contains_key(col))
            .map(|col| col.column_name().to_string())
            .collect()
    }

    pub fn parse_header(&mut self, row: &[DataType]) {
        self.header.clear();

        for (i, col) in row.iter().enumerate() {
            if let Some(key) = H::match_header_column(&cell_text(col)) {
                // first occurrence wins on duplicated headers
                self.header.entry(key).or_insert(i);
            }
        }
    }

    /// Parse data rows (everything below the header)
    ///
    /// Rows with every cell empty are skipped; `parse_row` may drop others.
    pub fn parse_rows<'a, I>(&mut self, mut rows: I) -> Result<Vec<H::Row>, ExcelError>
        where
            I: Iterator<Item = &'a [DataType]>
    {
        let header = rows.next().ok_or(ExcelError::EmptySheet)?;
        self.parse_header(header);

        let missing = self.unmatched_columns();
        if !missing.is_empty() {
            return Err(ExcelError::MissingColumns(missing));
        }

        let mut results = Vec::new();
        // 1-based like the row numbers Excel shows, header is row 1
        for (i, row) in rows.enumerate() {
            if row.iter().all(is_empty_cell) {
                continue;
            }

            if let Some(parsed) = H::parse_row(&self.header, row, i + 2)? {
                results.push(parsed);
            }
        }

        Ok(results)
    }

    pub fn read_file(&mut self, path: &Path) -> Result<Vec<H::Row>, ExcelError> {
        let mut wb = open_workbook_auto(path)
            .map_err(|e| ExcelError::Open { path: path.to_path_buf(), message: e.to_string() })?;

        let (name, rng) = wb
            .worksheets()
            .into_iter()
            .next()
            .ok_or_else(|| ExcelError::NoWorksheet(path.to_path_buf()))?;

        debug!("reading worksheet `{}` of {}", name, path.display());

        self.parse_rows(rng.rows())
    }
}

pub trait HeaderColumn: Sized + Copy + Eq + Hash {
    type Row;

    fn column_name(&self) -> &'static str;
    fn match_header_column(column_text: &str) -> Option<Self>;
    fn columns_to_match() -> Vec<Self>;
    /// Parse one data row; `Ok(None)` drops the row
    fn parse_row(header: &HashMap<Self, usize>, row: &[DataType], row_number: usize) -> Result<Option<Self::Row>, ExcelError>;
}

/// Cell rendered as trimmed text
///
/// Whole floats render without a fraction, so an EAN stored as a number
/// reads back as its digits.
pub fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.trim().to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e18 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

pub fn is_empty_cell(cell: &DataType) -> bool {
    match cell {
        DataType::Empty => true,
        DataType::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
