
use std::collections::HashMap;
use std::path::Path;

use calamine::DataType;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::excel::{cell_text, is_empty_cell, ExcelError, HeaderColumn, TableReader};
use super::sap_number::parse_sap_quantity;

/// Date format of the expiry column in the SAP grid
pub const SAP_DATE_FORMAT: &str = "%d.%m.%Y";

/// Day first, as the warehouse exports them
const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];
/// Tried first on two digit years, `%Y` would read `27` as year 27
const SHORT_YEAR_FORMATS: [&str; 3] = ["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"];

static EMPTY_CELL: DataType = DataType::Empty;

/// One line of an inbound delivery spreadsheet
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord {
    /// Article barcode, matched against the grid's EAN column
    pub ean: String,
    /// Confirmed quantity (`Cant confirmada`)
    pub quantity: i64,
    /// Batch printed on the case (`Lote estuche`)
    pub batch: String,
    /// Expiry date (`Fecha Vencimiento`)
    pub expiry: NaiveDate,
    /// Remito followed by the delivery number (`Remito y Nro. Entrega`)
    pub receipt: String,
}

impl DeliveryRecord {
    pub fn expiry_sap(&self) -> String {
        self.expiry.format(SAP_DATE_FORMAT).to_string()
    }
}

/// Read all usable lines of a delivery spreadsheet
///
/// Lines without an expiry date are dropped.
pub fn read_delivery_file(path: &Path) -> Result<Vec<DeliveryRecord>, ExcelError> {
    TableReader::<DeliveryColumn>::new().read_file(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryColumn {
    Ean,
    ConfirmedQty,
    Batch,
    Expiry,
    Receipt,
}

impl HeaderColumn for DeliveryColumn {
    type Row = DeliveryRecord;

    fn column_name(&self) -> &'static str {
        match self {
            Self::Ean          => "EAN",
            Self::ConfirmedQty => "Cant confirmada",
            Self::Batch        => "Lote estuche",
            Self::Expiry       => "Fecha Vencimiento",
            Self::Receipt      => "Remito y Nro. Entrega",
        }
    }

    fn match_header_column(column_text: &str) -> Option<Self> {
        let text = column_text.trim();

        Self::columns_to_match()
            .into_iter()
            .find(|col| col.column_name().eq_ignore_ascii_case(text))
    }

    fn columns_to_match() -> Vec<Self> {
        vec![Self::Ean, Self::ConfirmedQty, Self::Batch, Self::Expiry, Self::Receipt]
    }

    fn parse_row(header: &HashMap<Self, usize>, row: &[DataType], row_number: usize) -> Result<Option<Self::Row>, ExcelError> {
        let cell = |col: Self| row.get(header[&col]).unwrap_or(&EMPTY_CELL);
        let err = |col: Self, message: String| ExcelError::Cell {
            row: row_number,
            column: col.column_name().into(),
            message,
        };

        let expiry = match parse_expiry(cell(Self::Expiry)) {
            Ok(Some(date)) => date,
            Ok(None) => return Ok(None),
            Err(e) => return Err(err(Self::Expiry, e)),
        };

        let ean = cell_text(cell(Self::Ean));
        if ean.is_empty() {
            return Err(err(Self::Ean, "empty EAN".into()));
        }

        let quantity = parse_quantity(cell(Self::ConfirmedQty))
            .map_err(|e| err(Self::ConfirmedQty, e))?;

        let batch = cell_text(cell(Self::Batch));
        if batch.is_empty() {
            return Err(err(Self::Batch, "empty batch".into()));
        }

        Ok(Some(DeliveryRecord {
            ean,
            quantity,
            batch,
            expiry,
            receipt: cell_text(cell(Self::Receipt)),
        }))
    }
}

fn parse_quantity(cell: &DataType) -> Result<i64, String> {
    match cell {
        DataType::Int(i) => Ok(*i),
        DataType::Float(f) => Ok(f.trunc() as i64),
        DataType::String(s) if !s.trim().is_empty() => parse_sap_quantity(s)
            .ok_or_else(|| format!("not a quantity <{}>", s)),
        _ => Err("empty quantity".into()),
    }
}

/// `Ok(None)` for empty cells
pub fn parse_expiry(cell: &DataType) -> Result<Option<NaiveDate>, String> {
    if is_empty_cell(cell) {
        return Ok(None);
    }

    match cell {
        DataType::DateTime(serial) | DataType::Float(serial) => from_excel_serial(*serial)
            .map(Some)
            .ok_or_else(|| format!("date serial out of range <{}>", serial)),
        DataType::Int(serial) => from_excel_serial(*serial as f64)
            .map(Some)
            .ok_or_else(|| format!("date serial out of range <{}>", serial)),
        DataType::String(s) => parse_date_text(s.trim())
            .map(Some)
            .ok_or_else(|| format!("unrecognized date <{}>", s)),
        other => Err(format!("unexpected cell <{}>", other)),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let short_year = text
        .rsplit(|c: char| matches!(c, '/' | '-' | '.'))
        .next()
        .map_or(false, |year| year.len() == 2 && year.chars().all(|c| c.is_ascii_digit()));

    let short: &[&str] = if short_year { &SHORT_YEAR_FORMATS } else { &[] };

    short
        .iter()
        .chain(DATE_FORMATS.iter())
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .filter(|date| date.year() >= 1900)
}

/// Excel's 1900 date system, day 0 being 1899-12-30
fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }

    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .checked_add_signed(Duration::days(serial.trunc() as i64))
}
