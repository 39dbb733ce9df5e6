
use tracing::{debug, warn};

use crate::api::{normalize_sap_number, parse_sap_quantity, DeliveryRecord};
use crate::sap::{GridColumns, GuiError, GuiGrid};

/// All spreadsheet lines of one EAN, in spreadsheet order
#[derive(Debug, Clone, PartialEq)]
pub struct EanGroup {
    pub ean: String,
    pub records: Vec<DeliveryRecord>,
}

impl EanGroup {
    /// More than one line (batch) for the same article
    pub fn is_repeated(&self) -> bool {
        self.records.len() > 1
    }

    pub fn total_quantity(&self) -> i64 {
        self.records.iter().fold(0i64, |total, r| total.saturating_add(r.quantity))
    }
}

/// Group lines by EAN, groups in order of first appearance
pub fn group_by_ean(records: &[DeliveryRecord]) -> Vec<EanGroup> {
    let mut groups: Vec<EanGroup> = Vec::new();

    for record in records {
        let ean = normalize_sap_number(&record.ean);

        match groups.iter_mut().find(|g| g.ean == ean) {
            Some(group) => group.records.push(record.clone()),
            None => groups.push(EanGroup { ean, records: vec![record.clone()] }),
        }
    }

    groups
}

/// EAN and pending quantity of one grid row
#[derive(Debug, Clone, PartialEq)]
pub(super) struct GridLine {
    pub ean: String,
    /// `None` for an empty pending cell (rows added for extra batches)
    pub pending: Option<i64>,
}

/// Read the EAN and pending columns of every grid row
pub(super) fn scan_grid<G: GuiGrid>(grid: &G, columns: &GridColumns) -> Result<Vec<GridLine>, GuiError> {
    let count = grid.row_count()?;
    let mut lines = Vec::with_capacity(count);

    for row in 0..count {
        let ean = normalize_sap_number(&grid.cell_value(row, &columns.ean)?);
        let pending_text = grid.cell_value(row, &columns.pending)?;

        let pending = match pending_text.trim() {
            "" => None,
            text => match parse_sap_quantity(text) {
                Some(qty) => Some(qty),
                None => {
                    warn!("row {}: pending quantity `{}` is not a number", row, text);
                    None
                }
            },
        };

        debug!("grid row {}: EAN {} pending {:?}", row, ean, pending);
        lines.push(GridLine { ean, pending });
    }

    Ok(lines)
}

/// Spreadsheet EANs that no grid row carries, each listed once
pub(super) fn missing_eans(groups: &[EanGroup], lines: &[GridLine]) -> Vec<String> {
    groups.iter()
        .filter(|g| !g.ean.is_empty() && g.ean != "0")
        .filter(|g| !lines.iter().any(|l| l.ean == g.ean))
        .map(|g| g.ean.clone())
        .collect()
}

/// Sum of the pending quantity over the grid rows of `ean`
pub(super) fn pending_for(ean: &str, lines: &[GridLine]) -> i64 {
    lines.iter()
        .filter(|l| l.ean == ean)
        .filter_map(|l| l.pending)
        .fold(0i64, i64::saturating_add)
}

pub(super) fn first_row(ean: &str, lines: &[GridLine]) -> Option<usize> {
    lines.iter().position(|l| l.ean == ean)
}
