
//! Loads one inbound delivery into the `ZMM_RECEP_DOCU` grid
//!
//! Every spreadsheet line is matched to a grid row by EAN. The first line
//! of an EAN goes into the first grid row carrying it, further lines
//! (other batches) go into rows added right below it.

mod grid;

use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{DeliveryRecord, PurchaseOrder, Remito, RemitoError};
use crate::config::Pacing;
use crate::excel::ExcelError;
use crate::sap::{GuiError, GuiGrid, GuiSession, ScreenIds, VKEY_ENTER};

pub use grid::{group_by_ean, EanGroup};
use grid::{first_row, missing_eans, pending_for, scan_grid};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no valid rows in the spreadsheet")]
    NoValidRows,
    #[error(transparent)]
    Remito(#[from] RemitoError),
    #[error("EANs missing in SAP: {0:?}")]
    MissingEans(Vec<String>),
    #[error("EAN {ean}: spreadsheet quantity ({excel}) exceeds SAP pending quantity ({pending})")]
    QuantityExceeded { ean: String, excel: i64, pending: i64 },
    #[error("EAN {0} not found in the SAP grid")]
    EanNotFound(String),
    #[error("EAN {ean}: adding a row below row {anchor} did not change the grid")]
    AddRowFailed { ean: String, anchor: usize },
    #[error("no grid rows were written")]
    NothingProcessed,
    #[error(transparent)]
    Excel(#[from] ExcelError),
    #[error(transparent)]
    Gui(#[from] GuiError),
}

impl DeliveryError {
    /// EANs that get an incident file of their own
    pub fn missing(&self) -> &[String] {
        match self {
            Self::MissingEans(eans) => eans,
            _ => &[],
        }
    }

    /// A repeated EAN that could not be loaded, with the reason
    pub fn repeated_ean(&self) -> Option<&str> {
        match self {
            Self::QuantityExceeded { ean, .. } => Some(ean),
            Self::AddRowFailed { ean, .. } => Some(ean),
            _ => None,
        }
    }
}

/// What was loaded for a delivery
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOutcome {
    /// Print cover title and label file name, `R{pos}{number}`
    pub document_ref: String,
    pub rows_written: usize,
    pub groups: Vec<EanGroup>,
}

pub struct Reconciler<'a, S: GuiSession> {
    session: &'a S,
    screen: &'a ScreenIds,
    pacing: &'a Pacing,
}

impl<'a, S: GuiSession> Reconciler<'a, S> {
    pub fn new(session: &'a S, screen: &'a ScreenIds, pacing: &'a Pacing) -> Self {
        Self { session, screen, pacing }
    }

    /// Load `records` into the grid of `po` and print the delivery label
    ///
    /// Rows written before an error stay written in the session.
    pub fn load_delivery(&self, po: &PurchaseOrder, records: &[DeliveryRecord]) -> Result<DeliveryOutcome, DeliveryError> {
        let first = records.first().ok_or(DeliveryError::NoValidRows)?;
        let remito = Remito::parse(&first.receipt)?;
        info!("OC {}: {} line(s), remito {}", po, records.len(), remito);

        self.open_order(po)?;

        let grid = self.session.find_grid(&self.screen.grid)?;
        let groups = group_by_ean(records);

        let lines = scan_grid(&grid, &self.screen.columns)?;
        let missing = missing_eans(&groups, &lines);
        if !missing.is_empty() {
            return Err(DeliveryError::MissingEans(missing));
        }

        let mut rows_written = 0;
        for group in &groups {
            rows_written += self.load_group(&grid, group)?;
        }

        if rows_written == 0 {
            return Err(DeliveryError::NothingProcessed);
        }

        grid.press_enter()?;
        self.pause(self.pacing.step_delay());
        info!("OC {}: {} grid row(s) written", po, rows_written);

        let document_ref = remito.document_ref();
        self.fill_header(&remito, &document_ref)?;

        Ok(DeliveryOutcome { document_ref, rows_written, groups })
    }

    /// Run the transaction for `po` and switch the grid to edit mode
    fn open_order(&self, po: &PurchaseOrder) -> Result<(), GuiError> {
        let screen = self.screen;

        self.session.set_text(&screen.command_field, &screen.transaction)?;
        self.session.send_vkey(&screen.main_window, VKEY_ENTER)?;
        self.pause(self.pacing.step_delay());

        self.session.set_text(&screen.po_filter, po.as_str())?;
        self.session.set_caret_position(&screen.po_filter, po.as_str().len())?;
        self.pause(self.pacing.field_delay());

        self.session.press(&screen.execute_button)?;
        self.pause(self.pacing.step_delay());
        self.session.press(&screen.edit_button)?;
        self.pause(self.pacing.step_delay());

        debug!("transaction {} open for OC {}", screen.transaction, po);
        Ok(())
    }

    fn load_group(&self, grid: &S::Grid, group: &EanGroup) -> Result<usize, DeliveryError> {
        // rows shift after every insert, so look again for each EAN
        let lines = scan_grid(grid, &self.screen.columns)?;

        let excel = group.total_quantity();
        let pending = pending_for(&group.ean, &lines);
        if excel > pending {
            return Err(DeliveryError::QuantityExceeded { ean: group.ean.clone(), excel, pending });
        }

        let anchor = first_row(&group.ean, &lines)
            .ok_or_else(|| DeliveryError::EanNotFound(group.ean.clone()))?;

        let mut records = group.records.iter();
        let mut written = 0;

        if let Some(record) = records.next() {
            self.write_row(grid, anchor, record)?;
            written += 1;
        }

        for record in records {
            let row = self.add_row_below(grid, anchor, &group.ean)?;
            self.write_row(grid, row, record)?;
            written += 1;
        }

        if group.is_repeated() {
            info!("EAN {}: {} batches, total {}", group.ean, group.records.len(), excel);
        }

        Ok(written)
    }

    /// Insert an empty row right below `anchor`, returns its index
    fn add_row_below(&self, grid: &S::Grid, anchor: usize, ean: &str) -> Result<usize, DeliveryError> {
        let before = grid.row_count()?;

        grid.set_current_cell(anchor, "")?;
        grid.set_selected_rows(&anchor.to_string())?;
        self.session.press(&self.screen.add_row_button)?;
        self.pause(self.pacing.add_row_delay());

        let after = grid.row_count()?;
        if after <= before {
            return Err(DeliveryError::AddRowFailed { ean: ean.into(), anchor });
        }

        debug!("EAN {}: row added below {} ({} -> {} rows)", ean, anchor, before, after);
        Ok(anchor + 1)
    }

    fn write_row(&self, grid: &S::Grid, row: usize, record: &DeliveryRecord) -> Result<(), GuiError> {
        let columns = &self.screen.columns;
        let expiry = record.expiry_sap();

        for (column, value) in [
            (&columns.quantity, record.quantity.to_string()),
            (&columns.batch, record.batch.clone()),
            (&columns.expiry, expiry),
        ] {
            grid.modify_cell(row, column, &value)?;
            self.pause(self.pacing.field_delay());
        }

        debug!("row {}: EAN {} qty {} batch {}", row, record.ean, record.quantity, record.batch);
        Ok(())
    }

    /// Delivery header popup: remito, package counts, generate and print
    fn fill_header(&self, remito: &Remito, document_ref: &str) -> Result<(), GuiError> {
        let screen = self.screen;

        self.session.press(&screen.header_button)?;
        self.pause(self.pacing.step_delay());

        self.session.set_text(&screen.remito1_field, &remito.point_of_sale)?;
        self.pause(self.pacing.field_delay());
        self.session.set_text(&screen.remito2_field, &remito.number)?;
        self.pause(self.pacing.field_delay());

        for field in [&screen.cold_packages_field, &screen.dry_packages_field] {
            match self.session.set_text(field, "1") {
                Ok(()) => self.pause(self.pacing.field_delay()),
                Err(e) => warn!("package count not set: {}", e),
            }
        }

        self.session.set_focus(&screen.invoice_field)?;
        self.session.set_caret_position(&screen.invoice_field, 0)?;

        self.session.press(&screen.generate_button)?;
        self.pause(self.pacing.step_delay());
        self.session.press(&screen.confirm_button)?;
        self.pause(self.pacing.step_delay());

        self.session.set_text(&screen.cover_title_field, document_ref)?;
        self.session.press(&screen.print_button)?;
        self.pause(self.pacing.step_delay());

        info!("delivery {} generated and sent to print", document_ref);
        Ok(())
    }

    fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
