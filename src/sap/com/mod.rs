
//! SAP GUI Scripting over COM
//!
//! Requires scripting to be enabled on both the server
//! (`sapgui/user_scripting`) and the SAP GUI client.

mod dispatch;

use std::process::Command;

use tracing::{info, warn};
use windows::Win32::System::Com::{CoInitializeEx, COINIT_APARTMENTTHREADED};

use crate::config::Config;
use super::{connect_session, login, wait_for, GuiError, GuiGrid, GuiSession};
use dispatch::{variant_get_i32, variant_get_string, variant_i32, variant_str, DispatchObject};

/// Running object table name of SAP Logon
const SAPGUI_MONIKER: &str = "SAPGUI";

/// Launch SAP Logon, open the configured connection and log in
pub fn open_session(config: &Config) -> Result<ComSession, GuiError> {
    unsafe {
        // S_FALSE when COM was already initialized on this thread
        if let Err(e) = CoInitializeEx(None, COINIT_APARTMENTTHREADED).ok() {
            warn!("CoInitializeEx: {}", e.message());
        }
    }

    info!("launching SAP Logon: {}", config.sap.logon_path.display());
    Command::new(&config.sap.logon_path)
        .spawn()
        .map_err(|e| GuiError::Unavailable(format!("failed to start {}: {}", config.sap.logon_path.display(), e)))?;

    let sapgui = wait_for(
        "SAP GUI scripting",
        config.sap.max_retries,
        config.sap.retry_interval(),
        |_| DispatchObject::from_moniker(SAPGUI_MONIKER),
    )
    .map_err(GuiError::Unavailable)?;

    let connection_name = config.environment.connection_name();
    info!("opening connection `{}`", connection_name);

    let session = connect_session(&sapgui, connection_name, config.sap.session_index as i32)?;

    let session = ComSession { session };
    login(&session, &config.screen, &config.credentials.user, &config.credentials.password)?;
    std::thread::sleep(config.pacing.field_delay());

    Ok(session)
}

pub struct ComSession {
    session: DispatchObject,
}

impl ComSession {
    fn find(&self, id: &str) -> Result<DispatchObject, GuiError> {
        self.session
            .invoke_child("findById", &[variant_str(id)])
            .map_err(|e| GuiError::element(id, e))
    }
}

impl GuiSession for ComSession {
    type Grid = ComGrid;

    fn set_text(&self, id: &str, text: &str) -> Result<(), GuiError> {
        self.find(id)?
            .set_property("text", variant_str(text))
            .map_err(|e| GuiError::element(id, e))
    }

    fn set_caret_position(&self, id: &str, position: usize) -> Result<(), GuiError> {
        self.find(id)?
            .set_property("caretPosition", variant_i32(position as i32))
            .map_err(|e| GuiError::element(id, e))
    }

    fn set_focus(&self, id: &str) -> Result<(), GuiError> {
        self.find(id)?
            .invoke_method("setFocus", &[])
            .map(|_| ())
            .map_err(|e| GuiError::element(id, e))
    }

    fn press(&self, id: &str) -> Result<(), GuiError> {
        self.find(id)?
            .invoke_method("press", &[])
            .map(|_| ())
            .map_err(|e| GuiError::element(id, e))
    }

    fn send_vkey(&self, id: &str, key: u32) -> Result<(), GuiError> {
        self.find(id)?
            .invoke_method("sendVKey", &[variant_i32(key as i32)])
            .map(|_| ())
            .map_err(|e| GuiError::element(id, e))
    }

    fn find_grid(&self, id: &str) -> Result<Self::Grid, GuiError> {
        Ok(ComGrid { id: id.into(), grid: self.find(id)? })
    }
}

pub struct ComGrid {
    id: String,
    grid: DispatchObject,
}

impl ComGrid {
    fn cell_err(row: usize, column: &str, message: String) -> GuiError {
        GuiError::Cell { row, column: column.into(), message }
    }
}

impl GuiGrid for ComGrid {
    fn row_count(&self) -> Result<usize, GuiError> {
        let count = self.grid
            .get_property("RowCount")
            .map_err(|e| GuiError::element(&self.id, e))?;

        variant_get_i32(&count)
            .map(|n| n.max(0) as usize)
            .ok_or_else(|| GuiError::element(&self.id, "RowCount is not a number"))
    }

    fn cell_value(&self, row: usize, column: &str) -> Result<String, GuiError> {
        let value = self.grid
            .invoke_method("getCellValue", &[variant_i32(row as i32), variant_str(column)])
            .map_err(|e| Self::cell_err(row, column, e))?;

        Ok(variant_get_string(&value).unwrap_or_default())
    }

    fn modify_cell(&self, row: usize, column: &str, value: &str) -> Result<(), GuiError> {
        self.grid
            .invoke_method("modifyCell", &[variant_i32(row as i32), variant_str(column), variant_str(value)])
            .map(|_| ())
            .map_err(|e| Self::cell_err(row, column, e))
    }

    fn set_current_cell(&self, row: usize, column: &str) -> Result<(), GuiError> {
        self.grid
            .invoke_method("setCurrentCell", &[variant_i32(row as i32), variant_str(column)])
            .map(|_| ())
            .map_err(|e| Self::cell_err(row, column, e))
    }

    fn set_selected_rows(&self, rows: &str) -> Result<(), GuiError> {
        self.grid
            .set_property("selectedRows", variant_str(rows))
            .map_err(|e| GuiError::element(&self.id, e))
    }

    fn press_enter(&self) -> Result<(), GuiError> {
        self.grid
            .invoke_method("pressEnter", &[])
            .map(|_| ())
            .map_err(|e| GuiError::element(&self.id, e))
    }
}
