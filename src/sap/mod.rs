
//! SAP GUI Scripting
//!
//! The scripting object model is reached through two traits so the
//! delivery workflow does not depend on COM. [`com`] implements them
//! against a running SAP Logon on Windows.

use thiserror::Error;

mod logon;
mod screen;
mod scripting;

#[cfg(windows)]
pub mod com;

#[cfg(not(windows))]
mod unsupported;

#[cfg(test)]
pub(crate) mod fake;

pub use logon::{close, login, wait_for};
pub use screen::{GridColumns, ScreenIds};
pub use scripting::{connect_session, ScriptArg, ScriptingObject};

#[cfg(windows)]
pub use com::{open_session, ComSession as Session};

#[cfg(not(windows))]
pub use unsupported::{open_session, Unsupported as Session};

/// Virtual key code of Enter for `sendVKey`
pub const VKEY_ENTER: u32 = 0;

#[derive(Debug, Error)]
pub enum GuiError {
    #[error("SAP GUI scripting is not available: {0}")]
    Unavailable(String),
    #[error("element `{id}`: {message}")]
    Element { id: String, message: String },
    #[error("grid cell ({row}, {column}): {message}")]
    Cell { row: usize, column: String, message: String },
}

impl GuiError {
    pub fn element(id: &str, message: impl ToString) -> Self {
        Self::Element { id: id.into(), message: message.to_string() }
    }
}

/// A logged in SAP GUI session (`GuiSession`)
///
/// Elements are addressed by their scripting id, e.g. `wnd[0]/tbar[0]/okcd`.
pub trait GuiSession {
    type Grid: GuiGrid;

    fn set_text(&self, id: &str, text: &str) -> Result<(), GuiError>;
    fn set_caret_position(&self, id: &str, position: usize) -> Result<(), GuiError>;
    fn set_focus(&self, id: &str) -> Result<(), GuiError>;
    fn press(&self, id: &str) -> Result<(), GuiError>;
    fn send_vkey(&self, id: &str, key: u32) -> Result<(), GuiError>;
    fn find_grid(&self, id: &str) -> Result<Self::Grid, GuiError>;
}

/// ALV grid control (`GuiGridView`)
pub trait GuiGrid {
    fn row_count(&self) -> Result<usize, GuiError>;
    fn cell_value(&self, row: usize, column: &str) -> Result<String, GuiError>;
    fn modify_cell(&self, row: usize, column: &str, value: &str) -> Result<(), GuiError>;
    fn set_current_cell(&self, row: usize, column: &str) -> Result<(), GuiError>;
    fn set_selected_rows(&self, rows: &str) -> Result<(), GuiError>;
    fn press_enter(&self) -> Result<(), GuiError>;
}
