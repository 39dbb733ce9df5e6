
//! Stand-in for platforms without SAP GUI

use crate::config::Config;
use super::{GuiError, GuiGrid, GuiSession};

/// Never constructed, SAP GUI Scripting only exists on Windows
pub enum Unsupported {}

pub fn open_session(_config: &Config) -> Result<Unsupported, GuiError> {
    Err(GuiError::Unavailable("SAP GUI Scripting requires Windows".into()))
}

impl GuiSession for Unsupported {
    type Grid = Unsupported;

    fn set_text(&self, _id: &str, _text: &str) -> Result<(), GuiError> {
        match *self {}
    }

    fn set_caret_position(&self, _id: &str, _position: usize) -> Result<(), GuiError> {
        match *self {}
    }

    fn set_focus(&self, _id: &str) -> Result<(), GuiError> {
        match *self {}
    }

    fn press(&self, _id: &str) -> Result<(), GuiError> {
        match *self {}
    }

    fn send_vkey(&self, _id: &str, _key: u32) -> Result<(), GuiError> {
        match *self {}
    }

    fn find_grid(&self, _id: &str) -> Result<Self::Grid, GuiError> {
        match *self {}
    }
}

impl GuiGrid for Unsupported {
    fn row_count(&self) -> Result<usize, GuiError> {
        match *self {}
    }

    fn cell_value(&self, _row: usize, _column: &str) -> Result<String, GuiError> {
        match *self {}
    }

    fn modify_cell(&self, _row: usize, _column: &str, _value: &str) -> Result<(), GuiError> {
        match *self {}
    }

    fn set_current_cell(&self, _row: usize, _column: &str) -> Result<(), GuiError> {
        match *self {}
    }

    fn set_selected_rows(&self, _rows: &str) -> Result<(), GuiError> {
        match *self {}
    }

    fn press_enter(&self) -> Result<(), GuiError> {
        match *self {}
    }
}
