
//! In-memory SAP session for tests

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::{GuiError, GuiGrid, GuiSession, ScreenIds};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetText(String, String),
    Caret(String, usize),
    Focus(String),
    Press(String),
    VKey(String, u32),
    ModifyCell(usize, String, String),
    CurrentCell(usize, String),
    SelectRows(String),
    GridEnter,
}

pub type Row = HashMap<String, String>;

struct State {
    rows: Vec<Row>,
    actions: Vec<Action>,
    selected: Option<usize>,
    missing: HashSet<String>,
    add_row_button: String,
    add_row_works: bool,
}

#[derive(Clone)]
pub struct FakeSession {
    state: Rc<RefCell<State>>,
}

pub struct FakeGrid {
    state: Rc<RefCell<State>>,
}

/// Grid row with the default EAN and pending quantity columns
pub fn grid_row(ean: &str, pending: &str) -> Row {
    let cols = ScreenIds::default().columns;

    HashMap::from([
        (cols.ean, ean.to_string()),
        (cols.pending, pending.to_string()),
    ])
}

impl FakeSession {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                rows,
                actions: Vec::new(),
                selected: None,
                missing: HashSet::new(),
                add_row_button: ScreenIds::default().add_row_button,
                add_row_works: true,
            })),
        }
    }

    /// Grid from `(ean, pending quantity)` pairs
    pub fn with_grid(rows: &[(&str, &str)]) -> Self {
        Self::new(rows.iter().map(|(ean, pending)| grid_row(ean, pending)).collect())
    }

    /// Make every call on `id` fail as if the element did not exist
    pub fn without(self, id: &str) -> Self {
        self.state.borrow_mut().missing.insert(id.into());
        self
    }

    /// Pressing the add row button leaves the grid unchanged
    pub fn broken_add_row(self) -> Self {
        self.state.borrow_mut().add_row_works = false;
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.borrow().actions.clone()
    }

    pub fn rows(&self) -> Vec<Row> {
        self.state.borrow().rows.clone()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<String> {
        self.state.borrow().rows.get(row)?.get(column).cloned()
    }

    fn record(&self, id: &str, action: Action) -> Result<(), GuiError> {
        let mut state = self.state.borrow_mut();

        if state.missing.contains(id) {
            return Err(GuiError::element(id, "The control could not be found by id."));
        }

        state.actions.push(action);
        Ok(())
    }
}

impl GuiSession for FakeSession {
    type Grid = FakeGrid;

    fn set_text(&self, id: &str, text: &str) -> Result<(), GuiError> {
        self.record(id, Action::SetText(id.into(), text.into()))
    }

    fn set_caret_position(&self, id: &str, position: usize) -> Result<(), GuiError> {
        self.record(id, Action::Caret(id.into(), position))
    }

    fn set_focus(&self, id: &str) -> Result<(), GuiError> {
        self.record(id, Action::Focus(id.into()))
    }

    fn press(&self, id: &str) -> Result<(), GuiError> {
        self.record(id, Action::Press(id.into()))?;

        let mut state = self.state.borrow_mut();
        if id == state.add_row_button && state.add_row_works {
            if let Some(anchor) = state.selected {
                let ean_col = ScreenIds::default().columns.ean;
                let mut split = Row::new();
                if let Some(ean) = state.rows.get(anchor).and_then(|r| r.get(&ean_col)).cloned() {
                    split.insert(ean_col, ean);
                }
                state.rows.insert(anchor + 1, split);
            }
        }

        Ok(())
    }

    fn send_vkey(&self, id: &str, key: u32) -> Result<(), GuiError> {
        self.record(id, Action::VKey(id.into(), key))
    }

    fn find_grid(&self, id: &str) -> Result<Self::Grid, GuiError> {
        if self.state.borrow().missing.contains(id) {
            return Err(GuiError::element(id, "The control could not be found by id."));
        }

        Ok(FakeGrid { state: Rc::clone(&self.state) })
    }
}

impl GuiGrid for FakeGrid {
    fn row_count(&self) -> Result<usize, GuiError> {
        Ok(self.state.borrow().rows.len())
    }

    fn cell_value(&self, row: usize, column: &str) -> Result<String, GuiError> {
        let state = self.state.borrow();

        match state.rows.get(row) {
            Some(r) => Ok(r.get(column).cloned().unwrap_or_default()),
            None => Err(GuiError::Cell { row, column: column.into(), message: "row out of range".into() }),
        }
    }

    fn modify_cell(&self, row: usize, column: &str, value: &str) -> Result<(), GuiError> {
        let mut state = self.state.borrow_mut();

        match state.rows.get_mut(row) {
            Some(r) => {
                r.insert(column.into(), value.into());
            },
            None => return Err(GuiError::Cell { row, column: column.into(), message: "row out of range".into() }),
        }

        state.actions.push(Action::ModifyCell(row, column.into(), value.into()));
        Ok(())
    }

    fn set_current_cell(&self, row: usize, column: &str) -> Result<(), GuiError> {
        self.state.borrow_mut().actions.push(Action::CurrentCell(row, column.into()));
        Ok(())
    }

    fn set_selected_rows(&self, rows: &str) -> Result<(), GuiError> {
        let mut state = self.state.borrow_mut();
        state.selected = rows.split(',').next().and_then(|r| r.trim().parse().ok());
        state.actions.push(Action::SelectRows(rows.into()));
        Ok(())
    }

    fn press_enter(&self) -> Result<(), GuiError> {
        self.state.borrow_mut().actions.push(Action::GridEnter);
        Ok(())
    }
}
