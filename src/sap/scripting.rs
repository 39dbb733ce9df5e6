
//! From the `SAPGUI` running object to a usable session
//!
//! VBScript hides the member kinds: `GetScriptingEngine` and
//! `OpenConnection` are methods, `Children` is a property holding a
//! collection and `Children(0)` is really `Children.ElementAt(0)`.

use super::GuiError;

/// Argument of a late bound call
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    Str(String),
    Int(i32),
    Bool(bool),
}

/// Object of the SAP GUI Scripting API, reached by late binding
pub trait ScriptingObject: Sized {
    /// Property holding another object, e.g. `connection.Children`
    fn child(&self, name: &str) -> Result<Self, String>;
    /// Method returning another object, e.g. `engine.OpenConnection(...)`
    fn call_child(&self, name: &str, args: &[ScriptArg]) -> Result<Self, String>;
}

/// Open `connection` and return its session number `index`
pub fn connect_session<O: ScriptingObject>(sapgui: &O, connection: &str, index: i32) -> Result<O, GuiError> {
    let engine = sapgui
        .call_child("GetScriptingEngine", &[])
        .map_err(GuiError::Unavailable)?;

    let connection_obj = engine
        .call_child("OpenConnection", &[ScriptArg::Str(connection.into()), ScriptArg::Bool(true)])
        .map_err(|e| GuiError::element(connection, e))?;

    let sessions = connection_obj
        .child("Children")
        .map_err(|e| GuiError::element("Children", e))?;

    sessions
        .call_child("ElementAt", &[ScriptArg::Int(index)])
        .map_err(|e| GuiError::element("ElementAt", e))
}
