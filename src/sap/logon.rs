
use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use super::{GuiError, GuiSession, ScreenIds, VKEY_ENTER};

/// Call `attempt` until it succeeds, at most `max_retries` times
///
/// Sleeps `interval` after every failed attempt. Returns the last error.
pub fn wait_for<T, E, F>(what: &str, max_retries: u32, interval: Duration, mut attempt: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>
{
    let mut i = 1;
    loop {
        match attempt(i) {
            Ok(value) => {
                info!("{} available after {} attempt(s)", what, i);
                return Ok(value);
            },
            Err(e) if i >= max_retries => {
                error!("{} not available after {} attempts: {}", what, i, e);
                return Err(e);
            },
            Err(e) => {
                info!("waiting for {}, attempt {}/{}: {}", what, i, max_retries, e);
                thread::sleep(interval);
                i += 1;
            }
        }
    }
}

/// Submit the SAP logon screen
pub fn login<S: GuiSession>(session: &S, screen: &ScreenIds, user: &str, password: &str) -> Result<(), GuiError> {
    session.set_text(&screen.user_field, user)?;
    session.set_text(&screen.password_field, password)?;
    session.send_vkey(&screen.main_window, VKEY_ENTER)?;

    info!("logged into SAP as {}", user);
    Ok(())
}

/// Log off with `/nex`, closing the connection
pub fn close<S: GuiSession>(session: &S, screen: &ScreenIds) -> Result<(), GuiError> {
    session.set_text(&screen.command_field, "/nex")?;

    match session.send_vkey(&screen.main_window, VKEY_ENTER) {
        Ok(()) => {
            info!("SAP session closed");
            Ok(())
        },
        Err(e) => {
            warn!("failed to close SAP session: {}", e);
            Err(e)
        }
    }
}
