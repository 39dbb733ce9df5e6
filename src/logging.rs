
//! Logging setup
//!
//! `RUST_LOG` selects the level (default `info`), e.g.
//! `RUST_LOG=sap_inbound=debug`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Daily log file name, `sap_processor_{yyyymmdd}.log`
pub fn log_file_name(day: chrono::NaiveDate) -> String {
    format!("sap_processor_{}.log", day.format("%Y%m%d"))
}

/// Log to stdout, and to today's file in `log_dir` if given
///
/// Returns the log file path.
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(false);

    let Some(dir) = log_dir else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;

        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log folder {}", dir.display()))?;

    let path = dir.join(log_file_name(chrono::Local::now().date_naive()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    builder
        .with_ansi(false)
        .with_writer(std::io::stdout.and(Mutex::new(file)))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;

    Ok(Some(path))
}
