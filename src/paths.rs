
//! Folder layout of the delivery queues

use chrono::NaiveDateTime;
use regex::Regex;
use std::io::Error;
use std::path::{Path, PathBuf};

lazy_static! {
    /// Delivery spreadsheet file pattern
    pub static ref DELIVERY_FILE_NAME: Regex = Regex::new(r"(?i)^[^~].*\.xlsx?$").expect("failed to build regex");
}

/// Pending spreadsheets
pub const PENDING_DIR: &str = "no_procesados";
/// Incident reports
pub const ERRORS_DIR: &str = "Errores";
/// Spreadsheets that failed, inside [`ERRORS_DIR`]
pub const UNPROCESSED_DIR: &str = "No_Procesados";
/// Spreadsheets loaded into SAP
pub const PROCESSED_DIR: &str = "Procesados";
/// Repeated EAN summaries
pub const SUMMARIES_DIR: &str = "Resumenes";
pub const LOGS_DIR: &str = "Logs";

/// Timestamp used in every generated file name
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Create a filename with a naturally sortable timestamp
///
/// returns a formatted string `{prefix}_{year}{month}{day}_{hour}{minute}{seconds}.{ext}`
pub fn timestamped_file(prefix: &str, ext: &str, at: NaiveDateTime) -> String {
    format!("{}_{}.{}", prefix, at.format(TIMESTAMP_FORMAT), ext)
}

/// Queue folders, all relative to one base directory
#[derive(Debug, Clone)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn pending(&self) -> PathBuf {
        self.base.join(PENDING_DIR)
    }

    pub fn errors(&self) -> PathBuf {
        self.base.join(ERRORS_DIR)
    }

    pub fn unprocessed(&self) -> PathBuf {
        self.errors().join(UNPROCESSED_DIR)
    }

    pub fn processed(&self) -> PathBuf {
        self.base.join(PROCESSED_DIR)
    }

    pub fn summaries(&self) -> PathBuf {
        self.base.join(SUMMARIES_DIR)
    }

    pub fn logs(&self) -> PathBuf {
        self.base.join(LOGS_DIR)
    }

    /// Create every queue folder that does not exist yet
    pub fn ensure_dirs(&self) -> Result<(), Error> {
        for dir in [self.pending(), self.unprocessed(), self.processed(), self.summaries(), self.logs()] {
            std::fs::create_dir_all(&dir)?;
        }

        Ok(())
    }

    /// Get all delivery spreadsheets waiting to be processed, sorted by name
    pub fn get_pending_files(&self) -> Result<Vec<PathBuf>, Error> {
        let mut files = std::fs::read_dir(self.pending())?
            .filter_map(|f| f.ok())
            .filter(|f| f.path().is_file())
            .filter(|f| DELIVERY_FILE_NAME.is_match(f.file_name().to_str().unwrap_or("skip file")))
            .map(|f| f.path())
            .collect::<Vec<PathBuf>>();

        files.sort();

        Ok(files)
    }
}

/// Delivery file path functions to extend to [`std::path::Path`]
pub trait DeliveryFilePaths {
    /// File name without extension, lossy
    fn stem_str(&self) -> String;
    /// Where a failed spreadsheet is moved to
    fn errored_file(&self, layout: &Layout, at: NaiveDateTime) -> PathBuf;
    /// Where a loaded spreadsheet is moved to
    fn processed_file(&self, layout: &Layout) -> PathBuf;
}

impl DeliveryFilePaths for Path {
    fn stem_str(&self) -> String {
        self.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn errored_file(&self, layout: &Layout, at: NaiveDateTime) -> PathBuf {
        let ext = self
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "xlsx".into());

        layout
            .unprocessed()
            .join(timestamped_file(&format!("{}_ERROR", self.stem_str()), &ext, at))
    }

    fn processed_file(&self, layout: &Layout) -> PathBuf {
        let mut path = layout.processed();

        match self.file_name() {
            Some(name) => path.push(name),
            None => path.push(self.stem_str()),
        }

        path
    }
}
