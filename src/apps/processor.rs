
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use tracing::{error, info, warn};

use crate::api::{read_delivery_file, PurchaseOrder};
use crate::config::Config;
use crate::paths::DeliveryFilePaths;
use crate::reconcile::{DeliveryError, DeliveryOutcome, Reconciler};
use crate::report::{move_file, rename_label_pdf, LabelRename, ReportSink};
use crate::sap::{self, GuiError, GuiSession};

/// What happened to one pending spreadsheet
#[derive(Debug)]
pub enum FileOutcome {
    Loaded(DeliveryOutcome),
    /// Left in the pending folder
    Skipped(SkipReason),
    /// Moved to the error folder
    Failed(DeliveryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoPurchaseOrder,
    AlreadyFailed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub pending: usize,
    pub loaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct DeliveryProcessor<'a> {
    config: &'a Config,
    sink: ReportSink,
}

impl<'a> DeliveryProcessor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, sink: ReportSink::new(config.layout()) }
    }

    /// List pending spreadsheets and load each of them into SAP
    ///
    /// SAP is only opened when there is something to load. The session is
    /// closed once all files are done.
    pub fn run_cycle<S, F>(&self, open: F) -> anyhow::Result<CycleSummary>
        where
            S: GuiSession,
            F: FnOnce(&Config) -> Result<S, GuiError>
    {
        let layout = self.sink.layout();
        layout.ensure_dirs()
            .with_context(|| format!("failed to create folders under {}", layout.base().display()))?;

        let files = layout.get_pending_files()
            .with_context(|| format!("failed to list {}", layout.pending().display()))?;

        let mut summary = CycleSummary { pending: files.len(), ..Default::default() };
        if files.is_empty() {
            info!("no pending files in {}", layout.pending().display());
            return Ok(summary);
        }

        let mut to_load = Vec::new();
        for file in &files {
            match self.skip_reason(file) {
                Some(_) => summary.skipped += 1,
                None => to_load.push(file),
            }
        }

        if to_load.is_empty() {
            info!("{} pending file(s), none to load", files.len());
            return Ok(summary);
        }

        info!("{} file(s) to load", to_load.len());
        let session = open(self.config).context("failed to open SAP session")?;

        for file in to_load {
            match self.process_file(&session, file) {
                Ok(FileOutcome::Loaded(_)) => summary.loaded += 1,
                Ok(FileOutcome::Skipped(_)) => summary.skipped += 1,
                Ok(FileOutcome::Failed(_)) => summary.failed += 1,
                Err(e) => {
                    error!("{}: {:#}", file.display(), e);
                    summary.failed += 1;
                }
            }
        }

        // already logged, the next cycle logs in again anyway
        let _ = sap::close(&session, &self.config.screen);

        info!(
            "cycle done: {} loaded, {} failed, {} skipped",
            summary.loaded, summary.failed, summary.skipped
        );
        Ok(summary)
    }

    /// Load one spreadsheet and route it to `Procesados` or `Errores`
    ///
    /// Errors are only returned when routing the file itself fails.
    pub fn process_file<S: GuiSession>(&self, session: &S, file: &Path) -> anyhow::Result<FileOutcome> {
        info!("processing {}", file.display());

        if let Some(reason) = self.skip_reason(file) {
            return Ok(FileOutcome::Skipped(reason));
        }

        let Some(po) = PurchaseOrder::from_file_stem(&file.stem_str()) else {
            return Ok(FileOutcome::Skipped(SkipReason::NoPurchaseOrder));
        };

        match self.load(session, &po, file) {
            Ok(outcome) => {
                self.route_success(&po, file, &outcome)?;
                Ok(FileOutcome::Loaded(outcome))
            },
            Err(e) => {
                error!("OC {}: {}", po, e);
                self.route_failure(&po, file, &e)?;
                Ok(FileOutcome::Failed(e))
            }
        }
    }

    /// Files that stay in the pending folder untouched
    fn skip_reason(&self, file: &Path) -> Option<SkipReason> {
        if PurchaseOrder::from_file_stem(&file.stem_str()).is_none() {
            warn!("{}: no purchase order in file name, skipped", file.display());
            return Some(SkipReason::NoPurchaseOrder);
        }

        if self.sink.already_in_errors(file) {
            warn!("{}: already in {}, skipped", file.display(), self.sink.layout().unprocessed().display());
            return Some(SkipReason::AlreadyFailed);
        }

        None
    }

    fn load<S: GuiSession>(&self, session: &S, po: &PurchaseOrder, file: &Path) -> Result<DeliveryOutcome, DeliveryError> {
        let records = read_delivery_file(file)?;
        if records.is_empty() {
            return Err(DeliveryError::NoValidRows);
        }

        Reconciler::new(session, &self.config.screen, &self.config.pacing).load_delivery(po, &records)
    }

    /// The delivery is posted in SAP, so the file must leave the queue first
    fn route_success(&self, po: &PurchaseOrder, file: &Path, outcome: &DeliveryOutcome) -> anyhow::Result<()> {
        let at = now();
        let target = file.processed_file(self.sink.layout());

        match move_file(file, &target) {
            Ok(()) => info!("OC {} loaded ({}), file moved to {}", po, outcome.document_ref, target.display()),
            Err(e) => {
                error!("OC {} loaded ({}) but not moved to {}: {}", po, outcome.document_ref, target.display(), e);

                // a file in the error folder is never loaded again
                let reason = format!(
                    "delivery {} already created in SAP, moving to {} failed: {}",
                    outcome.document_ref, target.display(), e
                );
                self.sink.move_to_errors(file, po.as_str(), &reason, at)
                    .with_context(|| format!("failed to move loaded file {} out of the queue", file.display()))?;
            }
        }

        if let Err(e) = self.sink.write_repeated_summary(po.as_str(), &outcome.groups, file, at) {
            warn!("repeated EAN summary for OC {} not written: {}", po, e);
        }

        thread::sleep(self.config.pacing.pdf_delay());
        match rename_label_pdf(&outcome.document_ref, &self.config.label_dir()) {
            Ok(LabelRename::Renamed(_)) | Ok(LabelRename::TargetExists(_)) => (),
            Ok(other) => warn!("label for {} not renamed: {:?}", outcome.document_ref, other),
            Err(e) => warn!("label for {} not renamed: {}", outcome.document_ref, e),
        }

        Ok(())
    }

    fn route_failure(&self, po: &PurchaseOrder, file: &Path, err: &DeliveryError) -> anyhow::Result<PathBuf> {
        let at = now();
        let reason = err.to_string();

        for ean in err.missing() {
            self.sink.record_missing_ean(po.as_str(), ean, file, at)
                .context("failed to write incident file")?;
        }

        if let Some(ean) = err.repeated_ean() {
            self.sink.record_repeated_ean(po.as_str(), ean, &reason, file, at)
                .context("failed to write incident file")?;
        }

        self.sink.move_to_errors(file, po.as_str(), &reason, at)
            .with_context(|| format!("failed to move {} to the error folder", file.display()))
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Fixed interval between cycles, counted from the end of the last one
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    last_run: Option<Instant>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_run: None }
    }

    /// The first check is always due
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    pub fn mark_run(&mut self, at: Instant) {
        self.last_run = Some(at);
    }
}

/// Run a cycle now and then every poll interval, until the process is killed
pub fn run_forever(config: &Config) -> anyhow::Result<()> {
    let processor = DeliveryProcessor::new(config);
    let mut scheduler = Scheduler::new(Duration::from_secs(config.poll.interval_secs));
    let check = Duration::from_secs(config.poll.check_secs.max(1));

    info!(
        "watching {} every {} s",
        config.layout().pending().display(),
        config.poll.interval_secs
    );

    loop {
        if scheduler.is_due(Instant::now()) {
            if let Err(e) = processor.run_cycle(sap::open_session) {
                error!("cycle failed: {:#}", e);
            }

            scheduler.mark_run(Instant::now());
        }

        thread::sleep(check);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;

    use chrono::NaiveDate;

    use crate::api::DeliveryRecord;
    use crate::config::Pacing;
    use crate::paths::Layout;
    use crate::reconcile::group_by_ean;
    use crate::sap::fake::{Action, FakeSession};

    fn config(base: &Path) -> Config {
        Config {
            base_dir: base.to_path_buf(),
            label_dir: Some(base.join("labels")),
            pacing: Pacing::none(),
            ..Default::default()
        }
    }

    #[test]
    fn nothing_pending_does_not_open_sap() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let opened = Cell::new(false);

        let summary = DeliveryProcessor::new(&config)
            .run_cycle(|_| {
                opened.set(true);
                Ok(FakeSession::with_grid(&[]))
            })
            .unwrap();

        assert_eq!(summary, CycleSummary::default());
        assert!(!opened.get());
        assert!(Layout::new(dir.path()).errors().is_dir());
    }

    #[test]
    fn unreadable_file_goes_to_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let layout = config.layout();
        layout.ensure_dirs().unwrap();

        fs::write(layout.pending().join("5600025440 0082214777.xlsx"), b"not a workbook").unwrap();
        fs::write(layout.pending().join("sin orden.xlsx"), b"").unwrap();

        let session = FakeSession::with_grid(&[("7790000000001", "10")]);
        let summary = DeliveryProcessor::new(&config)
            .run_cycle(|_| Ok(session))
            .unwrap();

        assert_eq!(summary, CycleSummary { pending: 2, loaded: 0, skipped: 1, failed: 1 });
        assert!(!layout.pending().join("5600025440 0082214777.xlsx").exists());
        assert!(layout.pending().join("sin orden.xlsx").exists());

        let moved: Vec<String> = fs::read_dir(layout.unprocessed())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(moved.iter().any(|n| n.starts_with("5600025440 0082214777_ERROR_") && n.ends_with(".xlsx")));
        assert!(moved.iter().any(|n| n.starts_with("error_procesamiento_5600025440_")));
    }

    #[test]
    fn failed_file_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let layout = config.layout();
        layout.ensure_dirs().unwrap();

        let file = layout.pending().join("5600025440 0082214777.xlsx");
        fs::write(&file, b"").unwrap();
        fs::write(layout.unprocessed().join("5600025440 0082214777_ERROR_20250901_083005.xlsx"), b"").unwrap();

        let session = FakeSession::with_grid(&[]);
        let outcome = DeliveryProcessor::new(&config).process_file(&session, &file).unwrap();

        assert!(matches!(outcome, FileOutcome::Skipped(SkipReason::AlreadyFailed)));
        assert!(file.exists());
        assert!(session.actions().is_empty());
    }

    #[test]
    fn missing_ean_writes_incidents() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let layout = config.layout();
        layout.ensure_dirs().unwrap();

        let file = layout.pending().join("5600025440.xlsx");
        fs::write(&file, b"").unwrap();

        let processor = DeliveryProcessor::new(&config);
        let po = PurchaseOrder::from_file_stem("5600025440").unwrap();
        let err = DeliveryError::MissingEans(vec!["7790000000009".into()]);

        let moved = processor.route_failure(&po, &file, &err).unwrap();

        assert!(moved.exists());
        assert!(!file.exists());

        let incidents: Vec<String> = fs::read_dir(layout.errors())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(incidents.iter().any(|n| n.starts_with("error_ean_no_encontrado_5600025440_")));
    }

    #[test]
    fn session_closed_after_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let layout = config.layout();
        layout.ensure_dirs().unwrap();
        fs::write(layout.pending().join("5600025440.xlsx"), b"").unwrap();

        let session = FakeSession::with_grid(&[]);
        let processor = DeliveryProcessor::new(&config);
        processor.run_cycle(|_| Ok(session.clone())).unwrap();

        let actions = session.actions();
        assert_eq!(actions[actions.len() - 2], Action::SetText(config.screen.command_field.clone(), "/nex".into()));
    }

    #[test]
    fn open_failure_fails_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let layout = config.layout();
        layout.ensure_dirs().unwrap();
        fs::write(layout.pending().join("5600025440.xlsx"), b"").unwrap();

        let res = DeliveryProcessor::new(&config)
            .run_cycle(|_| Err::<FakeSession, _>(GuiError::Unavailable("no SAP Logon".into())));

        assert!(res.is_err());
        assert!(layout.pending().join("5600025440.xlsx").exists());
    }

    fn loaded_outcome() -> DeliveryOutcome {
        let record = |batch: &str, quantity| DeliveryRecord {
            ean: "7790000000001".into(),
            quantity,
            batch: batch.into(),
            expiry: NaiveDate::from_ymd_opt(2026, 5, 31).unwrap(),
            receipt: "0114R02179687 0082214777".into(),
        };

        DeliveryOutcome {
            document_ref: "R011402179687".into(),
            rows_written: 2,
            groups: group_by_ean(&[record("L1", 4), record("L2", 6)]),
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn loaded_file_is_filed() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let layout = config.layout();
        layout.ensure_dirs().unwrap();

        let file = layout.pending().join("5600025440 0082214777.xlsx");
        fs::write(&file, b"xlsx").unwrap();

        let labels = config.label_dir();
        fs::create_dir_all(&labels).unwrap();
        fs::write(labels.join("R011402179687_0001.pdf"), b"label").unwrap();

        let po = PurchaseOrder::from_file_stem("5600025440 0082214777").unwrap();
        DeliveryProcessor::new(&config).route_success(&po, &file, &loaded_outcome()).unwrap();

        assert!(!file.exists());
        assert_eq!(fs::read(layout.processed().join("5600025440 0082214777.xlsx")).unwrap(), b"xlsx");
        assert!(labels.join("R011402179687.pdf").exists());
        assert!(file_names(&layout.summaries())
            .iter()
            .any(|n| n.starts_with("resumen_eans_repetidos_5600025440_")));
    }

    #[test]
    fn loaded_file_leaves_queue_when_summary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let layout = config.layout();
        layout.ensure_dirs().unwrap();

        // a plain file where the summaries folder should be
        fs::remove_dir_all(layout.summaries()).unwrap();
        fs::write(layout.summaries(), b"").unwrap();

        let file = layout.pending().join("5600025440 0082214777.xlsx");
        fs::write(&file, b"xlsx").unwrap();

        let po = PurchaseOrder::from_file_stem("5600025440 0082214777").unwrap();
        DeliveryProcessor::new(&config).route_success(&po, &file, &loaded_outcome()).unwrap();

        assert!(!file.exists());
        assert!(layout.processed().join("5600025440 0082214777.xlsx").exists());
        assert!(layout.get_pending_files().unwrap().is_empty());
    }

    #[test]
    fn only_skipped_files_do_not_open_sap() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let layout = config.layout();
        layout.ensure_dirs().unwrap();

        fs::write(layout.pending().join("sin orden.xlsx"), b"").unwrap();
        fs::write(layout.pending().join("5600025440 0082214777.xlsx"), b"").unwrap();
        fs::write(layout.unprocessed().join("5600025440 0082214777_ERROR_20250901_083005.xlsx"), b"").unwrap();

        let opened = Cell::new(false);
        let summary = DeliveryProcessor::new(&config)
            .run_cycle(|_| {
                opened.set(true);
                Ok(FakeSession::with_grid(&[]))
            })
            .unwrap();

        assert_eq!(summary, CycleSummary { pending: 2, loaded: 0, skipped: 2, failed: 0 });
        assert!(!opened.get());
    }

    #[test]
    fn scheduler_interval() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(Duration::from_secs(300));

        assert!(scheduler.is_due(start));

        scheduler.mark_run(start);
        assert!(!scheduler.is_due(start + Duration::from_secs(30)));
        assert!(!scheduler.is_due(start + Duration::from_secs(299)));
        assert!(scheduler.is_due(start + Duration::from_secs(300)));
    }
}
