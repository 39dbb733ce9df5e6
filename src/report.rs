
//! Incident files, error routing and label renaming
//!
//! Everything here is plain text for the receiving team to read.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use glob::{MatchOptions, Pattern};
use tracing::{info, warn};

use crate::paths::{timestamped_file, DeliveryFilePaths, Layout};
use crate::reconcile::EanGroup;

const RULE: &str = "==================================================";

/// Writes incident reports and moves spreadsheets out of the pending queue
#[derive(Debug, Clone)]
pub struct ReportSink {
    layout: Layout,
}

impl ReportSink {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Move a spreadsheet that failed into `Errores/No_Procesados`
    ///
    /// An `error_procesamiento_{oc}_{ts}.txt` report is written next to it.
    /// Returns the new location of the spreadsheet.
    pub fn move_to_errors(&self, file: &Path, oc: &str, reason: &str, at: NaiveDateTime) -> io::Result<PathBuf> {
        fs::create_dir_all(self.layout.unprocessed())?;

        let target = file.errored_file(&self.layout, at);
        move_file(file, &target)?;
        info!("moved {} to {}", file.display(), target.display());

        let report = self.layout
            .unprocessed()
            .join(timestamped_file(&format!("error_procesamiento_{}", oc), "txt", at));

        let mut buffer = fs::File::create(&report)?;
        writeln!(buffer, "ERROR EN PROCESAMIENTO DE SAP - ENTREGA NO PROCESADA")?;
        writeln!(buffer, "{}", RULE)?;
        writeln!(buffer, "OC: {}", oc)?;
        writeln!(buffer, "Archivo Original: {}", file_name(file))?;
        writeln!(buffer, "Fecha Error: {}", at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(buffer, "Archivo Movido a: {}", target.display())?;
        writeln!(buffer, "Error: {}", reason)?;
        writeln!(buffer, "{}", RULE)?;
        writeln!(buffer)?;
        writeln!(buffer, "Esta entrega no se volverá a procesar automáticamente.")?;
        writeln!(buffer, "Revisar manualmente antes de reprocesar.")?;

        info!("incident report written to {}", report.display());
        Ok(target)
    }

    /// `error_ean_no_encontrado_{oc}_{ts}.txt` in `Errores`
    pub fn record_missing_ean(&self, oc: &str, ean: &str, file: &Path, at: NaiveDateTime) -> io::Result<PathBuf> {
        self.write_incident(
            &format!("error_ean_no_encontrado_{}", oc),
            at,
            &[
                ("ERROR DE EAN NO ENCONTRADO - OC CANCELADA", None),
                ("OC", Some(oc)),
                ("EAN no encontrado", Some(ean)),
                ("Archivo Excel", Some(&file.display().to_string())),
                ("Motivo", Some("EAN del Excel no existe en ninguna fila de SAP")),
            ],
        )
    }

    /// `error_ean_repetido_{oc}_{ts}.txt` in `Errores`
    pub fn record_repeated_ean(&self, oc: &str, ean: &str, reason: &str, file: &Path, at: NaiveDateTime) -> io::Result<PathBuf> {
        self.write_incident(
            &format!("error_ean_repetido_{}", oc),
            at,
            &[
                ("ERROR DE EAN REPETIDO - OC CANCELADA", None),
                ("OC", Some(oc)),
                ("EAN repetido", Some(ean)),
                ("Archivo Excel", Some(&file.display().to_string())),
                ("Motivo", Some(reason)),
            ],
        )
    }

    fn write_incident(&self, prefix: &str, at: NaiveDateTime, lines: &[(&str, Option<&str>)]) -> io::Result<PathBuf> {
        let dir = self.layout.errors();
        fs::create_dir_all(&dir)?;

        let path = dir.join(timestamped_file(prefix, "txt", at));
        let mut buffer = fs::File::create(&path)?;

        for (label, value) in lines {
            match value {
                Some(value) => writeln!(buffer, "{}: {}", label, value)?,
                None => writeln!(buffer, "{}\n{}", label, RULE)?,
            }
        }
        writeln!(buffer, "Fecha: {}", at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(buffer, "Estado: OC cancelada - se continúa con la siguiente")?;
        writeln!(buffer, "{}", RULE)?;

        info!("incident written to {}", path.display());
        Ok(path)
    }

    /// A spreadsheet that already failed once is left alone
    ///
    /// Matches failed copies named `{stem}_ERROR_{ts}.xls[x]`.
    pub fn already_in_errors(&self, file: &Path) -> bool {
        let stem = file.stem_str();
        let entries = match fs::read_dir(self.layout.unprocessed()) {
            Ok(entries) => entries,
            Err(_) => return false,
        };

        entries
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .any(|name| {
                let lower = name.to_lowercase();
                name.starts_with(&stem) && (lower.ends_with(".xlsx") || lower.ends_with(".xls"))
            })
    }

    /// Summary of the repeated EANs of a loaded delivery, in `Resumenes`
    pub fn write_repeated_summary(&self, oc: &str, groups: &[EanGroup], file: &Path, at: NaiveDateTime) -> io::Result<Option<PathBuf>> {
        let repeated: Vec<&EanGroup> = groups.iter().filter(|g| g.is_repeated()).collect();
        if repeated.is_empty() {
            return Ok(None);
        }

        let dir = self.layout.summaries();
        fs::create_dir_all(&dir)?;

        let path = dir.join(timestamped_file(&format!("resumen_eans_repetidos_{}", oc), "txt", at));
        let mut buffer = fs::File::create(&path)?;

        writeln!(buffer, "RESUMEN DE EANs REPETIDOS PROCESADOS")?;
        writeln!(buffer, "{}", RULE)?;
        writeln!(buffer, "OC: {}", oc)?;
        writeln!(buffer, "Fecha: {}", at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(buffer, "Archivo Excel: {}", file.display())?;
        writeln!(buffer, "Total EANs repetidos: {}", repeated.len())?;
        writeln!(buffer, "{}", RULE)?;

        for group in repeated {
            let quantities: Vec<String> = group.records.iter().map(|r| r.quantity.to_string()).collect();
            let batches: Vec<&str> = group.records.iter().map(|r| r.batch.as_str()).collect();
            let expiries: Vec<String> = group.records.iter().map(|r| r.expiry_sap()).collect();

            writeln!(buffer)?;
            writeln!(buffer, "EAN: {}", group.ean)?;
            writeln!(buffer, "  - Lotes: {}", batches.join(", "))?;
            writeln!(buffer, "  - Cantidades: {}", quantities.join(", "))?;
            writeln!(buffer, "  - Total cantidad: {}", group.total_quantity())?;
            writeln!(buffer, "  - Fechas vencimiento: {}", expiries.join(", "))?;
        }

        info!("repeated EAN summary written to {}", path.display());
        Ok(Some(path))
    }
}

/// Result of looking for the printed label
#[derive(Debug, PartialEq)]
pub enum LabelRename {
    Renamed(PathBuf),
    FolderMissing,
    NotFound,
    TargetExists(PathBuf),
}

/// Rename the label PDF SAP printed for a delivery to `{document_ref}.pdf`
///
/// The spool names the file after the cover title plus a suffix, so the
/// first PDF whose name contains the reference is taken.
pub fn rename_label_pdf(document_ref: &str, folder: &Path) -> io::Result<LabelRename> {
    if !folder.is_dir() {
        warn!("label folder not found: {}", folder.display());
        return Ok(LabelRename::FolderMissing);
    }

    let pattern = Path::new(&Pattern::escape(&folder.to_string_lossy())).join("*.pdf");
    let options = MatchOptions { case_sensitive: false, ..Default::default() };

    let entries = glob::glob_with(&pattern.to_string_lossy(), options)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let found = entries
        .filter_map(Result::ok)
        .find(|path| file_name(path).contains(document_ref));

    let Some(found) = found else {
        info!("no label PDF contains `{}` in {}", document_ref, folder.display());
        return Ok(LabelRename::NotFound);
    };

    let ext = found
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".into());
    let target = folder.join(format!("{}.{}", document_ref, ext));

    if target.exists() {
        warn!("label {} already exists", target.display());
        return Ok(LabelRename::TargetExists(target));
    }

    fs::rename(&found, &target)?;
    info!("label {} renamed to {}", file_name(&found), file_name(&target));

    Ok(LabelRename::Renamed(target))
}

/// Rename, or copy and delete when crossing volumes
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    fs::copy(from, to)?;
    fs::remove_file(from)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::api::DeliveryRecord;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap().and_hms_opt(8, 30, 5).unwrap()
    }

    fn sink() -> (tempfile::TempDir, ReportSink) {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.ensure_dirs().unwrap();

        (dir, ReportSink::new(layout))
    }

    #[test]
    fn failed_file_is_moved_with_report() {
        let (_dir, sink) = sink();
        let file = sink.layout().pending().join("5600025440 0082214777.xlsx");
        fs::write(&file, b"xlsx").unwrap();

        let moved = sink.move_to_errors(&file, "5600025440", "EANs faltantes en SAP: [7791234567890]", at()).unwrap();

        assert!(!file.exists());
        assert_eq!(moved, sink.layout().unprocessed().join("5600025440 0082214777_ERROR_20250901_083005.xlsx"));
        assert_eq!(fs::read(&moved).unwrap(), b"xlsx");

        let report = sink.layout().unprocessed().join("error_procesamiento_5600025440_20250901_083005.txt");
        let text = fs::read_to_string(report).unwrap();
        assert!(text.contains("OC: 5600025440"));
        assert!(text.contains("Archivo Original: 5600025440 0082214777.xlsx"));
        assert!(text.contains("Error: EANs faltantes en SAP: [7791234567890]"));

        assert!(sink.already_in_errors(&file));
        assert!(!sink.already_in_errors(Path::new("5600025441 0082214778.xlsx")));
    }

    #[test]
    fn ean_incidents() {
        let (_dir, sink) = sink();
        let file = Path::new("5600025440 0082214777.xlsx");

        let missing = sink.record_missing_ean("5600025440", "7791234567890", file, at()).unwrap();
        let repeated = sink.record_repeated_ean("5600025440", "7791234567891", "Cantidad Excel (30) excede cantidad SAP (20)", file, at()).unwrap();

        assert_eq!(missing, sink.layout().errors().join("error_ean_no_encontrado_5600025440_20250901_083005.txt"));
        let text = fs::read_to_string(missing).unwrap();
        assert!(text.starts_with("ERROR DE EAN NO ENCONTRADO"));
        assert!(text.contains("EAN no encontrado: 7791234567890"));

        let text = fs::read_to_string(repeated).unwrap();
        assert!(text.contains("Motivo: Cantidad Excel (30) excede cantidad SAP (20)"));
    }

    #[test]
    fn repeated_summary_only_when_repeated() {
        let (_dir, sink) = sink();
        let record = |batch: &str, quantity| DeliveryRecord {
            ean: "7791234567890".into(),
            quantity,
            batch: batch.into(),
            expiry: NaiveDate::from_ymd_opt(2026, 5, 31).unwrap(),
            receipt: "0114R02179687".into(),
        };

        let single = vec![EanGroup { ean: "7791234567890".into(), records: vec![record("L1", 5)] }];
        assert_eq!(sink.write_repeated_summary("5600025440", &single, Path::new("x.xlsx"), at()).unwrap(), None);

        let repeated = vec![EanGroup { ean: "7791234567890".into(), records: vec![record("L1", 5), record("L2", 7)] }];
        let path = sink.write_repeated_summary("5600025440", &repeated, Path::new("x.xlsx"), at()).unwrap().unwrap();
        let text = fs::read_to_string(path).unwrap();

        assert!(text.contains("Lotes: L1, L2"));
        assert!(text.contains("Total cantidad: 12"));
        assert!(text.contains("Fechas vencimiento: 31.05.2026, 31.05.2026"));
    }

    #[test]
    fn label_is_renamed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("other.pdf"), b"").unwrap();
        fs::write(dir.path().join("R011402179687_0001.PDF"), b"label").unwrap();

        let res = rename_label_pdf("R011402179687", dir.path()).unwrap();

        let target = dir.path().join("R011402179687.PDF");
        assert_eq!(res, LabelRename::Renamed(target.clone()));
        assert_eq!(fs::read(target).unwrap(), b"label");
        assert!(dir.path().join("other.pdf").exists());
    }

    #[test]
    fn label_not_renamed() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(rename_label_pdf("R1", &dir.path().join("missing")).unwrap(), LabelRename::FolderMissing);
        assert_eq!(rename_label_pdf("R1", dir.path()).unwrap(), LabelRename::NotFound);

        fs::write(dir.path().join("R011402179687.pdf"), b"").unwrap();
        assert_eq!(
            rename_label_pdf("R011402179687", dir.path()).unwrap(),
            LabelRename::TargetExists(dir.path().join("R011402179687.pdf"))
        );
    }
}
