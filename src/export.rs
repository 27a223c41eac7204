use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::report::{Report, ReportKind};

mod csv_table;
mod docx;
mod pdf;
mod truetype;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Render `report` into file bytes. `pdf_font` only affects PDF output.
pub fn render(
    report: &Report,
    format: ExportFormat,
    pdf_font: Option<&Path>,
) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Pdf => pdf::render(report, pdf_font),
        ExportFormat::Docx => docx::render(report),
        ExportFormat::Csv => csv_table::render(report),
    }
}

/// `EcoRecycle_<Report|Stock|Analysis>_<stamp>.<ext>`. Journals are stamped
/// with the period reference, stock with the export date.
pub fn default_file_name(report: &Report, stamp: &str, format: ExportFormat) -> String {
    let kind = match report.kind {
        ReportKind::Journal => "Report",
        ReportKind::Stock => "Stock",
        ReportKind::Analysis => "Analysis",
    };
    format!("EcoRecycle_{kind}_{stamp}.{}", format.extension())
}

/// Render and write in one step. Nothing is written when rendering fails.
pub fn export_to_file(
    report: &Report,
    format: ExportFormat,
    pdf_font: Option<&Path>,
    path: &Path,
) -> Result<PathBuf, ExportError> {
    let bytes = render(report, format, pdf_font)?;
    fs::write(path, &bytes).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "exported {:?} report to {} ({} bytes)",
        report.kind,
        path.display(),
        bytes.len()
    );
    Ok(path.to_path_buf())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::labels::{Labels, Lang};
    use crate::model::Database;
    use crate::period::Period;
    use crate::report::analysis_report;

    #[test]
    fn file_names_follow_report_kind() {
        let labels = Labels::for_lang(Lang::Ru);
        let report = analysis_report(
            &Database::default(),
            &Period::month("2024-03").unwrap(),
            labels,
            "now",
        );
        assert_eq!(
            default_file_name(&report, "2024-03", ExportFormat::Docx),
            "EcoRecycle_Analysis_2024-03.docx"
        );
    }

    #[test]
    fn unwritable_target_reports_path() {
        let labels = Labels::for_lang(Lang::Ru);
        let report = analysis_report(
            &Database::default(),
            &Period::month("2024-03").unwrap(),
            labels,
            "now",
        );
        let target = std::env::temp_dir()
            .join(format!("ecorecycle-missing-{}", std::process::id()))
            .join("nested")
            .join("out.csv");
        let err = export_to_file(&report, ExportFormat::Csv, None, &target).unwrap_err();
        match err {
            ExportError::Write { path, .. } => assert_eq!(path, target),
            other => panic!("unexpected error: {other}"),
        }
    }
}
