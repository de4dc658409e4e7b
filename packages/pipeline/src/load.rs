//! Input loading.
//!
//! Spreadsheets are read first; any unreadable spreadsheet aborts the run.
//! PDFs are then extracted one blocking task per document. A document that
//! fails to open or parse (or whose extraction panics) is recorded as a
//! [`DocumentFailure`] and skipped, so earlier and later documents are
//! unaffected. With `parallel_documents` all tasks are spawned at once;
//! results are always merged back in input order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use case_tracker_case_models::RawTextBlock;
use case_tracker_pdf::{OcrOptions, PageExtraction, PdfError, extract_pages};
use case_tracker_tabular::{Table, read_table};
use tokio::task::JoinHandle;

use crate::PipelineError;
use crate::progress::ProgressCallback;
use crate::session::Session;

/// A document that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    /// File name of the document.
    pub source_file: String,
    /// What went wrong.
    pub message: String,
}

impl std::fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source_file, self.message)
    }
}

/// Everything read from disk for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedInputs {
    /// Spreadsheets, in input order.
    pub tables: Vec<Table>,
    /// Page texts, in document order then page order.
    pub blocks: Vec<RawTextBlock>,
    /// Documents that could not be extracted.
    pub document_failures: Vec<DocumentFailure>,
    /// Non-fatal extraction warnings (OCR fallbacks and the like).
    pub warnings: Vec<String>,
    /// Number of pages whose text came from OCR.
    pub ocr_pages: usize,
    /// OCR was requested but the binaries are not installed.
    pub ocr_unavailable: bool,
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn extract_document(path: &Path, ocr: &OcrOptions) -> Result<PageExtraction, PdfError> {
    let bytes = std::fs::read(path)?;
    extract_pages(&bytes, &file_name(path), ocr)
}

fn spawn_extraction(
    path: PathBuf,
    ocr: OcrOptions,
    progress: Arc<dyn ProgressCallback>,
) -> JoinHandle<Result<PageExtraction, PdfError>> {
    tokio::task::spawn_blocking(move || {
        let result = extract_document(&path, &ocr);
        progress.inc(1);
        result
    })
}

/// Reads every input held by `session`.
///
/// # Errors
///
/// Returns [`PipelineError::Spreadsheet`] if any spreadsheet cannot be
/// read. Document failures are never errors; they are collected in
/// [`LoadedInputs::document_failures`].
pub async fn load_inputs(
    session: &Session,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<LoadedInputs, PipelineError> {
    let mut loaded = LoadedInputs::default();

    for path in &session.spreadsheets {
        let table = read_table(path).map_err(|source| PipelineError::Spreadsheet {
            path: path.display().to_string(),
            source,
        })?;
        loaded.tables.push(table);
    }

    if session.documents.is_empty() {
        return Ok(loaded);
    }

    let settings = &session.settings;
    let ocr_available = if settings.ocr {
        let available = tokio::task::spawn_blocking(case_tracker_pdf::ocr::ocr_available)
            .await
            .unwrap_or(false);
        if !available {
            log::warn!("OCR requested but pdftoppm/tesseract were not found; using text layer only");
            loaded.ocr_unavailable = true;
        }
        available
    } else {
        false
    };
    let ocr = settings.ocr_options(ocr_available);

    progress.set_total(session.documents.len() as u64);
    progress.set_message("Extracting documents".to_owned());

    let results = if settings.parallel_documents {
        let handles: Vec<_> = session
            .documents
            .iter()
            .map(|path| spawn_extraction(path.clone(), ocr.clone(), progress.clone()))
            .collect();
        futures::future::join_all(handles).await
    } else {
        let mut results = Vec::with_capacity(session.documents.len());
        for path in &session.documents {
            results.push(spawn_extraction(path.clone(), ocr.clone(), progress.clone()).await);
        }
        results
    };

    for (path, result) in session.documents.iter().zip(results) {
        let source_file = file_name(path);
        let outcome = match result {
            Ok(Ok(extraction)) => Ok(extraction),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("extraction aborted: {e}")),
        };

        match outcome {
            Ok(extraction) => {
                log::info!(
                    "{source_file}: {} page(s), {} via OCR",
                    extraction.blocks.len(),
                    extraction.ocr_pages.len()
                );
                loaded.ocr_pages += extraction.ocr_pages.len();
                loaded.warnings.extend(
                    extraction
                        .warnings
                        .into_iter()
                        .map(|w| format!("{source_file}: {w}")),
                );
                loaded.blocks.extend(extraction.blocks);
            }
            Err(message) => {
                log::warn!("Skipping {source_file}: {message}");
                loaded.document_failures.push(DocumentFailure {
                    source_file,
                    message,
                });
            }
        }
    }

    progress.finish(format!(
        "Extracted {} page(s) from {} document(s), {} failed",
        loaded.blocks.len(),
        session.documents.len() - loaded.document_failures.len(),
        loaded.document_failures.len()
    ));

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::null_progress;
    use crate::settings::Settings;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn bad_documents_are_skipped_not_fatal() {
        let dir = temp_dir("case_tracker_load_bad_documents");
        let csv = dir.join("cases.csv");
        std::fs::write(&csv, "case,amount\nA1,100\n").unwrap();
        let junk = dir.join("junk.pdf");
        std::fs::write(&junk, b"not a pdf").unwrap();

        for parallel in [true, false] {
            let mut session = Session::new(Settings {
                parallel_documents: parallel,
                ..Settings::default()
            });
            session.add_input(csv.clone()).unwrap();
            session.add_input(junk.clone()).unwrap();
            session.add_input(dir.join("missing.pdf")).unwrap();

            let loaded = load_inputs(&session, &null_progress()).await.unwrap();
            assert_eq!(loaded.tables.len(), 1);
            assert!(loaded.blocks.is_empty());
            let failed: Vec<&str> = loaded
                .document_failures
                .iter()
                .map(|f| f.source_file.as_str())
                .collect();
            assert_eq!(failed, vec!["junk.pdf", "missing.pdf"]);
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    /// Builds a PDF with one line of Helvetica text per page.
    fn text_pdf(pages: &[&str]) -> Vec<u8> {
        use std::fmt::Write as _;

        let kids: Vec<String> = (0..pages.len())
            .map(|i| format!("{} 0 R", 4 + 2 * i))
            .collect();
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                pages.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_owned(),
        ];
        for (i, text) in pages.iter().enumerate() {
            let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + 2 * i
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ));
        }

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            write!(pdf, "{} 0 obj\n{body}\nendobj\n", i + 1).unwrap();
        }

        let xref = pdf.len();
        write!(pdf, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).unwrap();
        for offset in offsets {
            write!(pdf, "{offset:010} 00000 n \n").unwrap();
        }
        write!(
            pdf,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .unwrap();

        pdf.into_bytes()
    }

    fn labels(loaded: &LoadedInputs) -> Vec<String> {
        loaded.blocks.iter().map(RawTextBlock::source_label).collect()
    }

    #[tokio::test]
    async fn parallel_and_sequential_merge_in_input_order() {
        let dir = temp_dir("case_tracker_load_input_order");
        let first = dir.join("first.pdf");
        std::fs::write(&first, text_pdf(&["Case A1", "Case A2"])).unwrap();
        let junk = dir.join("junk.pdf");
        std::fs::write(&junk, b"not a pdf").unwrap();
        let last = dir.join("last.pdf");
        std::fs::write(&last, text_pdf(&["Case B1"])).unwrap();

        let mut results = Vec::new();
        for parallel in [true, false] {
            let mut session = Session::new(Settings {
                parallel_documents: parallel,
                ..Settings::default()
            });
            for path in [&first, &junk, &last] {
                session.add_input(path.clone()).unwrap();
            }
            results.push(load_inputs(&session, &null_progress()).await.unwrap());
        }

        let parallel = &results[0];
        let sequential = &results[1];
        assert_eq!(
            labels(parallel),
            vec!["first.pdf#p1", "first.pdf#p2", "last.pdf#p1"]
        );
        assert!(parallel.blocks[0].text.contains("A1"));
        assert!(parallel.blocks[1].text.contains("A2"));
        assert!(parallel.blocks[2].text.contains("B1"));

        let failed: Vec<&str> = parallel
            .document_failures
            .iter()
            .map(|f| f.source_file.as_str())
            .collect();
        assert_eq!(failed, vec!["junk.pdf"]);

        assert_eq!(parallel, sequential);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unreadable_spreadsheet_is_fatal() {
        let dir = temp_dir("case_tracker_load_bad_spreadsheet");
        let mut session = Session::new(Settings::default());
        session.add_input(dir.join("absent.csv")).unwrap();

        let err = load_inputs(&session, &null_progress()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Spreadsheet { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
