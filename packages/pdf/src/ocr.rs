//! OCR through the external `pdftoppm` and `tesseract` binaries.
//!
//! Pages are rendered to PNG with `pdftoppm` and recognised with
//! `tesseract`, all inside a [`tempfile::TempDir`] that is removed when the
//! call returns, whether it succeeded or not.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{OcrOptions, PdfError};

const PDFTOPPM: &str = "pdftoppm";
const TESSERACT: &str = "tesseract";

/// Whether `program` resolves to an executable on `PATH` (or is itself a
/// path to one).
fn command_available(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Whether both OCR binaries are installed.
#[must_use]
pub fn ocr_available() -> bool {
    let available = command_available(PDFTOPPM) && command_available(TESSERACT);
    log::debug!("OCR binaries available: {available}");
    available
}

/// Writes the PDF into a fresh temporary directory.
fn stage_pdf(bytes: &[u8]) -> Result<(tempfile::TempDir, PathBuf), PdfError> {
    let dir = tempfile::tempdir()?;
    let pdf_path = dir.path().join("input.pdf");
    std::fs::write(&pdf_path, bytes)?;
    Ok((dir, pdf_path))
}

fn run_pdftoppm(pdf_path: &Path, prefix: &Path, dpi: u32, page: Option<u32>) -> Result<(), PdfError> {
    let mut cmd = Command::new(PDFTOPPM);
    cmd.arg("-r").arg(dpi.to_string()).arg("-png");
    if let Some(page) = page {
        cmd.arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-singlefile");
    }
    let output = cmd.arg(pdf_path).arg(prefix).output()?;

    if !output.status.success() {
        return Err(PdfError::Ocr(format!(
            "{PDFTOPPM} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

fn run_tesseract(image: &Path, language: &str) -> Result<String, PdfError> {
    let output = Command::new(TESSERACT)
        .arg(image)
        .arg("stdout")
        .arg("-l")
        .arg(language)
        .output()?;

    if !output.status.success() {
        return Err(PdfError::Ocr(format!(
            "{TESSERACT} exited with {} on {}: {}",
            output.status,
            image.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// OCRs every page of a document, in page order.
///
/// # Errors
///
/// Returns [`PdfError::Ocr`] if rendering or recognition fails, or
/// [`PdfError::Io`] if the temporary files cannot be written.
pub fn ocr_all_pages(bytes: &[u8], options: &OcrOptions) -> Result<Vec<String>, PdfError> {
    let (dir, pdf_path) = stage_pdf(bytes)?;
    let prefix = dir.path().join("page");
    run_pdftoppm(&pdf_path, &prefix, options.dpi, None)?;

    // pdftoppm zero-pads page numbers to a uniform width, so a name sort is
    // a page sort.
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir.path())?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.extension().is_some_and(|e| e == "png")
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("page"))
        })
        .collect();
    images.sort();

    if images.is_empty() {
        return Err(PdfError::Ocr(format!("{PDFTOPPM} produced no page images")));
    }

    let pages = images
        .iter()
        .map(|image| run_tesseract(image, &options.language))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("OCR recognised {} page(s)", pages.len());
    Ok(pages)
}

/// OCRs selected pages (zero-based indices), returning `(index, text)`
/// pairs in the order requested.
///
/// # Errors
///
/// Returns [`PdfError::Ocr`] if rendering or recognition of any page
/// fails.
pub fn ocr_pages(
    bytes: &[u8],
    page_indices: &[u32],
    options: &OcrOptions,
) -> Result<Vec<(u32, String)>, PdfError> {
    let (dir, pdf_path) = stage_pdf(bytes)?;
    let mut out = Vec::with_capacity(page_indices.len());

    for &index in page_indices {
        let page_number = index.saturating_add(1);
        let prefix = dir.path().join(format!("page-{page_number}"));
        run_pdftoppm(&pdf_path, &prefix, options.dpi, Some(page_number))?;
        let text = run_tesseract(&prefix.with_extension("png"), &options.language)?;
        log::debug!("OCR page {page_number}: {} characters", text.len());
        out.push((index, text));
    }

    Ok(out)
}
