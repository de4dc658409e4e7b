#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-page text extraction for case documents.
//!
//! Text-based PDFs are read with pure-Rust text extraction
//! ([`pdf_extract`]), one [`RawTextBlock`] per page. Scanned pages carry no
//! text layer; when OCR is enabled those pages are recognised through the
//! external `pdftoppm`/`tesseract` binaries ([`ocr`]). OCR is strictly a
//! fallback: if it fails the text layer is kept and a warning recorded.

pub mod ocr;

use case_tracker_case_models::RawTextBlock;

/// Errors specific to PDF extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// OCR rendering or recognition failed.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// OCR settings for a single extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOptions {
    /// Whether to OCR pages with no text layer. Callers should only set this
    /// after [`ocr::ocr_available`] returned `true`.
    pub enabled: bool,
    /// Tesseract language code(s), e.g. `"eng"` or `"eng+spa"`.
    pub language: String,
    /// Render resolution for `pdftoppm`.
    pub dpi: u32,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            language: "eng".to_owned(),
            dpi: 300,
        }
    }
}

/// Result of extracting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    /// One block per page, in page order.
    pub blocks: Vec<RawTextBlock>,
    /// Zero-based indices of pages whose text came from OCR.
    pub ocr_pages: Vec<u32>,
    /// Non-fatal problems (e.g. OCR failed and the text layer was kept).
    pub warnings: Vec<String>,
}

fn page_index(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

fn into_blocks(source_file: &str, pages: Vec<String>) -> Vec<RawTextBlock> {
    pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| RawTextBlock::page(source_file, page_index(i), text))
        .collect()
}

/// Extracts the text layer of every page.
///
/// # Errors
///
/// Returns [`PdfError::Extraction`] if the document cannot be parsed.
pub fn extract_text_layer(bytes: &[u8]) -> Result<Vec<String>, PdfError> {
    pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| PdfError::Extraction(format!("failed to extract text from PDF: {e}")))
}

/// Extracts one [`RawTextBlock`] per page of a PDF.
///
/// With OCR enabled, pages whose text layer is blank are OCRed; if the text
/// layer cannot be read at all, the whole document is OCRed instead.
///
/// # Errors
///
/// Returns [`PdfError`] if the document yields no text by any available
/// route.
pub fn extract_pages(
    bytes: &[u8],
    source_file: &str,
    ocr_options: &OcrOptions,
) -> Result<PageExtraction, PdfError> {
    let text_layer = extract_text_layer(bytes);

    if !ocr_options.enabled {
        let pages = text_layer?;
        log::debug!("{source_file}: extracted {} page(s) from text layer", pages.len());
        return Ok(PageExtraction {
            blocks: into_blocks(source_file, pages),
            ..PageExtraction::default()
        });
    }

    let mut pages = match text_layer {
        Ok(pages) => pages,
        Err(e) => {
            log::warn!("{source_file}: {e}; falling back to OCR for the whole document");
            let pages = ocr::ocr_all_pages(bytes, ocr_options)?;
            let ocr_pages = (0..pages.len()).map(page_index).collect();
            return Ok(PageExtraction {
                blocks: into_blocks(source_file, pages),
                ocr_pages,
                warnings: vec![format!("text layer unreadable ({e}); used OCR")],
            });
        }
    };

    let blank: Vec<u32> = pages
        .iter()
        .enumerate()
        .filter(|(_, text)| text.trim().is_empty())
        .map(|(i, _)| page_index(i))
        .collect();

    let mut extraction = PageExtraction::default();

    if !blank.is_empty() {
        log::info!("{source_file}: OCRing {} page(s) without a text layer", blank.len());
        match ocr::ocr_pages(bytes, &blank, ocr_options) {
            Ok(recognised) => {
                for (index, text) in recognised {
                    if let Some(slot) = pages.get_mut(index as usize) {
                        *slot = text;
                        extraction.ocr_pages.push(index);
                    }
                }
            }
            Err(e) => {
                log::warn!("{source_file}: OCR failed, keeping text layer: {e}");
                extraction.warnings.push(format!("OCR failed: {e}"));
            }
        }
    }

    extraction.blocks = into_blocks(source_file, pages);
    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_without_ocr() {
        let err = extract_pages(b"definitely not a pdf", "junk.pdf", &OcrOptions::default())
            .unwrap_err();
        assert!(matches!(err, PdfError::Extraction(_)));
    }

    #[test]
    fn blocks_are_numbered_in_page_order() {
        let blocks = into_blocks("doc.pdf", vec!["one".to_owned(), "two".to_owned()]);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].page_index, Some(0));
        assert_eq!(blocks[1].source_label(), "doc.pdf#p2");
        assert_eq!(blocks[1].text, "two");
    }
}
