//! ZIP archive of extracted page text.
//!
//! One entry per block, named `<file stem>_p<page>.txt` (or
//! `<file stem>.txt` for whole-document blocks), written in block order.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use case_tracker_case_models::RawTextBlock;

use crate::ExportError;

/// Returns the archive entry name for `block`.
#[must_use]
pub fn archive_entry_name(block: &RawTextBlock) -> String {
    let path = Path::new(&block.source_file);
    let stem = path
        .file_stem()
        .map_or_else(|| block.source_file.clone(), |s| s.to_string_lossy().into_owned());

    match block.page_number() {
        Some(page) => format!("{stem}_p{page}.txt"),
        None => format!("{stem}.txt"),
    }
}

/// Entry names must be unique; two inputs with the same stem get a numeric
/// suffix on the later one.
fn unique_name(name: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(name.clone()) {
        return name;
    }
    let base = name.trim_end_matches(".txt");
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}.txt");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Writes every block's text into a ZIP archive at `path`.
///
/// Returns the number of entries written.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or the archive
/// cannot be written.
pub fn write_text_archive(path: &Path, blocks: &[RawTextBlock]) -> Result<usize, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let mut seen = HashSet::new();
    for block in blocks {
        let name = unique_name(archive_entry_name(block), &mut seen);
        zip.start_file(name, options)?;
        zip.write_all(block.text.as_bytes())?;
    }
    zip.finish()?;

    log::info!("Archived {} page text(s) to {}", blocks.len(), path.display());

    Ok(blocks.len())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn names_entries_by_stem_and_page() {
        assert_eq!(
            archive_entry_name(&RawTextBlock::page("notice.pdf", 2, "")),
            "notice_p3.txt"
        );
        assert_eq!(
            archive_entry_name(&RawTextBlock::document("scan.PDF", "")),
            "scan.txt"
        );
    }

    #[test]
    fn archive_holds_one_entry_per_block_in_order() {
        let dir = std::env::temp_dir().join("case_tracker_archive_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("texts.zip");

        let blocks = vec![
            RawTextBlock::page("a.pdf", 0, "Case: A1"),
            RawTextBlock::page("a.pdf", 1, "Case: A2"),
            RawTextBlock::page("b.pdf", 0, "Case: B1"),
            RawTextBlock::page("dir/a.pdf", 0, "Case: A9"),
        ];
        assert_eq!(write_text_archive(&path, &blocks).unwrap(), 4);

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_owned())
            .collect();
        assert_eq!(names, vec!["a_p1.txt", "a_p2.txt", "b_p1.txt", "a_p1-2.txt"]);

        let mut text = String::new();
        archive
            .by_index(2)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "Case: B1");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
