//! Run settings.
//!
//! Loaded from an optional TOML file; every key has a default so an empty
//! file (or no file) is valid:
//!
//! ```toml
//! min_amount = 10000.0
//! ocr = true
//! ocr_language = "eng"
//! dedup_policy = "first_seen"
//! unmapped_columns = "drop"
//!
//! [aliases]
//! case_number = ["docket no", "file ref"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use case_tracker_case_models::{CanonicalField, DedupPolicy};
use case_tracker_pdf::OcrOptions;
use case_tracker_tabular::{HeaderNormalizer, UnmappedColumns};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Settings that shape a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Records below this amount (or without an amount) are left out of the
    /// filtered export. `None` disables filtering.
    pub min_amount: Option<f64>,
    /// OCR pages without a text layer.
    pub ocr: bool,
    /// Tesseract language code(s).
    pub ocr_language: String,
    /// Render resolution used for OCR.
    pub ocr_dpi: u32,
    /// Collapse records sharing a case number.
    pub dedupe: bool,
    /// Which record survives a collapse.
    pub dedup_policy: DedupPolicy,
    /// Keep or drop spreadsheet columns that match no alias.
    pub unmapped_columns: UnmappedColumns,
    /// Extract documents concurrently. Output order is unaffected.
    pub parallel_documents: bool,
    /// Extra header aliases, keyed by canonical column name.
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_amount: None,
            ocr: false,
            ocr_language: "eng".to_owned(),
            ocr_dpi: 300,
            dedupe: true,
            dedup_policy: DedupPolicy::FirstSeen,
            unmapped_columns: UnmappedColumns::PassThrough,
            parallel_documents: true,
            aliases: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the file cannot be read, is not valid
    /// TOML, or fails [`Self::validate`].
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_toml(&text)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Toml`] on malformed TOML or unknown keys, or
    /// [`PipelineError::Config`] on invalid values.
    pub fn from_toml(text: &str) -> Result<Self, PipelineError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks values that the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for a non-finite minimum amount, a
    /// zero OCR resolution, or an alias table keyed by an unknown column.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if let Some(min) = self.min_amount
            && !min.is_finite()
        {
            return Err(PipelineError::Config(format!(
                "min_amount must be a finite number, got {min}"
            )));
        }
        if self.ocr_dpi == 0 {
            return Err(PipelineError::Config("ocr_dpi must be positive".to_owned()));
        }
        if let Some(unknown) = self
            .aliases
            .keys()
            .find(|k| CanonicalField::from_column_name(k).is_none())
        {
            return Err(PipelineError::Config(format!(
                "aliases.{unknown} is not a canonical column (expected one of: {})",
                CanonicalField::ALL
                    .iter()
                    .map(|f| f.column_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        Ok(())
    }

    /// Builds the header normalizer for spreadsheet inputs.
    #[must_use]
    pub fn normalizer(&self) -> HeaderNormalizer {
        self.aliases.iter().fold(
            HeaderNormalizer::new(self.unmapped_columns),
            |normalizer, (column, names)| match CanonicalField::from_column_name(column) {
                Some(field) => normalizer.with_aliases(field, names),
                None => normalizer,
            },
        )
    }

    /// OCR options for document extraction. `available` is the result of
    /// probing for the OCR binaries.
    #[must_use]
    pub fn ocr_options(&self, available: bool) -> OcrOptions {
        OcrOptions {
            enabled: self.ocr && available,
            language: self.ocr_language.clone(),
            dpi: self.ocr_dpi,
        }
    }

    /// The dedup policy to apply, or `None` when deduplication is off.
    #[must_use]
    pub const fn effective_dedup(&self) -> Option<DedupPolicy> {
        if self.dedupe {
            Some(self.dedup_policy)
        } else {
            None
        }
    }
}
