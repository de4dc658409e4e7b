#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case extraction pipeline.
//!
//! A [`Session`] holds the user's inputs, rules and [`Settings`].
//! [`load_inputs`] reads spreadsheets and PDFs from disk, then [`run`]
//! turns them into two case tables: every deduplicated record, and the
//! subset at or above the configured minimum amount.

pub mod dedup;
pub mod load;
pub mod orchestrator;
pub mod progress;
pub mod run;
pub mod session;
pub mod settings;

pub use dedup::{Processed, dedup, filter_min_amount, process};
pub use load::{DocumentFailure, LoadedInputs, load_inputs};
pub use orchestrator::{Orchestrated, orchestrate};
pub use progress::{NullProgress, ProgressCallback, null_progress};
pub use run::{Diagnostics, RunOutput, run};
pub use session::{InputKind, Session};
pub use settings::Settings;

use case_tracker_extract::RuleError;
use case_tracker_tabular::TabularError;

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The rule set could not be loaded.
    #[error(transparent)]
    Rules(#[from] RuleError),

    /// A spreadsheet could not be read.
    #[error("Failed to read {path}: {source}")]
    Spreadsheet {
        /// Path of the spreadsheet.
        path: String,
        /// Underlying error.
        #[source]
        source: TabularError,
    },

    /// The settings are invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The settings file is not valid TOML.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input file type is not supported.
    #[error("Unsupported input file: {0}")]
    UnsupportedInput(String),
}
