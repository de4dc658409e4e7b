//! The explicit state of an interactive session.
//!
//! A [`Session`] holds the inputs, rules and settings the user has chosen
//! so far. Nothing else is kept between runs; every change is followed by a
//! fresh [`Session::execute`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use case_tracker_extract::{RuleDiagnostic, RuleSet};
use case_tracker_tabular::is_spreadsheet;

use crate::load::{LoadedInputs, load_inputs};
use crate::progress::ProgressCallback;
use crate::run::{RunOutput, run};
use crate::settings::Settings;
use crate::PipelineError;

/// How an input file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// CSV/TSV/Excel case list.
    Spreadsheet,
    /// PDF document.
    Document,
}

impl InputKind {
    /// Classifies a path by extension.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        {
            Some(Self::Document)
        } else if is_spreadsheet(path) {
            Some(Self::Spreadsheet)
        } else {
            None
        }
    }
}

/// Inputs, rules and settings for a run.
#[derive(Debug, Clone)]
pub struct Session {
    /// Spreadsheets in upload order.
    pub spreadsheets: Vec<PathBuf>,
    /// PDFs in upload order.
    pub documents: Vec<PathBuf>,
    /// Active extraction rules.
    pub rules: RuleSet,
    /// Rules rejected when the active rule set was loaded.
    pub rule_diagnostics: Vec<RuleDiagnostic>,
    /// Active settings.
    pub settings: Settings,
}

impl Session {
    /// Creates an empty session using the built-in rules.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            spreadsheets: Vec::new(),
            documents: Vec::new(),
            rules: RuleSet::default_rules(),
            rule_diagnostics: Vec::new(),
            settings,
        }
    }

    /// Adds an input file, routing it by extension.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnsupportedInput`] if the extension is
    /// neither PDF nor a spreadsheet format.
    pub fn add_input(&mut self, path: PathBuf) -> Result<InputKind, PipelineError> {
        let kind = InputKind::of(&path)
            .ok_or_else(|| PipelineError::UnsupportedInput(path.display().to_string()))?;
        match kind {
            InputKind::Spreadsheet => self.spreadsheets.push(path),
            InputKind::Document => self.documents.push(path),
        }
        Ok(kind)
    }

    /// Removes all inputs, keeping rules and settings.
    pub fn clear_inputs(&mut self) {
        self.spreadsheets.clear();
        self.documents.clear();
    }

    /// Number of input files.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.spreadsheets.len() + self.documents.len()
    }

    /// Replaces the rule set from a JSON document.
    ///
    /// On malformed JSON the current rules are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Rules`] if the document is malformed.
    pub fn set_rules_json(&mut self, json: &str) -> Result<&[RuleDiagnostic], PipelineError> {
        let (rules, diagnostics) = RuleSet::from_json(json)?;
        self.rules = rules;
        self.rule_diagnostics = diagnostics;
        Ok(&self.rule_diagnostics)
    }

    /// Replaces the rule set from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Rules`] if the file cannot be read or is
    /// malformed.
    pub fn load_rules(&mut self, path: &Path) -> Result<&[RuleDiagnostic], PipelineError> {
        let (rules, diagnostics) = case_tracker_extract::load_rules(path)?;
        self.rules = rules;
        self.rule_diagnostics = diagnostics;
        Ok(&self.rule_diagnostics)
    }

    /// Restores the built-in rules.
    pub fn reset_rules(&mut self) {
        self.rules = RuleSet::default_rules();
        self.rule_diagnostics.clear();
    }

    /// Reads every input from disk.
    ///
    /// # Errors
    ///
    /// See [`load_inputs`].
    pub async fn load(
        &self,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<LoadedInputs, PipelineError> {
        load_inputs(self, progress).await
    }

    /// Runs the pipeline over already-loaded inputs with the session's
    /// current rules and settings.
    #[must_use]
    pub fn process(&self, inputs: &LoadedInputs) -> RunOutput {
        let mut output = run(inputs, &self.rules, &self.settings);
        output
            .diagnostics
            .rule_diagnostics
            .clone_from(&self.rule_diagnostics);
        output
    }

    /// Loads inputs and runs the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] on fatal input failures.
    pub async fn execute(
        &self,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<(LoadedInputs, RunOutput), PipelineError> {
        let inputs = self.load(progress).await?;
        let output = self.process(&inputs);
        Ok((inputs, output))
    }
}
