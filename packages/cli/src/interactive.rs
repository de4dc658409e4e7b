//! Interactive session.
//!
//! A menu loop over a [`Session`]. Every change re-runs the pipeline and
//! prints a fresh summary. Input and OCR changes re-read the files; rule and
//! filter changes only re-process what is already loaded.

use std::path::{Path, PathBuf};

use case_tracker_cli_utils::{IndicatifProgress, MultiProgress};
use case_tracker_pipeline::{LoadedInputs, RunOutput, Session, Settings, null_progress};
use dialoguer::{Confirm, Input, Select};

use crate::summary::{print_summary, render_table};

/// Menu entries.
enum Action {
    AddFiles,
    ClearFiles,
    LoadRules,
    PasteRules,
    ResetRules,
    SetMinAmount,
    ToggleOcr,
    ToggleDedupe,
    ShowCases,
    Export,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::AddFiles,
        Self::ClearFiles,
        Self::LoadRules,
        Self::PasteRules,
        Self::ResetRules,
        Self::SetMinAmount,
        Self::ToggleOcr,
        Self::ToggleDedupe,
        Self::ShowCases,
        Self::Export,
        Self::Quit,
    ];

    fn label(&self, session: &Session) -> String {
        let on_off = |b: bool| if b { "on" } else { "off" };
        match self {
            Self::AddFiles => format!("Add files ({} loaded)", session.input_count()),
            Self::ClearFiles => "Clear files".to_owned(),
            Self::LoadRules => "Load rules from JSON".to_owned(),
            Self::PasteRules => "Paste rules JSON".to_owned(),
            Self::ResetRules => "Reset to built-in rules".to_owned(),
            Self::SetMinAmount => match session.settings.min_amount {
                Some(min) => format!("Set minimum amount (currently {min:.2})"),
                None => "Set minimum amount (currently none)".to_owned(),
            },
            Self::ToggleOcr => format!("Toggle OCR (currently {})", on_off(session.settings.ocr)),
            Self::ToggleDedupe => {
                format!("Toggle dedupe (currently {})", on_off(session.settings.dedupe))
            }
            Self::ShowCases => "Show all filtered cases".to_owned(),
            Self::Export => "Export".to_owned(),
            Self::Quit => "Quit".to_owned(),
        }
    }
}

/// What has to happen after a menu action.
enum Refresh {
    Nothing,
    Reprocess,
    Reload,
}

fn add_files(session: &mut Session) -> Result<Refresh, dialoguer::Error> {
    let paths: String = Input::new()
        .with_prompt("File path(s), comma-separated")
        .interact_text()?;

    let mut added = 0usize;
    for path in paths.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match session.add_input(PathBuf::from(path)) {
            Ok(kind) => {
                log::debug!("Added {path} as {kind:?}");
                added += 1;
            }
            Err(e) => println!("{e}"),
        }
    }

    Ok(if added > 0 { Refresh::Reload } else { Refresh::Nothing })
}

fn load_rules(session: &mut Session) -> Result<Refresh, dialoguer::Error> {
    let path: String = Input::new()
        .with_prompt("Rule file (JSON)")
        .interact_text()?;

    match session.load_rules(Path::new(path.trim())) {
        Ok(diagnostics) => {
            for diagnostic in diagnostics {
                println!("Rule rejected: {diagnostic}");
            }
            println!(
                "Loaded {} rule(s) for {} field(s)",
                session.rules.rule_count(),
                session.rules.field_count()
            );
            Ok(Refresh::Reprocess)
        }
        Err(e) => {
            println!("Rules unchanged: {e}");
            Ok(Refresh::Nothing)
        }
    }
}

fn paste_rules(session: &mut Session) -> Result<Refresh, dialoguer::Error> {
    let json: String = Input::new()
        .with_prompt("Rules JSON")
        .interact_text()?;
    Ok(apply_rules_json(session, &json))
}

/// Replaces the session's rules with `json`, keeping the current rules if
/// the document is malformed.
fn apply_rules_json(session: &mut Session, json: &str) -> Refresh {
    match session.set_rules_json(json) {
        Ok(diagnostics) => {
            for diagnostic in diagnostics {
                println!("Rule rejected: {diagnostic}");
            }
            println!(
                "Loaded {} rule(s) for {} field(s)",
                session.rules.rule_count(),
                session.rules.field_count()
            );
            Refresh::Reprocess
        }
        Err(e) => {
            println!("Rules unchanged: {e}");
            Refresh::Nothing
        }
    }
}

fn set_min_amount(session: &mut Session) -> Result<Refresh, dialoguer::Error> {
    let value: String = Input::new()
        .with_prompt("Minimum amount (empty for none)")
        .allow_empty(true)
        .interact_text()?;

    let value = value.trim();
    if value.is_empty() {
        session.settings.min_amount = None;
        return Ok(Refresh::Reprocess);
    }

    match case_tracker_extract::parse_amount(value) {
        Some(min) => {
            session.settings.min_amount = Some(min);
            Ok(Refresh::Reprocess)
        }
        None => {
            println!("Not an amount: {value}");
            Ok(Refresh::Nothing)
        }
    }
}

fn export(
    state: Option<&(LoadedInputs, RunOutput)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some((inputs, output)) = state else {
        println!("Nothing to export yet; add some files first.");
        return Ok(());
    };

    let dir: String = Input::new()
        .with_prompt("Output directory")
        .default(".".to_owned())
        .interact_text()?;
    let dir = PathBuf::from(dir.trim());

    let paths = case_tracker_export::export_all(&dir, output)?;
    println!("Wrote {}", paths.all.display());
    println!("Wrote {}", paths.filtered.display());

    let archive = !inputs.blocks.is_empty()
        && Confirm::new()
            .with_prompt("Also write a ZIP of the extracted page text?")
            .default(false)
            .interact()?;
    if archive {
        let name = format!(
            "case_texts_{}.zip",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(name);
        let entries = case_tracker_export::write_text_archive(&path, &inputs.blocks)?;
        println!("Wrote {} ({entries} page text(s))", path.display());
    }

    Ok(())
}

async fn reload(
    session: &Session,
    multi: &MultiProgress,
) -> Option<(LoadedInputs, RunOutput)> {
    if session.input_count() == 0 {
        println!("No files loaded.");
        return None;
    }

    let progress = if session.documents.is_empty() {
        null_progress()
    } else {
        IndicatifProgress::documents_bar(multi, "Extracting documents")
    };

    match session.execute(&progress).await {
        Ok((inputs, output)) => {
            print_summary(&output);
            Some((inputs, output))
        }
        Err(e) => {
            log::error!("Run failed: {e}");
            println!("Run failed: {e}");
            None
        }
    }
}

/// Runs the interactive menu until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails (for example when stdin is not a
/// terminal) or an export cannot be written.
#[allow(clippy::future_not_send)]
pub async fn run(
    settings: Settings,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Case Tracker");
    println!();

    let mut session = Session::new(settings);
    let mut state: Option<(LoadedInputs, RunOutput)> = None;

    loop {
        let labels: Vec<String> = Action::ALL.iter().map(|a| a.label(&session)).collect();

        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        let refresh = match Action::ALL[idx] {
            Action::AddFiles => add_files(&mut session)?,
            Action::ClearFiles => {
                session.clear_inputs();
                state = None;
                Refresh::Nothing
            }
            Action::LoadRules => load_rules(&mut session)?,
            Action::PasteRules => paste_rules(&mut session)?,
            Action::ResetRules => {
                session.reset_rules();
                Refresh::Reprocess
            }
            Action::SetMinAmount => set_min_amount(&mut session)?,
            Action::ToggleOcr => {
                session.settings.ocr = !session.settings.ocr;
                Refresh::Reload
            }
            Action::ToggleDedupe => {
                session.settings.dedupe = !session.settings.dedupe;
                Refresh::Reprocess
            }
            Action::ShowCases => {
                match &state {
                    Some((_, output)) => print!("{}", render_table(&output.filtered, None)),
                    None => println!("No results yet."),
                }
                Refresh::Nothing
            }
            Action::Export => {
                export(state.as_ref())?;
                Refresh::Nothing
            }
            Action::Quit => break,
        };

        match refresh {
            Refresh::Nothing => {}
            Refresh::Reprocess if state.is_some() => {
                state = state.take().map(|(inputs, _)| {
                    let output = session.process(&inputs);
                    print_summary(&output);
                    (inputs, output)
                });
            }
            Refresh::Reprocess | Refresh::Reload => {
                state = reload(&session, multi).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pasted_rules_replace_the_rule_set() {
        let mut session = Session::new(Settings::default());
        let refresh = apply_rules_json(&mut session, r#"{"case_number": "Case:\\s*(\\S+)"}"#);
        assert!(matches!(refresh, Refresh::Reprocess));
        assert_eq!(session.rules.rule_count(), 1);
        assert_eq!(session.rules.field_count(), 1);
    }

    #[test]
    fn malformed_pasted_rules_keep_current_set() {
        let mut session = Session::new(Settings::default());
        let before = session.rules.rule_count();
        let refresh = apply_rules_json(&mut session, "{\"case_number\": ");
        assert!(matches!(refresh, Refresh::Nothing));
        assert_eq!(session.rules.rule_count(), before);
    }

    #[test]
    fn every_action_has_a_label() {
        let session = Session::new(Settings::default());
        let labels: Vec<String> = Action::ALL.iter().map(|a| a.label(&session)).collect();
        assert!(labels.contains(&"Paste rules JSON".to_owned()));
        assert_eq!(labels.len(), Action::ALL.len());
    }
}
