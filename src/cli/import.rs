#![cfg_attr(not(feature = "xlsx"), allow(unused_imports, dead_code))]

use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{BokslutError, Result};
use crate::importer::{ReimportPolicy, RunOutcome, RunSummary, SheetStatus};
use crate::settings::load_settings;

/// Exit status for a run that did not import every sheet.
const PARTIAL_EXIT: i32 = 2;

#[cfg(feature = "xlsx")]
pub fn run(file: &str, append: bool, json: bool) -> Result<i32> {
    use crate::cli::open_store;
    use crate::importer::import_file;

    let file_path = PathBuf::from(file);
    if !file_path.is_file() {
        return Err(BokslutError::Other(format!("File not found: {file}")));
    }

    let mut options = load_settings().import_options();
    if append {
        options.policy = ReimportPolicy::Append;
    }

    let store = open_store()?;
    let result = import_file(&store, &file_path, &options)?;

    if json {
        let out = serde_json::to_string_pretty(&result.summary).map_err(|e| BokslutError::Other(e.to_string()))?;
        println!("{out}");
    } else {
        if let Some(previous) = &result.previous {
            println!(
                "{}",
                format!("Note: this file was already imported on {}.", previous.imported_at).yellow()
            );
        }
        print_summary(&result.summary);
        println!("Checksum: {}", &result.checksum[..12]);
    }

    Ok(if result.summary.is_success() { 0 } else { PARTIAL_EXIT })
}

#[cfg(not(feature = "xlsx"))]
pub fn run(file: &str, _append: bool, _json: bool) -> Result<i32> {
    Err(BokslutError::Workbook(format!(
        "cannot read {file}: bokslut was built without the `xlsx` feature"
    )))
}

fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Sheet", "Company", "Year", "Accounts", "Values", "Replaced", "Status"]);
    for sheet in &summary.per_sheet {
        let status = match &sheet.status {
            SheetStatus::Imported => "imported".green().to_string(),
            SheetStatus::Failed(reason) => format!("failed: {reason}").red().to_string(),
        };
        table.add_row(vec![
            Cell::new(&sheet.sheet_name),
            Cell::new(sheet.company.as_deref().unwrap_or("")),
            Cell::new(sheet.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(sheet.accounts_processed),
            Cell::new(sheet.values_processed),
            Cell::new(sheet.values_replaced),
            Cell::new(status),
        ]);
    }
    println!("{table}");

    for sheet in &summary.per_sheet {
        if sheet.diagnostics.is_empty() {
            continue;
        }
        println!("{}", sheet.sheet_name.bold());
        for diagnostic in &sheet.diagnostics {
            println!("  {diagnostic}");
        }
    }

    let line = format!(
        "{} sheets: {} imported, {} failed",
        summary.sheets_total, summary.sheets_succeeded, summary.sheets_failed
    );
    match summary.outcome {
        RunOutcome::Complete => println!("{}", line.green()),
        RunOutcome::Partial => println!("{}", line.yellow()),
        RunOutcome::Failed => println!("{}", line.red()),
    }
}
