use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::error::{BokslutError, Result};
use crate::fmt::percent;
use crate::models::Category;
use crate::reports::{list_mappings, mapping_stats};
use crate::store::LedgerStore;

pub fn list(unmapped: bool) -> Result<()> {
    let store = open_store()?;
    let rows = list_mappings(store.conn(), unmapped)?;
    if rows.is_empty() {
        if unmapped {
            println!("Every raw label is mapped.");
        } else {
            println!("No raw labels yet. Import a workbook with `bokslut import FILE`.");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Raw label", "Account", "Category", "Confidence", "Source"]);
    for row in rows {
        let (account, category) = row.account.unwrap_or_default();
        let source = match (row.confidence, row.manual) {
            (None, _) => "unmapped".yellow().to_string(),
            (Some(_), true) => "manual".to_string(),
            (Some(_), false) => "auto".to_string(),
        };
        table.add_row(vec![
            Cell::new(row.label),
            Cell::new(account),
            Cell::new(category),
            Cell::new(row.confidence.map(|c| format!("{c:.1}")).unwrap_or_default()),
            Cell::new(source),
        ]);
    }
    println!("Raw-label mappings\n{table}");
    Ok(())
}

/// Pin a raw label to an account. Later imports book the label's rows there
/// instead of classifying them.
pub fn set(label: &str, account: &str, category: Category, create: bool) -> Result<()> {
    let label = label.trim();
    let account = account.trim();
    if label.is_empty() || account.is_empty() {
        return Err(BokslutError::Other("Label and account must not be empty".into()));
    }

    let store = open_store()?;
    let category_id = store.find_or_create_category(category)?;
    let account_id = match store.find_account(account, category_id)? {
        Some(existing) => existing.id,
        None if create => {
            let id = store.find_or_create_account(account, category_id)?;
            println!("Created account {account} ({category})");
            id
        }
        None => {
            return Err(BokslutError::UnknownAccount(format!(
                "{account} ({category}); pass --create to add it"
            )))
        }
    };

    store.set_manual_mapping(label, account_id)?;
    println!("Mapped '{label}' -> {account} ({category})");
    Ok(())
}

pub fn remove(label: &str) -> Result<()> {
    let store = open_store()?;
    let removed = store.remove_mappings(label.trim())?;
    if removed == 0 {
        println!("No mappings for '{}'.", label.trim());
    } else {
        println!("Removed {removed} mapping(s) for '{}'.", label.trim());
    }
    Ok(())
}

pub fn stats() -> Result<()> {
    let store = open_store()?;
    let stats = mapping_stats(store.conn())?;
    let total = stats.total_labels as f64;
    println!("Raw labels:    {}", stats.total_labels);
    println!(
        "Mapped:        {} ({})",
        stats.mapped_labels,
        percent(stats.mapped_labels as f64, total)
    );
    println!("  automatic:   {}", stats.auto_mapped);
    println!("  manual:      {}", stats.manual_mapped);
    println!("Unmapped:      {}", stats.unmapped_labels);
    Ok(())
}
