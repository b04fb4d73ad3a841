use log::debug;

use crate::categorizer::{account_name, Classification};
use crate::error::{BokslutError, Result};
use crate::locale::{normalize_amount, Amount};
use crate::models::{Category, Diagnostic, ParsedRow, ValueType};
use crate::scanner::MonthHeader;
use crate::store::LedgerStore;
use crate::workbook::{Cell, Grid};

/// Budget amounts this close to zero delete the cell instead of storing it.
pub const ZERO_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Row extraction
// ---------------------------------------------------------------------------

/// Walk the rows below the month header and collect the data rows.
/// Summary rows, blank labels and rows without values are dropped here.
pub fn extract_rows(grid: &Grid, header: &MonthHeader) -> (Vec<ParsedRow>, Vec<Diagnostic>) {
    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();

    for (row_index, row) in grid.iter().enumerate().skip(header.data_start()) {
        let raw_label = row.first().map(Cell::label).unwrap_or_default();
        let Some(name) = account_name(&raw_label) else {
            if !raw_label.trim().is_empty() {
                diagnostics.push(Diagnostic::SkippedLabel {
                    row: row_index,
                    label: raw_label.trim().to_string(),
                });
            }
            continue;
        };

        let mut values = Vec::new();
        for col in &header.columns {
            let cell = row.get(col.column).unwrap_or(&Cell::Empty);
            match normalize_amount(cell) {
                Amount::Value(v) if v != 0.0 => values.push((col.month, v)),
                Amount::Value(_) | Amount::Blank => {}
                Amount::Unconvertible(raw) => {
                    debug!("row {}: cannot convert {} value {raw:?}", row_index + 1, col.label);
                    diagnostics.push(Diagnostic::UnconvertibleCell {
                        row: row_index,
                        month: col.month,
                        raw,
                    });
                }
            }
        }

        if values.is_empty() {
            diagnostics.push(Diagnostic::EmptyRow {
                row: row_index,
                label: name,
            });
            continue;
        }

        rows.push(ParsedRow {
            row_index,
            raw_label,
            account_name: name,
            values,
        });
    }

    (rows, diagnostics)
}

// ---------------------------------------------------------------------------
// Dimension and fact upserts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CategoryIds {
    pub revenue: i64,
    pub expense: i64,
}

impl CategoryIds {
    pub fn resolve<S: LedgerStore + ?Sized>(store: &S) -> Result<Self> {
        Ok(Self {
            revenue: store.find_or_create_category(Category::Revenue)?,
            expense: store.find_or_create_category(Category::Expense)?,
        })
    }

    pub fn get(&self, category: Category) -> i64 {
        match category {
            Category::Revenue => self.revenue,
            Category::Expense => self.expense,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowOutcome {
    pub account_id: i64,
    pub values_written: usize,
}

/// Reuse or create the account and its raw-label mapping, then write one
/// actual fact per month value.
pub fn upsert_row<S: LedgerStore + ?Sized>(
    store: &S,
    dataset_id: i64,
    categories: &CategoryIds,
    row: &ParsedRow,
    classification: Classification,
) -> Result<RowOutcome> {
    let category_id = categories.get(classification.category);
    let account_id = store.find_or_create_account(&row.account_name, category_id)?;
    store.create_or_reuse_raw_label_mapping(&row.raw_label, account_id, classification.basis.confidence())?;
    insert_actuals(store, dataset_id, account_id, row)
}

/// Write the row's facts to the account its raw label is manually mapped to.
pub fn upsert_mapped_row<S: LedgerStore + ?Sized>(
    store: &S,
    dataset_id: i64,
    account_id: i64,
    row: &ParsedRow,
) -> Result<RowOutcome> {
    insert_actuals(store, dataset_id, account_id, row)
}

fn insert_actuals<S: LedgerStore + ?Sized>(
    store: &S,
    dataset_id: i64,
    account_id: i64,
    row: &ParsedRow,
) -> Result<RowOutcome> {
    let mut values_written = 0usize;
    for (month, amount) in &row.values {
        store.insert_value(dataset_id, account_id, *month, ValueType::Actual, *amount)?;
        values_written += 1;
    }
    Ok(RowOutcome {
        account_id,
        values_written,
    })
}

// ---------------------------------------------------------------------------
// Budget cell edits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetSave {
    Inserted(i64),
    Updated(i64),
    Deleted(i64),
    /// Zero amount and nothing stored: no write happened.
    Skipped,
}

/// Upsert one budget cell keyed by (dataset, account, month). A zero amount
/// removes the cell.
pub fn save_budget_value<S: LedgerStore + ?Sized>(
    store: &S,
    dataset_id: i64,
    account_id: i64,
    month: u32,
    amount: f64,
) -> Result<BudgetSave> {
    if !(1..=12).contains(&month) {
        return Err(BokslutError::InvalidMonth(month.to_string()));
    }
    let existing = store.find_budget_value(dataset_id, account_id, month)?;

    if amount.abs() <= ZERO_TOLERANCE {
        return match existing {
            Some(id) => {
                store.delete_value(id)?;
                Ok(BudgetSave::Deleted(id))
            }
            None => Ok(BudgetSave::Skipped),
        };
    }

    match existing {
        Some(id) => {
            store.update_value(id, amount)?;
            Ok(BudgetSave::Updated(id))
        }
        None => {
            let id = store.insert_value(dataset_id, account_id, month, ValueType::Budget, amount)?;
            Ok(BudgetSave::Inserted(id))
        }
    }
}
