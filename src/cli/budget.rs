use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::error::{BokslutError, Result};
use crate::fmt::sek;
use crate::locale::{month_name, parse_month_arg, MONTH_NAMES};
use crate::models::{Category, ValueType};
use crate::reports::{dataset_values, find_account_id};
use crate::store::LedgerStore;
use crate::upsert::{save_budget_value, BudgetSave, ZERO_TOLERANCE};

pub fn set(company: &str, year: i32, account: &str, category: Category, month: &str, amount: f64) -> Result<()> {
    let month = parse_month_arg(month).ok_or_else(|| BokslutError::InvalidMonth(month.to_string()))?;
    let store = open_store()?;
    let company_row = store.company(company)?;
    let account_id = find_account_id(store.conn(), account, category)?;
    let label = format!("{company} {year} {account} {}", month_name(month));

    // Removing a cell never creates the dataset it would live in.
    let dataset_id = if amount.abs() <= ZERO_TOLERANCE {
        match store.find_dataset(company_row.id, year)? {
            Some(dataset) => dataset.id,
            None => {
                println!("No budget stored for {label}; nothing to remove.");
                return Ok(());
            }
        }
    } else {
        store.find_or_create_dataset(company_row.id, year, &format!("{company} {year}"))?
    };

    match save_budget_value(&store, dataset_id, account_id, month, amount)? {
        BudgetSave::Inserted(_) => println!("Budget set: {label} = {}", sek(amount)),
        BudgetSave::Updated(_) => println!("Budget updated: {label} = {}", sek(amount)),
        BudgetSave::Deleted(_) => println!("Budget removed: {label}"),
        BudgetSave::Skipped => println!("No budget stored for {label}; nothing to remove."),
    }
    Ok(())
}

pub fn show(company: &str, year: i32) -> Result<()> {
    let store = open_store()?;
    let dataset = store.dataset(company, year)?;
    let values = dataset_values(store.conn(), dataset.id, Some(ValueType::Budget))?;
    if values.is_empty() {
        println!("No budget for {company} {year}.");
        return Ok(());
    }

    // Values arrive ordered by category and account.
    let mut rows: Vec<(String, String, [f64; 12])> = Vec::new();
    for v in values {
        let same = rows
            .last()
            .is_some_and(|(category, account, _)| *category == v.category && *account == v.account);
        if !same {
            rows.push((v.category.clone(), v.account.clone(), [0.0; 12]));
        }
        if let Some((_, _, months)) = rows.last_mut() {
            months[v.month as usize - 1] += v.amount;
        }
    }

    let mut header = vec!["Account".to_string()];
    header.push("Category".to_string());
    header.extend(MONTH_NAMES.iter().map(|m| m.to_string()));
    header.push("Total".to_string());

    let mut table = Table::new();
    table.set_header(header);
    for (category, account, months) in rows {
        let mut row = vec![Cell::new(account), Cell::new(category)];
        row.extend(months.iter().map(|v| Cell::new(sek(*v))));
        row.push(Cell::new(sek(months.iter().sum())));
        table.add_row(row);
    }
    println!("Budget {company} {year}\n{table}");
    Ok(())
}
