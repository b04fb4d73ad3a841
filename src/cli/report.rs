use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::error::Result;
use crate::fmt::{percent, sek};
use crate::locale::month_name;
use crate::models::{Category, ValueType};
use crate::reports;
use crate::store::LedgerStore;

fn signed(amount: f64) -> String {
    if amount >= 0.0 {
        sek(amount).green().to_string()
    } else {
        sek(amount).red().to_string()
    }
}

pub fn summary(company: &str, year: i32, budget: bool) -> Result<()> {
    let store = open_store()?;
    let dataset = store.dataset(company, year)?;
    let value_type = if budget { ValueType::Budget } else { ValueType::Actual };
    let months = reports::monthly_summary(store.conn(), dataset.id, value_type)?;

    let mut table = Table::new();
    table.set_header(vec!["Month", "Revenue", "Expenses", "Result"]);
    for m in &months {
        table.add_row(vec![
            Cell::new(month_name(m.month)),
            Cell::new(sek(m.revenue)),
            Cell::new(sek(m.expense)),
            Cell::new(signed(m.result)),
        ]);
    }
    let revenue: f64 = months.iter().map(|m| m.revenue).sum();
    let expense: f64 = months.iter().map(|m| m.expense).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(sek(revenue)),
        Cell::new(sek(expense)),
        Cell::new(signed(revenue + expense)),
    ]);
    println!("{} {company} {year} ({value_type})\n{table}", "Monthly summary".bold());
    Ok(())
}

pub fn compare(company: &str, year: i32) -> Result<()> {
    let store = open_store()?;
    let dataset = store.dataset(company, year)?;
    let lines = reports::budget_comparison(store.conn(), dataset.id)?;

    let mut table = Table::new();
    table.set_header(vec!["Account", "Category", "Actual", "Budget", "Variance", "Variance %"]);
    for line in &lines {
        table.add_row(vec![
            Cell::new(&line.account),
            Cell::new(line.category),
            Cell::new(sek(line.actual)),
            Cell::new(sek(line.budget)),
            Cell::new(signed(line.variance)),
            Cell::new(percent(line.variance, line.budget.abs())),
        ]);
    }
    println!("{} {company} {year}\n{table}", "Actual vs budget".bold());
    Ok(())
}

pub fn top(company: &str, year: i32, category: Category, limit: usize) -> Result<()> {
    let store = open_store()?;
    let dataset = store.dataset(company, year)?;
    let accounts = reports::top_accounts(store.conn(), dataset.id, category, limit)?;
    let total: f64 = accounts.iter().map(|a| a.total).sum();

    let mut table = Table::new();
    table.set_header(vec!["Account", "Total", "Share"]);
    for a in &accounts {
        table.add_row(vec![
            Cell::new(&a.account),
            Cell::new(sek(a.total)),
            Cell::new(percent(a.total, total)),
        ]);
    }
    println!("{} {company} {year}\n{table}", format!("Top {category}").bold());
    Ok(())
}

pub fn seasonality(company: &str, account: &str, category: Category) -> Result<()> {
    let store = open_store()?;
    let company_row = store.company(company)?;
    let account_id = reports::find_account_id(store.conn(), account, category)?;
    let data = reports::seasonality_indices(store.conn(), company_row.id, account_id)?;
    if data.years.is_empty() {
        println!("No actual values for {account} at {company}.");
        return Ok(());
    }

    let mut header = vec!["Month".to_string()];
    header.extend(data.years.iter().map(|y| y.year.to_string()));
    header.push("Average".to_string());

    let mut table = Table::new();
    table.set_header(header);
    for (month, average) in &data.average {
        let mut row = vec![Cell::new(month_name(*month))];
        for year in &data.years {
            let index = year.indices.iter().find(|(m, _)| m == month).map(|(_, i)| *i);
            row.push(Cell::new(index.map(|i| format!("{i:.2}")).unwrap_or_default()));
        }
        row.push(Cell::new(format!("{average:.2}").bold()));
        table.add_row(row);
    }
    println!("{} {account} ({company})\n{table}", "Seasonality index".bold());
    Ok(())
}
