use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::error::Result;
use crate::models::Category;
use crate::reports::list_accounts;

pub fn run(category: Option<Category>) -> Result<()> {
    let store = open_store()?;
    let accounts = list_accounts(store.conn(), category)?;

    let mut table = Table::new();
    table.set_header(vec!["Account", "Category", "Raw labels", "Confidence"]);
    for account in accounts {
        let labels: Vec<&str> = account.labels.iter().map(|(l, _)| l.as_str()).collect();
        let confidence = account
            .labels
            .iter()
            .map(|(_, c)| *c)
            .fold(None, |lowest: Option<f64>, c| Some(lowest.map_or(c, |l| l.min(c))));
        table.add_row(vec![
            Cell::new(account.name),
            Cell::new(account.category),
            Cell::new(labels.join("; ")),
            Cell::new(confidence.map(|c| format!("{c:.1}")).unwrap_or_default()),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
