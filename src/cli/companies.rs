use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::error::Result;
use crate::reports::list_companies;

pub fn run() -> Result<()> {
    let store = open_store()?;
    let companies = list_companies(store.conn())?;
    if companies.is_empty() {
        println!("No companies yet. Import a workbook with `bokslut import FILE`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Company", "Location", "Years"]);
    for company in companies {
        let years: Vec<String> = company.years.iter().map(i32::to_string).collect();
        table.add_row(vec![
            Cell::new(company.name),
            Cell::new(company.location.unwrap_or_default()),
            Cell::new(years.join(", ")),
        ]);
    }
    println!("Companies\n{table}");
    Ok(())
}
