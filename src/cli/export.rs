use std::path::PathBuf;

use crate::cli::open_store;
use crate::error::Result;
use crate::reports::dataset_values;
use crate::settings::load_settings;
use crate::store::LedgerStore;

fn default_path(company: &str, year: i32) -> PathBuf {
    let slug: String = company
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    PathBuf::from(load_settings().data_dir)
        .join("exports")
        .join(format!("{slug}-{year}.csv"))
}

pub fn run(company: &str, year: i32, output: Option<String>) -> Result<()> {
    let store = open_store()?;
    let dataset = store.dataset(company, year)?;
    let values = dataset_values(store.conn(), dataset.id, None)?;

    let path = output.map(PathBuf::from).unwrap_or_else(|| default_path(company, year));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["company", "year", "account", "category", "month", "value_type", "amount"])?;
    let year_text = year.to_string();
    for v in &values {
        let month = v.month.to_string();
        let amount = v.amount.to_string();
        writer.write_record([
            company,
            year_text.as_str(),
            v.account.as_str(),
            v.category.as_str(),
            month.as_str(),
            v.value_type.as_str(),
            amount.as_str(),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {} values to {}", values.len(), path.display());
    Ok(())
}
