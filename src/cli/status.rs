use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{load_settings, settings_file_exists};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!(
        "Settings:   {}",
        if settings_file_exists() { "saved" } else { "(defaults)" }
    );
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Location:   {}", settings.default_location);
    println!("Re-import:  {}", settings.reimport_policy.as_str());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
        };
        let actual: i64 = conn.query_row(
            "SELECT count(*) FROM ledger_values WHERE value_type = 'actual'",
            [],
            |r| r.get(0),
        )?;
        let budget: i64 = conn.query_row(
            "SELECT count(*) FROM ledger_values WHERE value_type = 'budget'",
            [],
            |r| r.get(0),
        )?;

        println!();
        println!("Companies:     {}", count("companies")?);
        println!("Datasets:      {}", count("datasets")?);
        println!("Accounts:      {}", count("accounts")?);
        println!("Raw labels:    {}", count("raw_labels")?);
        println!("Actual values: {actual}");
        println!("Budget values: {budget}");
        println!("Imports:       {}", count("import_runs")?);
    } else {
        println!();
        println!("Database not found. Run `bokslut init` to set up.");
    }

    Ok(())
}
