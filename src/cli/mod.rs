pub mod accounts;
pub mod budget;
pub mod companies;
pub mod export;
pub mod import;
pub mod init;
pub mod mapping;
pub mod report;
pub mod status;

use clap::{Parser, Subcommand};

use crate::db::SqliteStore;
use crate::error::Result;
use crate::models::Category;
use crate::settings::load_settings;

/// Open the configured database, creating the schema if it is missing.
pub(crate) fn open_store() -> Result<SqliteStore> {
    let settings = load_settings();
    std::fs::create_dir_all(&settings.data_dir)?;
    SqliteStore::open(&settings.db_path())
}

#[derive(Parser)]
#[command(
    name = "bokslut",
    version,
    about = "Import Swedish monthly ledger workbooks into a local SQLite ledger."
)]
pub struct Cli {
    /// Show per-row import decisions.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,
    /// Only print errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for bokslut data (default: ~/Documents/bokslut)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import every '<company> <year>' sheet of an Excel workbook.
    Import {
        /// Path to the .xlsx/.xls/.ods workbook
        file: String,
        /// Keep existing actual values instead of replacing them
        #[arg(long)]
        append: bool,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List companies and their imported years.
    Companies,
    /// List accounts with the raw labels mapped to them.
    Accounts {
        /// Only show one category: revenue or expense
        #[arg(long)]
        category: Option<Category>,
    },
    /// Inspect and correct raw-label mappings.
    Mapping {
        #[command(subcommand)]
        command: MappingCommands,
    },
    /// Edit and show budget values.
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export every value of one company year to CSV.
    Export {
        #[arg(long)]
        company: String,
        #[arg(long)]
        year: i32,
        /// Output file path (default: <data_dir>/exports/<company>-<year>.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show current settings, database and row counts.
    Status,
}

#[derive(Subcommand)]
pub enum MappingCommands {
    /// List raw labels and the accounts they map to.
    List {
        /// Only show labels without a mapping
        #[arg(long)]
        unmapped: bool,
    },
    /// Map a raw label to an account by hand.
    Set {
        #[arg(long)]
        label: String,
        #[arg(long)]
        account: String,
        /// revenue or expense
        #[arg(long)]
        category: Category,
        /// Create the account if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// Remove every mapping of a raw label.
    Remove {
        #[arg(long)]
        label: String,
    },
    /// Count automatic, manual and unmapped labels.
    Stats,
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set one monthly budget value. An amount of 0 removes it.
    Set {
        #[arg(long)]
        company: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        account: String,
        /// revenue or expense
        #[arg(long)]
        category: Category,
        /// Month number or name, e.g. 3, Mar, Mars
        #[arg(long)]
        month: String,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },
    /// Show the budget of one company year.
    Show {
        #[arg(long)]
        company: String,
        #[arg(long)]
        year: i32,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Monthly revenue, expenses and result.
    Summary {
        #[arg(long)]
        company: String,
        #[arg(long)]
        year: i32,
        /// Summarize budget values instead of actuals
        #[arg(long)]
        budget: bool,
    },
    /// Actual vs budget per account.
    Compare {
        #[arg(long)]
        company: String,
        #[arg(long)]
        year: i32,
    },
    /// Largest accounts of one category.
    Top {
        #[arg(long)]
        company: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        category: Category,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Monthly seasonality index of one account across years.
    Seasonality {
        #[arg(long)]
        company: String,
        #[arg(long)]
        account: String,
        #[arg(long)]
        category: Category,
    },
}
