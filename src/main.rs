mod categorizer;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod locale;
mod models;
mod reports;
mod scanner;
mod settings;
mod sheet_name;
mod store;
mod upsert;
mod workbook;

use clap::Parser;
use env_logger::{Builder, Env};

use cli::{BudgetCommands, Cli, Commands, MappingCommands, ReportCommands};

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Run one command; the value is the process exit status.
fn dispatch(command: Commands) -> error::Result<i32> {
    match command {
        Commands::Init { data_dir } => cli::init::run(data_dir)?,
        Commands::Import { file, append, json } => return cli::import::run(&file, append, json),
        Commands::Companies => cli::companies::run()?,
        Commands::Accounts { category } => cli::accounts::run(category)?,
        Commands::Mapping { command } => match command {
            MappingCommands::List { unmapped } => cli::mapping::list(unmapped)?,
            MappingCommands::Set {
                label,
                account,
                category,
                create,
            } => cli::mapping::set(&label, &account, category, create)?,
            MappingCommands::Remove { label } => cli::mapping::remove(&label)?,
            MappingCommands::Stats => cli::mapping::stats()?,
        },
        Commands::Budget { command } => match command {
            BudgetCommands::Set {
                company,
                year,
                account,
                category,
                month,
                amount,
            } => cli::budget::set(&company, year, &account, category, &month, amount)?,
            BudgetCommands::Show { company, year } => cli::budget::show(&company, year)?,
        },
        Commands::Report { command } => match command {
            ReportCommands::Summary { company, year, budget } => cli::report::summary(&company, year, budget)?,
            ReportCommands::Compare { company, year } => cli::report::compare(&company, year)?,
            ReportCommands::Top {
                company,
                year,
                category,
                limit,
            } => cli::report::top(&company, year, category, limit)?,
            ReportCommands::Seasonality {
                company,
                account,
                category,
            } => cli::report::seasonality(&company, &account, category)?,
        },
        Commands::Export { company, year, output } => cli::export::run(&company, year, output)?,
        Commands::Status => cli::status::run()?,
    }
    Ok(0)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match dispatch(cli.command) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
