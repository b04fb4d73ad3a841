use thiserror::Error;

#[derive(Error, Debug)]
pub enum BokslutError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Unknown company: {0}")]
    UnknownCompany(String),

    #[error("No dataset for {company} {year}")]
    UnknownDataset { company: String, year: i32 },

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Invalid month: {0} (expected 1-12 or a month name)")]
    InvalidMonth(String),

    #[error("Invalid category: {0} (expected revenue or expense)")]
    InvalidCategory(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BokslutError>;
