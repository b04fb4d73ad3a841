use std::fmt;

use serde::Serialize;

use crate::error::BokslutError;

/// Top-level account category. Persisted as its English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Revenue,
    Expense,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Revenue, Category::Expense];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::Expense => "Expense",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Revenue => "All revenue items",
            Self::Expense => "All expense items",
        }
    }

    /// Accepts the stored name as well as Swedish and lower-case spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "revenue" | "income" | "intäkter" => Some(Self::Revenue),
            "expense" | "expenses" | "kostnader" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = BokslutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| BokslutError::InvalidCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Actual,
    Budget,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actual => "actual",
            Self::Budget => "budget",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub id: i64,
    pub company_id: i64,
    pub year: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}

/// Month figures for one data row, before any store interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub row_index: usize,
    pub raw_label: String,
    pub account_name: String,
    /// (month 1-12, amount); only present, non-zero cells.
    pub values: Vec<(u32, f64)>,
}

/// A recoverable problem found while importing a sheet. Row numbers are
/// zero-based grid indices; `Display` shows them as spreadsheet rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    UnparseableSheetName { title: String },
    NoMonthHeader,
    MissingSections,
    UnconvertibleCell { row: usize, month: u32, raw: String },
    SkippedLabel { row: usize, label: String },
    EmptyRow { row: usize, label: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparseableSheetName { title } => {
                write!(f, "sheet name '{title}' does not match '<company> <year>'")
            }
            Self::NoMonthHeader => f.write_str("no row with at least three month names"),
            Self::MissingSections => {
                f.write_str("no section markers; classifying by keywords and value signs")
            }
            Self::UnconvertibleCell { row, month, raw } => write!(
                f,
                "row {}: {} value '{raw}' is not a number",
                row + 1,
                crate::locale::month_name(*month)
            ),
            Self::SkippedLabel { row, label } => write!(f, "row {}: skipped summary row '{label}'", row + 1),
            Self::EmptyRow { row, label } => write!(f, "row {}: '{label}' has no values", row + 1),
        }
    }
}
