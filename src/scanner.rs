use std::ops::RangeInclusive;

use crate::locale::parse_month;
use crate::workbook::{Cell, Grid};

pub const REVENUE_START: &str = "RÖRELSENS INTÄKTER";
pub const REVENUE_END: &str = "SUMMA RÖRELSENS INTÄKTER";
pub const EXPENSE_START: &str = "RÖRELSENS KOSTNADER";
pub const EXPENSE_END: &str = "SUMMA RÖRELSENS KOSTNADER";

pub const SECTION_MARKERS: [&str; 4] = [REVENUE_START, REVENUE_END, EXPENSE_START, EXPENSE_END];

/// A header row needs at least this many month cells.
const MIN_HEADER_MONTHS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthColumn {
    pub column: usize,
    pub month: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthHeader {
    pub row: usize,
    /// Sorted by column index.
    pub columns: Vec<MonthColumn>,
}

impl MonthHeader {
    pub fn data_start(&self) -> usize {
        self.row + 1
    }
}

/// Inclusive row ranges between paired section markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    pub revenue: Option<RangeInclusive<usize>>,
    pub expense: Option<RangeInclusive<usize>>,
}

impl Sections {
    pub fn is_empty(&self) -> bool {
        self.revenue.is_none() && self.expense.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub header: MonthHeader,
    pub sections: Sections,
}

/// First row with at least three month-name cells.
pub fn find_month_header(grid: &Grid) -> Option<MonthHeader> {
    for (row_idx, row) in grid.iter().enumerate() {
        let mut columns: Vec<MonthColumn> = row
            .iter()
            .enumerate()
            .filter_map(|(col, cell)| {
                let text = cell.as_text()?.trim();
                parse_month(text).map(|month| MonthColumn {
                    column: col,
                    month,
                    label: text.to_string(),
                })
            })
            .collect();
        if columns.len() >= MIN_HEADER_MONTHS {
            columns.sort_by_key(|c| c.column);
            return Some(MonthHeader {
                row: row_idx,
                columns,
            });
        }
    }
    None
}

fn first_column_upper(row: &[Cell]) -> String {
    row.first()
        .and_then(Cell::as_text)
        .map(|s| s.trim().to_uppercase())
        .unwrap_or_default()
}

fn section_between(grid: &Grid, start_marker: &str, end_marker: &str) -> Option<RangeInclusive<usize>> {
    let labels: Vec<String> = grid.iter().map(|row| first_column_upper(row)).collect();
    let start = labels.iter().position(|l| l == start_marker)?;
    let end = labels
        .iter()
        .skip(start + 1)
        .position(|l| l == end_marker)
        .map(|offset| start + 1 + offset)?;
    // An empty section (markers on adjacent rows) still counts as present.
    Some((start + 1)..=(end.saturating_sub(1)))
}

pub fn find_sections(grid: &Grid) -> Sections {
    Sections {
        revenue: section_between(grid, REVENUE_START, REVENUE_END),
        expense: section_between(grid, EXPENSE_START, EXPENSE_END),
    }
}

/// `None` when the sheet has no month header row.
pub fn scan(grid: &Grid) -> Option<SheetLayout> {
    let header = find_month_header(grid)?;
    Some(SheetLayout {
        header,
        sections: find_sections(grid),
    })
}
