//! Minimal read access to spreadsheet workbooks: sheet names plus an
//! un-headered grid of cells per sheet.

use crate::error::Result;
#[cfg(feature = "xlsx")]
use crate::error::BokslutError;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Cell content as label text. Whole numbers print without a fraction
    /// so account numbers like 3010 survive.
    pub fn label(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Rows of cells; row and column indices match the sheet's own positions.
pub type Grid = Vec<Vec<Cell>>;

pub trait Workbook {
    fn sheet_names(&self) -> Vec<String>;
    fn read_sheet(&mut self, name: &str) -> Result<Grid>;
}

// ---------------------------------------------------------------------------
// In-memory workbook
// ---------------------------------------------------------------------------

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, Grid)>,
}

#[cfg(test)]
impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, grid: Grid) -> Self {
        self.sheets.push((name.to_string(), grid));
        self
    }
}

#[cfg(test)]
impl Workbook for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Grid> {
        Ok(self
            .sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, grid)| grid.clone())
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Excel workbook (calamine)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
pub struct ExcelWorkbook {
    inner: calamine::Sheets<std::io::BufReader<std::fs::File>>,
}

#[cfg(feature = "xlsx")]
impl ExcelWorkbook {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let inner = calamine::open_workbook_auto(path)
            .map_err(|e| BokslutError::Workbook(format!("Failed to open {}: {e}", path.display())))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "xlsx")]
impl Workbook for ExcelWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        use calamine::Reader;
        self.inner.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Grid> {
        use calamine::Reader;
        let range = self
            .inner
            .worksheet_range(name)
            .map_err(|e| BokslutError::Workbook(format!("Failed to read sheet '{name}': {e}")))?;

        // The range starts at the first used cell; pad so indices are absolute.
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        let mut grid: Grid = vec![Vec::new(); row_offset as usize];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col_offset as usize];
            cells.extend(row.iter().map(convert_cell));
            grid.push(cells);
        }
        Ok(grid)
    }
}

#[cfg(feature = "xlsx")]
fn convert_cell(data: &calamine::Data) -> Cell {
    use calamine::Data;
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        other => Cell::Text(other.to_string()),
    }
}
