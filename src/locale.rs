use crate::workbook::Cell;

/// Month tokens recognized in header rows, lower-cased.
const MONTH_TOKENS: &[(&str, u32)] = &[
    // Swedish short names as used in the ledgers
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("maj", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("okt", 10),
    ("nov", 11),
    ("dec", 12),
    // English
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("oct", 10),
    ("sept", 9),
    // Swedish long forms
    ("januari", 1),
    ("februari", 2),
    ("mars", 3),
    ("juni", 6),
    ("juli", 7),
    ("augusti", 8),
    ("oktober", 10),
];

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Maj", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dec",
];

/// Map a header token to 1-12. Unknown tokens are not an error.
pub fn parse_month(token: &str) -> Option<u32> {
    let lower = token.trim().to_lowercase();
    MONTH_TOKENS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, m)| *m)
}

/// Accepts either a month number or a month token.
pub fn parse_month_arg(raw: &str) -> Option<u32> {
    if let Ok(m) = raw.trim().parse::<u32>() {
        return (1..=12).contains(&m).then_some(m);
    }
    parse_month(raw)
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}

/// Outcome of reading one month cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Amount {
    Blank,
    Value(f64),
    Unconvertible(String),
}

/// Parse decimal-comma text: "1 234,50" -> 1234.5
pub fn normalize_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn normalize_amount(cell: &Cell) -> Amount {
    match cell {
        Cell::Empty => Amount::Blank,
        Cell::Number(n) => Amount::Value(*n),
        Cell::Text(s) if s.trim().is_empty() => Amount::Blank,
        Cell::Text(s) => match normalize_text(s) {
            Some(v) => Amount::Value(v),
            None => Amount::Unconvertible(s.clone()),
        },
    }
}
