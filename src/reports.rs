use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::error::{BokslutError, Result};
use crate::models::{Category, ValueType};

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

pub fn find_account_id(conn: &Connection, name: &str, category: Category) -> Result<i64> {
    conn.query_row(
        "SELECT a.id FROM accounts a JOIN account_categories c ON a.category_id = c.id \
         WHERE a.name = ?1 AND c.name = ?2",
        [name, category.as_str()],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| BokslutError::UnknownAccount(format!("{name} ({category})")))
}

// ---------------------------------------------------------------------------
// Monthly summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthSummary {
    pub month: u32,
    pub revenue: f64,
    pub expense: f64,
    /// Revenue plus expense; expenses are stored as negative amounts.
    pub result: f64,
}

/// Twelve rows, one per month, zero-filled where the dataset has no facts.
pub fn monthly_summary(conn: &Connection, dataset_id: i64, value_type: ValueType) -> Result<Vec<MonthSummary>> {
    let mut months: Vec<MonthSummary> = (1..=12)
        .map(|month| MonthSummary {
            month,
            ..Default::default()
        })
        .collect();

    let mut stmt = conn.prepare(
        "SELECT v.month, c.name, SUM(v.amount) \
         FROM ledger_values v \
         JOIN accounts a ON v.account_id = a.id \
         JOIN account_categories c ON a.category_id = c.id \
         WHERE v.dataset_id = ?1 AND v.value_type = ?2 \
         GROUP BY v.month, c.name",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![dataset_id, value_type.as_str()], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, f64>(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (month, category, total) in rows {
        let Some(entry) = months.get_mut(month as usize - 1) else {
            continue;
        };
        match Category::parse(&category) {
            Some(Category::Revenue) => entry.revenue += total,
            Some(Category::Expense) => entry.expense += total,
            None => {}
        }
    }
    for entry in &mut months {
        entry.result = entry.revenue + entry.expense;
    }
    Ok(months)
}

// ---------------------------------------------------------------------------
// Budget comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    pub account: String,
    pub category: Category,
    pub actual: f64,
    pub budget: f64,
    pub variance: f64,
}

/// Yearly actual vs budget per account, revenue accounts first.
pub fn budget_comparison(conn: &Connection, dataset_id: i64) -> Result<Vec<BudgetLine>> {
    let mut stmt = conn.prepare(
        "SELECT a.name, c.name, \
                COALESCE(SUM(CASE WHEN v.value_type = 'actual' THEN v.amount END), 0), \
                COALESCE(SUM(CASE WHEN v.value_type = 'budget' THEN v.amount END), 0) \
         FROM ledger_values v \
         JOIN accounts a ON v.account_id = a.id \
         JOIN account_categories c ON a.category_id = c.id \
         WHERE v.dataset_id = ?1 \
         GROUP BY a.id \
         ORDER BY c.name DESC, a.name",
    )?;
    let rows = stmt
        .query_map([dataset_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut lines = Vec::with_capacity(rows.len());
    for (account, category, actual, budget) in rows {
        let category = category.parse::<Category>()?;
        lines.push(BudgetLine {
            account,
            category,
            actual,
            budget,
            variance: actual - budget,
        });
    }
    Ok(lines)
}

// ---------------------------------------------------------------------------
// Top accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountTotal {
    pub account: String,
    pub total: f64,
}

/// Largest accounts of one category by absolute yearly actual total.
pub fn top_accounts(conn: &Connection, dataset_id: i64, category: Category, limit: usize) -> Result<Vec<AccountTotal>> {
    let mut stmt = conn.prepare(
        "SELECT a.name, SUM(v.amount) AS total \
         FROM ledger_values v \
         JOIN accounts a ON v.account_id = a.id \
         JOIN account_categories c ON a.category_id = c.id \
         WHERE v.dataset_id = ?1 AND v.value_type = 'actual' AND c.name = ?2 \
         GROUP BY a.id \
         ORDER BY ABS(SUM(v.amount)) DESC, a.name \
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(
        rusqlite::params![dataset_id, category.as_str(), limit as i64],
        |row| {
            Ok(AccountTotal {
                account: row.get(0)?,
                total: row.get(1)?,
            })
        },
    )?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Seasonality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalYear {
    pub year: i32,
    /// (month, index) for months with facts.
    pub indices: Vec<(u32, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Seasonality {
    pub years: Vec<SeasonalYear>,
    /// Mean index per month across years, for months seen in any year.
    pub average: Vec<(u32, f64)>,
}

/// Month value divided by that year's mean monthly value, per year of
/// actual facts for one account. Years whose mean is zero are left out.
pub fn seasonality_indices(conn: &Connection, company_id: i64, account_id: i64) -> Result<Seasonality> {
    let mut stmt = conn.prepare(
        "SELECT d.year, v.month, SUM(v.amount) \
         FROM ledger_values v JOIN datasets d ON v.dataset_id = d.id \
         WHERE d.company_id = ?1 AND v.account_id = ?2 AND v.value_type = 'actual' \
         GROUP BY d.year, v.month \
         ORDER BY d.year, v.month",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![company_id, account_id], |row| {
            Ok((row.get::<_, i32>(0)?, row.get::<_, u32>(1)?, row.get::<_, f64>(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut by_year: BTreeMap<i32, Vec<(u32, f64)>> = BTreeMap::new();
    for (year, month, amount) in rows {
        by_year.entry(year).or_default().push((month, amount));
    }

    let mut years = Vec::new();
    let mut per_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (year, values) in by_year {
        let mean = values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64;
        if mean == 0.0 {
            log::debug!("Skipping {year} in seasonality: mean is zero");
            continue;
        }
        let indices: Vec<(u32, f64)> = values.iter().map(|(m, v)| (*m, v / mean)).collect();
        for (month, index) in &indices {
            per_month.entry(*month).or_default().push(*index);
        }
        years.push(SeasonalYear { year, indices });
    }

    let average = per_month
        .into_iter()
        .map(|(month, xs)| (month, xs.iter().sum::<f64>() / xs.len() as f64))
        .collect();
    Ok(Seasonality { years, average })
}

// ---------------------------------------------------------------------------
// Listing and export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueRow {
    pub account: String,
    pub category: String,
    pub month: u32,
    pub value_type: String,
    pub amount: f64,
}

pub fn dataset_values(conn: &Connection, dataset_id: i64, value_type: Option<ValueType>) -> Result<Vec<ValueRow>> {
    let mut stmt = conn.prepare(
        "SELECT a.name, c.name, v.month, v.value_type, v.amount \
         FROM ledger_values v \
         JOIN accounts a ON v.account_id = a.id \
         JOIN account_categories c ON a.category_id = c.id \
         WHERE v.dataset_id = ?1 AND (?2 IS NULL OR v.value_type = ?2) \
         ORDER BY c.name DESC, a.name, v.month, v.value_type, v.id",
    )?;
    let rows = stmt.query_map(
        rusqlite::params![dataset_id, value_type.map(|t| t.as_str())],
        |row| {
            Ok(ValueRow {
                account: row.get(0)?,
                category: row.get(1)?,
                month: row.get(2)?,
                value_type: row.get(3)?,
                amount: row.get(4)?,
            })
        },
    )?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub struct CompanyOverview {
    pub name: String,
    pub location: Option<String>,
    pub years: Vec<i32>,
}

pub fn list_companies(conn: &Connection) -> Result<Vec<CompanyOverview>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, c.location, d.year \
         FROM companies c LEFT JOIN datasets d ON d.company_id = c.id \
         ORDER BY c.name, d.year",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<i32>>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut out: Vec<CompanyOverview> = Vec::new();
    for (name, location, year) in rows {
        match out.last_mut() {
            Some(last) if last.name == name => last.years.extend(year),
            _ => out.push(CompanyOverview {
                name,
                location,
                years: year.into_iter().collect(),
            }),
        }
    }
    Ok(out)
}

pub struct AccountOverview {
    pub name: String,
    pub category: String,
    /// (raw label, confidence)
    pub labels: Vec<(String, f64)>,
}

pub fn list_accounts(conn: &Connection, category: Option<Category>) -> Result<Vec<AccountOverview>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, c.name, r.label, m.confidence \
         FROM accounts a \
         JOIN account_categories c ON a.category_id = c.id \
         LEFT JOIN account_mappings m ON m.account_id = a.id \
         LEFT JOIN raw_labels r ON m.raw_label_id = r.id \
         WHERE (?1 IS NULL OR c.name = ?1) \
         ORDER BY c.name DESC, a.name, a.id, r.label",
    )?;
    let rows = stmt
        .query_map([category.map(|c| c.as_str())], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<f64>>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut out: Vec<AccountOverview> = Vec::new();
    let mut last_id = None;
    for (id, name, category, label, confidence) in rows {
        if last_id != Some(id) {
            out.push(AccountOverview {
                name,
                category,
                labels: Vec::new(),
            });
            last_id = Some(id);
        }
        if let (Some(label), Some(confidence), Some(entry)) = (label, confidence, out.last_mut()) {
            entry.labels.push((label, confidence));
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Raw-label mappings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingRow {
    pub label: String,
    /// (account, category); `None` for an unmapped label.
    pub account: Option<(String, String)>,
    pub confidence: Option<f64>,
    pub manual: bool,
}

/// Every raw label with its mappings, one row per mapping. Unmapped labels
/// get a single row without an account.
pub fn list_mappings(conn: &Connection, unmapped_only: bool) -> Result<Vec<MappingRow>> {
    let mut stmt = conn.prepare(
        "SELECT r.label, a.name, c.name, m.confidence, m.manual \
         FROM raw_labels r \
         LEFT JOIN account_mappings m ON m.raw_label_id = r.id \
         LEFT JOIN accounts a ON m.account_id = a.id \
         LEFT JOIN account_categories c ON a.category_id = c.id \
         WHERE (?1 = 0 OR m.id IS NULL) \
         ORDER BY r.label, a.name",
    )?;
    let rows = stmt
        .query_map([unmapped_only], |row| {
            let account: Option<String> = row.get(1)?;
            let category: Option<String> = row.get(2)?;
            Ok(MappingRow {
                label: row.get(0)?,
                account: account.zip(category),
                confidence: row.get(3)?,
                manual: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappingStats {
    pub total_labels: i64,
    pub mapped_labels: i64,
    pub unmapped_labels: i64,
    /// Labels mapped by the classifier only.
    pub auto_mapped: i64,
    /// Labels with a manual mapping.
    pub manual_mapped: i64,
}

pub fn mapping_stats(conn: &Connection) -> Result<MappingStats> {
    let (total_labels, mapped_labels, manual_mapped) = conn.query_row(
        "SELECT \
            (SELECT count(*) FROM raw_labels), \
            (SELECT count(DISTINCT raw_label_id) FROM account_mappings), \
            (SELECT count(DISTINCT raw_label_id) FROM account_mappings WHERE manual = 1)",
        [],
        |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?, r.get::<_, i64>(2)?)),
    )?;
    Ok(MappingStats {
        total_labels,
        mapped_labels,
        unmapped_labels: total_labels - mapped_labels,
        auto_mapped: mapped_labels - manual_mapped,
        manual_mapped,
    })
}
