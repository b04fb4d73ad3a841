use std::collections::HashSet;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::categorizer::classify;
use crate::error::Result;
use crate::models::{Diagnostic, ParsedRow, ValueType};
use crate::scanner::{scan, SheetLayout};
use crate::sheet_name::parse_sheet_name;
use crate::store::LedgerStore;
use crate::upsert::{extract_rows, upsert_mapped_row, upsert_row, CategoryIds};
use crate::workbook::Workbook;

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// What happens to a dataset's actual figures when its sheet is imported again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReimportPolicy {
    /// Delete the dataset's actual facts, then insert the sheet's figures.
    #[default]
    Replace,
    /// Insert alongside existing facts; re-runs produce duplicates.
    Append,
}

impl ReimportPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Append => "append",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub policy: ReimportPolicy,
    /// Location stored on newly created companies.
    pub default_location: Option<String>,
}

/// Serializes as `"imported"` or `{"failed": "<reason>"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    Imported,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub sheet_name: String,
    pub company: Option<String>,
    pub year: Option<i32>,
    pub accounts_processed: usize,
    pub values_processed: usize,
    pub values_replaced: usize,
    pub status: SheetStatus,
    pub diagnostics: Vec<Diagnostic>,
}

impl SheetReport {
    fn new(sheet_name: &str) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            company: None,
            year: None,
            accounts_processed: 0,
            values_processed: 0,
            values_replaced: 0,
            status: SheetStatus::Imported,
            diagnostics: Vec::new(),
        }
    }

    fn failed(mut self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("Sheet '{}' failed: {reason}", self.sheet_name);
        self.status = SheetStatus::Failed(reason);
        self
    }

    pub fn succeeded(&self) -> bool {
        self.status == SheetStatus::Imported
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every sheet imported.
    Complete,
    /// Some sheets imported, some failed.
    Partial,
    /// No sheet imported.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sheets_total: usize,
    pub sheets_succeeded: usize,
    pub sheets_failed: usize,
    pub outcome: RunOutcome,
    pub per_sheet: Vec<SheetReport>,
}

impl RunSummary {
    fn from_reports(per_sheet: Vec<SheetReport>) -> Self {
        let sheets_total = per_sheet.len();
        let sheets_succeeded = per_sheet.iter().filter(|r| r.succeeded()).count();
        let sheets_failed = sheets_total - sheets_succeeded;
        let outcome = if sheets_failed == 0 {
            RunOutcome::Complete
        } else if sheets_succeeded > 0 {
            RunOutcome::Partial
        } else {
            RunOutcome::Failed
        };
        Self {
            sheets_total,
            sheets_succeeded,
            sheets_failed,
            outcome,
            per_sheet,
        }
    }

    pub fn is_success(&self) -> bool {
        self.sheets_succeeded == self.sheets_total
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Import every sheet of `workbook`. A failing sheet never stops the run.
pub fn run_import<S, W>(store: &S, workbook: &mut W, options: &ImportOptions) -> RunSummary
where
    S: LedgerStore + ?Sized,
    W: Workbook + ?Sized,
{
    let names = workbook.sheet_names();
    info!("Importing {} sheet(s)", names.len());
    let mut cleared = HashSet::new();
    let reports = names
        .iter()
        .map(|name| import_sheet(store, workbook, name, options, &mut cleared))
        .collect();
    let summary = RunSummary::from_reports(reports);
    info!(
        "Import finished: {} total, {} succeeded, {} failed",
        summary.sheets_total, summary.sheets_succeeded, summary.sheets_failed
    );
    summary
}

/// Import one sheet in its own transaction. `cleared` holds the datasets
/// whose actual facts this run already replaced; several sheets can resolve
/// to the same company year and each dataset is cleared at most once.
pub fn import_sheet<S, W>(
    store: &S,
    workbook: &mut W,
    sheet_name: &str,
    options: &ImportOptions,
    cleared: &mut HashSet<i64>,
) -> SheetReport
where
    S: LedgerStore + ?Sized,
    W: Workbook + ?Sized,
{
    let mut report = SheetReport::new(sheet_name);
    info!("Processing sheet '{sheet_name}'");

    let Some((company, year)) = parse_sheet_name(sheet_name) else {
        report.diagnostics.push(Diagnostic::UnparseableSheetName {
            title: sheet_name.to_string(),
        });
        return report.failed("unparseable sheet name");
    };
    report.company = Some(company.clone());
    report.year = Some(year);

    let grid = match workbook.read_sheet(sheet_name) {
        Ok(grid) => grid,
        Err(e) => return report.failed(e.to_string()),
    };

    let Some(layout) = scan(&grid) else {
        report.diagnostics.push(Diagnostic::NoMonthHeader);
        return report.failed("no month header row");
    };
    debug!(
        "Header on row {}, months {:?}",
        layout.header.row + 1,
        layout.header.columns.iter().map(|c| c.label.as_str()).collect::<Vec<_>>()
    );
    if layout.sections.is_empty() {
        report.diagnostics.push(Diagnostic::MissingSections);
    }

    let (rows, row_diagnostics) = extract_rows(&grid, &layout.header);
    report.diagnostics.extend(row_diagnostics);

    if let Err(e) = store.begin() {
        return report.failed(e.to_string());
    }
    let written = write_sheet(store, &company, year, &layout, &rows, options, cleared).and_then(|counts| {
        store.commit()?;
        Ok(counts)
    });
    match written {
        Ok(counts) => {
            cleared.insert(counts.dataset_id);
            report.accounts_processed = counts.accounts;
            report.values_processed = counts.values;
            report.values_replaced = counts.replaced;
            info!(
                "Sheet '{sheet_name}': {} accounts, {} values",
                counts.accounts, counts.values
            );
            report
        }
        Err(e) => {
            if let Err(rollback_err) = store.rollback() {
                warn!("Rollback of sheet '{sheet_name}' failed: {rollback_err}");
            }
            report.failed(e.to_string())
        }
    }
}

struct WriteCounts {
    dataset_id: i64,
    accounts: usize,
    values: usize,
    replaced: usize,
}

fn write_sheet<S: LedgerStore + ?Sized>(
    store: &S,
    company: &str,
    year: i32,
    layout: &SheetLayout,
    rows: &[ParsedRow],
    options: &ImportOptions,
    cleared: &HashSet<i64>,
) -> Result<WriteCounts> {
    let company_id = store.find_or_create_company(company, options.default_location.as_deref())?;
    let dataset_id = store.find_or_create_dataset(company_id, year, &format!("{company} {year}"))?;
    let categories = CategoryIds::resolve(store)?;

    let replaced = match options.policy {
        ReimportPolicy::Replace if !cleared.contains(&dataset_id) => store.clear_values(dataset_id, ValueType::Actual)?,
        ReimportPolicy::Replace | ReimportPolicy::Append => 0,
    };
    if replaced > 0 {
        info!("Replaced {replaced} existing actual values for {company} {year}");
    }

    let mut counts = WriteCounts {
        dataset_id,
        accounts: 0,
        values: 0,
        replaced,
    };
    for row in rows {
        let outcome = match store.find_manual_mapping(&row.raw_label)? {
            Some(account) => {
                debug!(
                    "row {}: '{}' -> {} (manual mapping)",
                    row.row_index + 1,
                    row.raw_label,
                    account.name
                );
                upsert_mapped_row(store, dataset_id, account.id, row)?
            }
            None => {
                let amounts: Vec<f64> = row.values.iter().map(|(_, v)| *v).collect();
                let classification = classify(row.row_index, &row.account_name, &amounts, &layout.sections);
                debug!(
                    "row {}: '{}' -> {} ({})",
                    row.row_index + 1,
                    row.account_name,
                    classification.category,
                    classification.basis.as_str()
                );
                upsert_row(store, dataset_id, &categories, row, classification)?
            }
        };
        counts.accounts += 1;
        counts.values += outcome.values_written;
    }
    Ok(counts)
}

// ---------------------------------------------------------------------------
// File import
// ---------------------------------------------------------------------------

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(feature = "xlsx")]
pub struct FileImport {
    pub summary: RunSummary,
    pub checksum: String,
    /// Earlier run of the same file contents, if any.
    pub previous: Option<crate::db::ImportRun>,
}

/// Import an Excel file into the SQLite store and log the run.
#[cfg(feature = "xlsx")]
pub fn import_file(
    store: &crate::db::SqliteStore,
    file_path: &Path,
    options: &ImportOptions,
) -> Result<FileImport> {
    use crate::db::{find_import_run, record_import_run};
    use crate::workbook::ExcelWorkbook;

    let checksum = compute_checksum(file_path)?;
    let previous = find_import_run(store.conn(), &checksum)?;
    if let Some(run) = &previous {
        warn!("This file was already imported on {} as {}", run.imported_at, run.filename);
    }

    let mut workbook = ExcelWorkbook::open(file_path)?;
    let summary = run_import(store, &mut workbook, options);

    record_import_run(
        store.conn(),
        file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
        &checksum,
        summary.sheets_total,
        summary.sheets_succeeded,
        summary.sheets_failed,
    )?;

    Ok(FileImport {
        summary,
        checksum,
        previous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::error::BokslutError;
    use crate::models::{Account, Category, Company, Dataset};
    use crate::workbook::{Cell, Grid, MemoryWorkbook};

    fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn count(store: &SqliteStore, sql: &str) -> i64 {
        store.conn().query_row(sql, [], |r| r.get(0)).unwrap()
    }

    fn text(s: &str) -> Cell {
        Cell::from(s)
    }

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    /// Header on row 5, revenue section rows 6-8, expense section rows 9-11.
    fn klab_grid() -> Grid {
        vec![
            vec![text("Resultatrapport")],
            vec![text("KLAB")],
            vec![],
            vec![text("Period: 2022-01 - 2022-03")],
            vec![],
            vec![text(""), text("Jan"), text("Feb"), text("Mar")],
            vec![text("RÖRELSENS INTÄKTER")],
            vec![text("Försäljning"), num(100000.0), num(95000.0), num(110000.0)],
            vec![text("SUMMA RÖRELSENS INTÄKTER"), num(100000.0), num(95000.0), num(110000.0)],
            vec![text("RÖRELSENS KOSTNADER")],
            vec![text("Hyra"), num(-10000.0), num(-10000.0), num(-10000.0)],
            vec![text("SUMMA RÖRELSENS KOSTNADER"), num(-10000.0), num(-10000.0), num(-10000.0)],
            vec![text("BERÄKNAT RESULTAT"), num(90000.0), num(85000.0), num(100000.0)],
        ]
    }

    fn options() -> ImportOptions {
        ImportOptions {
            policy: ReimportPolicy::Replace,
            default_location: Some("Stockholm".into()),
        }
    }

    fn account_category(store: &SqliteStore, name: &str) -> String {
        store
            .conn()
            .query_row(
                "SELECT c.name FROM accounts a JOIN account_categories c ON a.category_id = c.id WHERE a.name = ?1",
                [name],
                |r| r.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_end_to_end_klab_sheet() {
        let (_dir, store) = test_store();
        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", klab_grid());
        let summary = run_import(&store, &mut wb, &options());

        assert_eq!(summary.sheets_total, 1);
        assert_eq!(summary.sheets_succeeded, 1);
        assert_eq!(summary.outcome, RunOutcome::Complete);
        assert!(summary.is_success());
        let report = &summary.per_sheet[0];
        assert_eq!(report.company.as_deref(), Some("KLAB"));
        assert_eq!(report.year, Some(2022));
        assert_eq!(report.accounts_processed, 2);
        assert_eq!(report.values_processed, 6);

        assert_eq!(count(&store, "SELECT count(*) FROM companies"), 1);
        let company = store.find_company("KLAB").unwrap().unwrap();
        assert_eq!(company.location.as_deref(), Some("Stockholm"));
        let dataset = store.find_dataset(company.id, 2022).unwrap().unwrap();
        assert_eq!(dataset.name, "KLAB 2022");
        assert_eq!(dataset.year, 2022);

        assert_eq!(count(&store, "SELECT count(*) FROM accounts"), 2);
        assert_eq!(account_category(&store, "Försäljning"), "Revenue");
        assert_eq!(account_category(&store, "Hyra"), "Expense");

        assert_eq!(count(&store, "SELECT count(*) FROM ledger_values"), 6);
        assert_eq!(
            count(&store, "SELECT count(*) FROM ledger_values WHERE value_type = 'actual'"),
            6
        );
    }

    #[test]
    fn test_reimport_reuses_dimensions() {
        let (_dir, store) = test_store();
        for _ in 0..2 {
            let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", klab_grid());
            assert!(run_import(&store, &mut wb, &options()).is_success());
        }
        assert_eq!(count(&store, "SELECT count(*) FROM companies"), 1);
        assert_eq!(count(&store, "SELECT count(*) FROM account_categories"), 2);
        assert_eq!(count(&store, "SELECT count(*) FROM accounts"), 2);
        assert_eq!(count(&store, "SELECT count(*) FROM datasets"), 1);
        assert_eq!(count(&store, "SELECT count(*) FROM account_mappings"), 2);
        // Replace policy: second run swaps the facts instead of adding to them.
        assert_eq!(count(&store, "SELECT count(*) FROM ledger_values"), 6);
    }

    #[test]
    fn test_append_policy_duplicates_facts() {
        let (_dir, store) = test_store();
        let append = ImportOptions {
            policy: ReimportPolicy::Append,
            default_location: None,
        };
        for _ in 0..2 {
            let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", klab_grid());
            run_import(&store, &mut wb, &append);
        }
        assert_eq!(count(&store, "SELECT count(*) FROM accounts"), 2);
        assert_eq!(count(&store, "SELECT count(*) FROM ledger_values"), 12);
    }

    #[test]
    fn test_reimport_keeps_budget_facts() {
        let (_dir, store) = test_store();
        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", klab_grid());
        run_import(&store, &mut wb, &options());
        let company = store.find_company("KLAB").unwrap().unwrap();
        let dataset = store.find_dataset(company.id, 2022).unwrap().unwrap();
        let expense = store.category_id(Category::Expense).unwrap().unwrap();
        let hyra = store.find_account("Hyra", expense).unwrap().unwrap();
        store.insert_value(dataset.id, hyra.id, 1, ValueType::Budget, -12000.0).unwrap();

        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", klab_grid());
        let summary = run_import(&store, &mut wb, &options());
        assert_eq!(summary.per_sheet[0].values_replaced, 6);
        assert_eq!(
            count(&store, "SELECT count(*) FROM ledger_values WHERE value_type = 'budget'"),
            1
        );
    }

    #[test]
    fn test_bad_sheets_do_not_abort_the_run() {
        let (_dir, store) = test_store();
        let mut wb = MemoryWorkbook::new()
            .with_sheet("Instructions", vec![vec![text("Read me")]])
            .with_sheet("KMAB 2023", vec![vec![text("Konto"), text("Q1"), text("Q2")]])
            .with_sheet("KLAB 2022", klab_grid());
        let summary = run_import(&store, &mut wb, &options());

        assert_eq!(summary.sheets_total, 3);
        assert_eq!(summary.sheets_succeeded, 1);
        assert_eq!(summary.sheets_failed, 2);
        assert_eq!(summary.outcome, RunOutcome::Partial);
        assert!(!summary.is_success());

        let instructions = &summary.per_sheet[0];
        assert_eq!(instructions.status, SheetStatus::Failed("unparseable sheet name".into()));
        assert!(instructions.diagnostics.contains(&Diagnostic::UnparseableSheetName {
            title: "Instructions".into()
        }));

        let kmab = &summary.per_sheet[1];
        assert_eq!(kmab.company.as_deref(), Some("KMAB"));
        assert!(kmab.diagnostics.contains(&Diagnostic::NoMonthHeader));
        // A rejected sheet writes nothing.
        assert!(store.find_company("KMAB").unwrap().is_none());
    }

    #[test]
    fn test_all_sheets_failing_is_a_failed_run() {
        let (_dir, store) = test_store();
        let mut wb = MemoryWorkbook::new().with_sheet("Sheet1", vec![]);
        let summary = run_import(&store, &mut wb, &options());
        assert_eq!(summary.outcome, RunOutcome::Failed);
    }

    #[test]
    fn test_sheet_without_sections_falls_back_to_keywords_and_signs() {
        let (_dir, store) = test_store();
        let grid = vec![
            vec![text("Konto"), text("January"), text("February"), text("March")],
            vec![text("Medlemsavgifter"), text("1 200,50"), num(1300.0), num(0.0)],
            vec![text("Löner"), num(-50000.0), num(-50000.0), num(-52000.0)],
            vec![text("Återbäring"), num(200.0), num(-100.0), Cell::Empty],
        ];
        let mut wb = MemoryWorkbook::new().with_sheet("Aktivitus AB 2023", grid);
        let summary = run_import(&store, &mut wb, &options());
        let report = &summary.per_sheet[0];

        assert!(report.succeeded());
        assert!(report.diagnostics.contains(&Diagnostic::MissingSections));
        assert_eq!(report.values_processed, 7);
        assert_eq!(account_category(&store, "Medlemsavgifter"), "Revenue");
        assert_eq!(account_category(&store, "Löner"), "Expense");
        assert_eq!(account_category(&store, "Återbäring"), "Revenue");
        let amount: f64 = store
            .conn()
            .query_row(
                "SELECT v.amount FROM ledger_values v JOIN accounts a ON v.account_id = a.id \
                 WHERE a.name = 'Medlemsavgifter' AND v.month = 1",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(amount, 1200.5);
    }

    #[test]
    fn test_unconvertible_cells_are_reported_and_skipped() {
        let (_dir, store) = test_store();
        let mut grid = klab_grid();
        grid[7][2] = text("saknas");
        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", grid);
        let summary = run_import(&store, &mut wb, &options());
        let report = &summary.per_sheet[0];
        assert!(report.succeeded());
        assert_eq!(report.values_processed, 5);
        assert!(report.diagnostics.contains(&Diagnostic::UnconvertibleCell {
            row: 7,
            month: 2,
            raw: "saknas".into()
        }));
    }

    #[test]
    fn test_summary_rows_are_not_accounts() {
        let (_dir, store) = test_store();
        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", klab_grid());
        let summary = run_import(&store, &mut wb, &options());
        let names: Vec<String> = store
            .conn()
            .prepare("SELECT name FROM accounts ORDER BY name")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(names, vec!["Försäljning", "Hyra"]);
        assert!(summary.per_sheet[0].diagnostics.contains(&Diagnostic::SkippedLabel {
            row: 12,
            label: "BERÄKNAT RESULTAT".into()
        }));
    }

    #[test]
    fn test_two_sheets_share_company() {
        let (_dir, store) = test_store();
        let mut wb = MemoryWorkbook::new()
            .with_sheet("KLAB 2022", klab_grid())
            .with_sheet("KLAB 2023", klab_grid());
        let summary = run_import(&store, &mut wb, &options());
        assert!(summary.is_success());
        assert_eq!(count(&store, "SELECT count(*) FROM companies"), 1);
        assert_eq!(count(&store, "SELECT count(*) FROM datasets"), 2);
        assert_eq!(count(&store, "SELECT count(*) FROM accounts"), 2);
        assert_eq!(count(&store, "SELECT count(*) FROM ledger_values"), 12);
    }

    fn one_row_grid(label: &str, amounts: [f64; 3]) -> Grid {
        vec![
            vec![text(""), text("Jan"), text("Feb"), text("Mar")],
            vec![text(label), num(amounts[0]), num(amounts[1]), num(amounts[2])],
        ]
    }

    #[test]
    fn test_sheets_resolving_to_one_dataset_keep_all_facts() {
        let (_dir, store) = test_store();
        let mut wb = MemoryWorkbook::new()
            .with_sheet("KLAB 2022", one_row_grid("Försäljning", [1.0, 2.0, 3.0]))
            .with_sheet("KLAB  2022", one_row_grid("Löner", [-1.0, -2.0, -3.0]));
        let summary = run_import(&store, &mut wb, &options());
        assert!(summary.is_success());
        assert_eq!(count(&store, "SELECT count(*) FROM datasets"), 1);
        assert_eq!(count(&store, "SELECT count(*) FROM ledger_values"), 6);
        assert_eq!(summary.per_sheet[0].values_replaced, 0);
        assert_eq!(summary.per_sheet[1].values_replaced, 0);

        // A later run replaces both sheets' facts once, not each other's.
        let mut wb = MemoryWorkbook::new()
            .with_sheet("KLAB 2022", one_row_grid("Försäljning", [1.0, 2.0, 3.0]))
            .with_sheet("KLAB  2022", one_row_grid("Löner", [-1.0, -2.0, -3.0]));
        let summary = run_import(&store, &mut wb, &options());
        assert_eq!(summary.per_sheet[0].values_replaced, 6);
        assert_eq!(summary.per_sheet[1].values_replaced, 0);
        assert_eq!(count(&store, "SELECT count(*) FROM ledger_values"), 6);
    }

    #[test]
    fn test_rolled_back_sheet_does_not_count_as_cleared() {
        let (_dir, store) = test_store();
        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", klab_grid());
        run_import(&store, &mut wb, &options());

        let mut cleared = HashSet::new();
        let failing = FailingValues(store);
        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", klab_grid());
        let report = import_sheet(&failing, &mut wb, "KLAB 2022", &options(), &mut cleared);
        assert!(!report.succeeded());
        assert!(cleared.is_empty());
        assert_eq!(count(&failing.0, "SELECT count(*) FROM ledger_values"), 6);
    }

    #[test]
    fn test_manual_mapping_overrides_classification() {
        let (_dir, store) = test_store();
        let grid = one_row_grid("Återbäring", [200.0, 100.0, 50.0]);
        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", grid.clone());
        run_import(&store, &mut wb, &options());
        assert_eq!(account_category(&store, "Återbäring"), "Revenue");

        let expense = store.category_id(Category::Expense).unwrap().unwrap();
        let other = store.find_or_create_account("Övriga kostnader", expense).unwrap();
        store.set_manual_mapping("Återbäring", other).unwrap();

        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", grid);
        let summary = run_import(&store, &mut wb, &options());
        assert_eq!(summary.per_sheet[0].accounts_processed, 1);
        assert_eq!(summary.per_sheet[0].values_processed, 3);
        assert_eq!(
            count(
                &store,
                &format!("SELECT count(*) FROM ledger_values WHERE account_id = {other}")
            ),
            3
        );
        assert_eq!(count(&store, "SELECT count(*) FROM ledger_values"), 3);
        // No fresh automatic mapping is added next to the manual one.
        assert_eq!(count(&store, "SELECT count(*) FROM account_mappings"), 1);
    }

    /// Delegates to SQLite but refuses to write facts.
    struct FailingValues(SqliteStore);

    impl LedgerStore for FailingValues {
        fn find_company(&self, name: &str) -> Result<Option<Company>> {
            self.0.find_company(name)
        }
        fn find_or_create_company(&self, name: &str, location: Option<&str>) -> Result<i64> {
            self.0.find_or_create_company(name, location)
        }
        fn find_or_create_category(&self, category: Category) -> Result<i64> {
            self.0.find_or_create_category(category)
        }
        fn find_account(&self, name: &str, category_id: i64) -> Result<Option<Account>> {
            self.0.find_account(name, category_id)
        }
        fn find_or_create_account(&self, name: &str, category_id: i64) -> Result<i64> {
            self.0.find_or_create_account(name, category_id)
        }
        fn create_or_reuse_raw_label_mapping(&self, raw_label: &str, account_id: i64, confidence: f64) -> Result<()> {
            self.0.create_or_reuse_raw_label_mapping(raw_label, account_id, confidence)
        }
        fn find_manual_mapping(&self, raw_label: &str) -> Result<Option<Account>> {
            self.0.find_manual_mapping(raw_label)
        }
        fn set_manual_mapping(&self, raw_label: &str, account_id: i64) -> Result<()> {
            self.0.set_manual_mapping(raw_label, account_id)
        }
        fn remove_mappings(&self, raw_label: &str) -> Result<usize> {
            self.0.remove_mappings(raw_label)
        }
        fn find_dataset(&self, company_id: i64, year: i32) -> Result<Option<Dataset>> {
            self.0.find_dataset(company_id, year)
        }
        fn find_or_create_dataset(&self, company_id: i64, year: i32, name: &str) -> Result<i64> {
            self.0.find_or_create_dataset(company_id, year, name)
        }
        fn insert_value(&self, _: i64, _: i64, _: u32, _: ValueType, _: f64) -> Result<i64> {
            Err(BokslutError::Other("store unavailable".into()))
        }
        fn find_budget_value(&self, dataset_id: i64, account_id: i64, month: u32) -> Result<Option<i64>> {
            self.0.find_budget_value(dataset_id, account_id, month)
        }
        fn update_value(&self, value_id: i64, amount: f64) -> Result<()> {
            self.0.update_value(value_id, amount)
        }
        fn delete_value(&self, value_id: i64) -> Result<()> {
            self.0.delete_value(value_id)
        }
        fn clear_values(&self, dataset_id: i64, value_type: ValueType) -> Result<usize> {
            self.0.clear_values(dataset_id, value_type)
        }
        fn begin(&self) -> Result<()> {
            self.0.begin()
        }
        fn commit(&self) -> Result<()> {
            self.0.commit()
        }
        fn rollback(&self) -> Result<()> {
            self.0.rollback()
        }
    }

    #[test]
    fn test_store_failure_rolls_back_sheet_and_continues() {
        let (_dir, store) = test_store();
        let failing = FailingValues(store);
        let mut wb = MemoryWorkbook::new()
            .with_sheet("KLAB 2022", klab_grid())
            .with_sheet("KMAB 2022", klab_grid());
        let summary = run_import(&failing, &mut wb, &options());

        assert_eq!(summary.sheets_failed, 2);
        assert_eq!(summary.per_sheet[0].status, SheetStatus::Failed("store unavailable".into()));
        assert_eq!(summary.per_sheet[1].status, SheetStatus::Failed("store unavailable".into()));
        assert_eq!(count(&failing.0, "SELECT count(*) FROM companies"), 0);
        assert_eq!(count(&failing.0, "SELECT count(*) FROM accounts"), 0);
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let (_dir, store) = test_store();
        let mut wb = MemoryWorkbook::new().with_sheet("KLAB 2022", klab_grid());
        let summary = run_import(&store, &mut wb, &options());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["sheets_total"], 1);
        assert_eq!(json["outcome"], "complete");
        assert_eq!(json["per_sheet"][0]["status"], "imported");
        assert_eq!(json["per_sheet"][0]["values_processed"], 6);

        let mut wb = MemoryWorkbook::new().with_sheet("Instructions", vec![]);
        let json = serde_json::to_value(run_import(&store, &mut wb, &options())).unwrap();
        assert_eq!(json["per_sheet"][0]["status"]["failed"], "unparseable sheet name");
    }

    #[test]
    fn test_compute_checksum_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");
        std::fs::write(&path, b"not really a workbook").unwrap();
        let a = compute_checksum(&path).unwrap();
        let b = compute_checksum(&path).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_import_file_rejects_non_workbook() {
        let (dir, store) = test_store();
        let path = dir.path().join("ledger.xlsx");
        std::fs::write(&path, b"not really a workbook").unwrap();
        assert!(matches!(
            import_file(&store, &path, &options()),
            Err(BokslutError::Workbook(_))
        ));
    }
}
