use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{Account, Category, Company, Dataset, ValueType};
use crate::store::LedgerStore;

pub const DB_FILENAME: &str = "bokslut.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    location TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS account_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category_id INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (name, category_id),
    FOREIGN KEY (category_id) REFERENCES account_categories(id)
);

CREATE TABLE IF NOT EXISTS raw_labels (
    id INTEGER PRIMARY KEY,
    label TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS account_mappings (
    id INTEGER PRIMARY KEY,
    raw_label_id INTEGER NOT NULL,
    account_id INTEGER NOT NULL,
    confidence REAL NOT NULL DEFAULT 1.0,
    manual INTEGER NOT NULL DEFAULT 0,
    UNIQUE (raw_label_id, account_id),
    FOREIGN KEY (raw_label_id) REFERENCES raw_labels(id),
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS datasets (
    id INTEGER PRIMARY KEY,
    company_id INTEGER NOT NULL,
    year INTEGER NOT NULL,
    name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (company_id, year),
    FOREIGN KEY (company_id) REFERENCES companies(id)
);

CREATE TABLE IF NOT EXISTS ledger_values (
    id INTEGER PRIMARY KEY,
    dataset_id INTEGER NOT NULL,
    account_id INTEGER NOT NULL,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    value_type TEXT NOT NULL CHECK (value_type IN ('actual', 'budget')),
    amount REAL NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT,
    FOREIGN KEY (dataset_id) REFERENCES datasets(id),
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_values_lookup
    ON ledger_values (dataset_id, account_id, month, value_type);

CREATE UNIQUE INDEX IF NOT EXISTS idx_budget_cell
    ON ledger_values (dataset_id, account_id, month) WHERE value_type = 'budget';

CREATE TABLE IF NOT EXISTS import_runs (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    checksum TEXT NOT NULL,
    sheets_total INTEGER NOT NULL,
    sheets_succeeded INTEGER NOT NULL,
    sheets_failed INTEGER NOT NULL,
    imported_at TEXT NOT NULL
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate(conn)?;
    for cat in Category::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO account_categories (name, description) VALUES (?1, ?2)",
            rusqlite::params![cat.as_str(), cat.description()],
        )?;
    }
    Ok(())
}

/// Bring databases created by older releases up to the current schema.
fn migrate(conn: &Connection) -> Result<()> {
    if !has_column(conn, "account_mappings", "manual")? {
        conn.execute_batch("ALTER TABLE account_mappings ADD COLUMN manual INTEGER NOT NULL DEFAULT 0")?;
    }
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|n| n == column))
}

// ---------------------------------------------------------------------------
// Import run log
// ---------------------------------------------------------------------------

pub struct ImportRun {
    pub filename: String,
    pub imported_at: String,
}

pub fn find_import_run(conn: &Connection, checksum: &str) -> Result<Option<ImportRun>> {
    let run = conn
        .query_row(
            "SELECT filename, imported_at FROM import_runs WHERE checksum = ?1 ORDER BY id DESC LIMIT 1",
            [checksum],
            |row| {
                Ok(ImportRun {
                    filename: row.get(0)?,
                    imported_at: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(run)
}

pub fn record_import_run(
    conn: &Connection,
    filename: &str,
    checksum: &str,
    total: usize,
    succeeded: usize,
    failed: usize,
) -> Result<()> {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO import_runs (filename, checksum, sheets_total, sheets_succeeded, sheets_failed, imported_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![filename, checksum, total as i64, succeeded as i64, failed as i64, now],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (creating if needed) and migrate the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = get_connection(path)?;
        init_db(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn category_id(&self, category: Category) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM account_categories WHERE name = ?1",
                [category.as_str()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn find_raw_label_id(&self, label: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT id FROM raw_labels WHERE label = ?1", [label], |r| r.get(0))
            .optional()?;
        Ok(id)
    }

    fn raw_label_id(&self, label: &str) -> Result<i64> {
        if let Some(id) = self.find_raw_label_id(label)? {
            return Ok(id);
        }
        self.conn.execute("INSERT INTO raw_labels (label) VALUES (?1)", [label])?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl LedgerStore for SqliteStore {
    fn find_company(&self, name: &str) -> Result<Option<Company>> {
        let company = self
            .conn
            .query_row(
                "SELECT id, name, location FROM companies WHERE name = ?1",
                [name],
                |row| {
                    Ok(Company {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(company)
    }

    fn find_or_create_company(&self, name: &str, location: Option<&str>) -> Result<i64> {
        if let Some(company) = self.find_company(name)? {
            return Ok(company.id);
        }
        self.conn.execute(
            "INSERT INTO companies (name, location) VALUES (?1, ?2)",
            rusqlite::params![name, location],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_or_create_category(&self, category: Category) -> Result<i64> {
        if let Some(id) = self.category_id(category)? {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO account_categories (name, description) VALUES (?1, ?2)",
            rusqlite::params![category.as_str(), category.description()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_account(&self, name: &str, category_id: i64) -> Result<Option<Account>> {
        let account = self
            .conn
            .query_row(
                "SELECT id, name, category_id FROM accounts WHERE name = ?1 AND category_id = ?2",
                rusqlite::params![name, category_id],
                |row| {
                    Ok(Account {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        category_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }

    fn find_or_create_account(&self, name: &str, category_id: i64) -> Result<i64> {
        if let Some(account) = self.find_account(name, category_id)? {
            return Ok(account.id);
        }
        self.conn.execute(
            "INSERT INTO accounts (name, category_id) VALUES (?1, ?2)",
            rusqlite::params![name, category_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_or_reuse_raw_label_mapping(&self, raw_label: &str, account_id: i64, confidence: f64) -> Result<()> {
        let label_id = self.raw_label_id(raw_label)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO account_mappings (raw_label_id, account_id, confidence) VALUES (?1, ?2, ?3)",
            rusqlite::params![label_id, account_id, confidence],
        )?;
        Ok(())
    }

    fn find_manual_mapping(&self, raw_label: &str) -> Result<Option<Account>> {
        let account = self
            .conn
            .query_row(
                "SELECT a.id, a.name, a.category_id FROM account_mappings m \
                 JOIN raw_labels r ON m.raw_label_id = r.id \
                 JOIN accounts a ON m.account_id = a.id \
                 WHERE r.label = ?1 AND m.manual = 1",
                [raw_label],
                |row| {
                    Ok(Account {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        category_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }

    fn set_manual_mapping(&self, raw_label: &str, account_id: i64) -> Result<()> {
        let label_id = self.raw_label_id(raw_label)?;
        self.conn
            .execute("DELETE FROM account_mappings WHERE raw_label_id = ?1", [label_id])?;
        self.conn.execute(
            "INSERT INTO account_mappings (raw_label_id, account_id, confidence, manual) VALUES (?1, ?2, 1.0, 1)",
            rusqlite::params![label_id, account_id],
        )?;
        Ok(())
    }

    fn remove_mappings(&self, raw_label: &str) -> Result<usize> {
        let Some(label_id) = self.find_raw_label_id(raw_label)? else {
            return Ok(0);
        };
        let removed = self
            .conn
            .execute("DELETE FROM account_mappings WHERE raw_label_id = ?1", [label_id])?;
        Ok(removed)
    }

    fn find_dataset(&self, company_id: i64, year: i32) -> Result<Option<Dataset>> {
        let dataset = self
            .conn
            .query_row(
                "SELECT id, company_id, year, name FROM datasets WHERE company_id = ?1 AND year = ?2",
                rusqlite::params![company_id, year],
                |row| {
                    Ok(Dataset {
                        id: row.get(0)?,
                        company_id: row.get(1)?,
                        year: row.get(2)?,
                        name: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(dataset)
    }

    fn find_or_create_dataset(&self, company_id: i64, year: i32, name: &str) -> Result<i64> {
        if let Some(dataset) = self.find_dataset(company_id, year)? {
            return Ok(dataset.id);
        }
        self.conn.execute(
            "INSERT INTO datasets (company_id, year, name) VALUES (?1, ?2, ?3)",
            rusqlite::params![company_id, year, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_value(&self, dataset_id: i64, account_id: i64, month: u32, value_type: ValueType, amount: f64) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO ledger_values (dataset_id, account_id, month, value_type, amount) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        stmt.execute(rusqlite::params![dataset_id, account_id, month, value_type.as_str(), amount])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn find_budget_value(&self, dataset_id: i64, account_id: i64, month: u32) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM ledger_values \
                 WHERE dataset_id = ?1 AND account_id = ?2 AND month = ?3 AND value_type = 'budget'",
                rusqlite::params![dataset_id, account_id, month],
                |r| r.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn update_value(&self, value_id: i64, amount: f64) -> Result<()> {
        self.conn.execute(
            "UPDATE ledger_values SET amount = ?1, updated_at = datetime('now') WHERE id = ?2",
            rusqlite::params![amount, value_id],
        )?;
        Ok(())
    }

    fn delete_value(&self, value_id: i64) -> Result<()> {
        self.conn.execute("DELETE FROM ledger_values WHERE id = ?1", [value_id])?;
        Ok(())
    }

    fn clear_values(&self, dataset_id: i64, value_type: ValueType) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM ledger_values WHERE dataset_id = ?1 AND value_type = ?2",
            rusqlite::params![dataset_id, value_type.as_str()],
        )?;
        Ok(removed)
    }

    fn begin(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
