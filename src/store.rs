//! Persistence boundary of the import pipeline. The pipeline only talks to
//! storage through this trait; `db::SqliteStore` is the shipped backend.

use crate::error::{BokslutError, Result};
use crate::models::{Account, Category, Company, Dataset, ValueType};

pub trait LedgerStore {
    fn find_company(&self, name: &str) -> Result<Option<Company>>;
    fn find_or_create_company(&self, name: &str, location: Option<&str>) -> Result<i64>;

    fn find_or_create_category(&self, category: Category) -> Result<i64>;

    fn find_account(&self, name: &str, category_id: i64) -> Result<Option<Account>>;
    fn find_or_create_account(&self, name: &str, category_id: i64) -> Result<i64>;

    fn create_or_reuse_raw_label_mapping(&self, raw_label: &str, account_id: i64, confidence: f64) -> Result<()>;

    /// Account a user pinned `raw_label` to, if any.
    fn find_manual_mapping(&self, raw_label: &str) -> Result<Option<Account>>;
    /// Replace every mapping of `raw_label` with one manual mapping to `account_id`.
    fn set_manual_mapping(&self, raw_label: &str, account_id: i64) -> Result<()>;
    /// Drop every mapping of `raw_label`; returns the count removed.
    fn remove_mappings(&self, raw_label: &str) -> Result<usize>;

    fn find_dataset(&self, company_id: i64, year: i32) -> Result<Option<Dataset>>;
    fn find_or_create_dataset(&self, company_id: i64, year: i32, name: &str) -> Result<i64>;

    fn insert_value(&self, dataset_id: i64, account_id: i64, month: u32, value_type: ValueType, amount: f64) -> Result<i64>;
    fn find_budget_value(&self, dataset_id: i64, account_id: i64, month: u32) -> Result<Option<i64>>;
    fn update_value(&self, value_id: i64, amount: f64) -> Result<()>;
    fn delete_value(&self, value_id: i64) -> Result<()>;

    /// Remove every fact of one type from a dataset; returns the count removed.
    fn clear_values(&self, dataset_id: i64, value_type: ValueType) -> Result<usize>;

    fn begin(&self) -> Result<()> {
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        Ok(())
    }

    fn company(&self, name: &str) -> Result<Company> {
        self.find_company(name)?
            .ok_or_else(|| BokslutError::UnknownCompany(name.to_string()))
    }

    fn dataset(&self, company: &str, year: i32) -> Result<Dataset> {
        let company_row = self.company(company)?;
        self.find_dataset(company_row.id, year)?
            .ok_or_else(|| BokslutError::UnknownDataset {
                company: company.to_string(),
                year,
            })
    }
}
