//! SQLite store for balance-sheet line items.

use crate::error::Result;
use crate::model::{CorpCode, LineItem, parse_amount};
use crate::store::StatementStore;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params};
use std::path::{Path, PathBuf};

const SELECT_COLUMNS: &str = "corp_name, corp_code, account_id, account_nm, amount, year";

/// SQLite-backed [`StatementStore`].
///
/// Holds only the database path; every operation opens its own connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self { path };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS corp_finance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                corp_name TEXT NOT NULL,
                corp_code TEXT NOT NULL,
                account_id TEXT,
                account_nm TEXT NOT NULL,
                amount INTEGER,
                year INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_corp_finance_code ON corp_finance(corp_code);
            CREATE INDEX IF NOT EXISTS idx_corp_finance_name_year ON corp_finance(corp_name, year);",
        )?;
        Ok(())
    }

    fn read_item(row: &Row<'_>) -> rusqlite::Result<LineItem> {
        let amount = match row.get::<_, Value>(4)? {
            Value::Integer(v) => Some(v),
            Value::Real(v) => parse_amount(&v.to_string()),
            Value::Text(s) => parse_amount(&s),
            Value::Null | Value::Blob(_) => None,
        };

        Ok(LineItem {
            corp_name: row.get(0)?,
            corp_code: CorpCode::new(row.get::<_, String>(1)?),
            account_id: row.get(2)?,
            account_nm: row.get(3)?,
            amount,
            year: row.get(5)?,
        })
    }

    fn query_items<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<LineItem>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let items = stmt
            .query_map(params, Self::read_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Every stored row of one company, in insertion order.
    pub fn rows_for_company(&self, corp_name: &str) -> Result<Vec<LineItem>> {
        self.query_items(
            &format!(
                "SELECT {} FROM corp_finance WHERE corp_name = ?1 ORDER BY id",
                SELECT_COLUMNS
            ),
            params![corp_name],
        )
    }

    /// Total number of stored rows.
    pub fn row_count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM corp_finance", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl StatementStore for SqliteStore {
    fn latest_year_for_company(&self, corp_code: &CorpCode) -> Result<Option<i32>> {
        let conn = self.connect()?;
        let year: Option<i32> = conn.query_row(
            "SELECT MAX(year) FROM corp_finance WHERE corp_code = ?1",
            params![corp_code.as_str()],
            |row| row.get(0),
        )?;
        Ok(year)
    }

    fn delete_all_for_company(&self, corp_code: &CorpCode) -> Result<usize> {
        let conn = self.connect()?;
        let deleted = conn.execute(
            "DELETE FROM corp_finance WHERE corp_code = ?1",
            params![corp_code.as_str()],
        )?;
        Ok(deleted)
    }

    fn insert_rows(&self, rows: &[LineItem]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO corp_finance (corp_name, corp_code, account_id, account_nm, amount, year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for item in rows {
                stmt.execute(params![
                    item.corp_name,
                    item.corp_code.as_str(),
                    item.account_id,
                    item.account_nm,
                    item.amount,
                    item.year,
                ])?;
            }
        }
        tx.commit()?;

        Ok(rows.len())
    }

    fn rows_for_company_year(&self, corp_name: &str, year: i32) -> Result<Vec<LineItem>> {
        self.query_items(
            &format!(
                "SELECT {} FROM corp_finance WHERE corp_name = ?1 AND year = ?2 ORDER BY id",
                SELECT_COLUMNS
            ),
            params![corp_name, year],
        )
    }

    fn all_rows(&self) -> Result<Vec<LineItem>> {
        self.query_items(
            &format!("SELECT {} FROM corp_finance ORDER BY id", SELECT_COLUMNS),
            [],
        )
    }

    fn companies(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT corp_name FROM corp_finance ORDER BY corp_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn years_for_company(&self, corp_name: &str) -> Result<Vec<i32>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT year FROM corp_finance WHERE corp_name = ?1 ORDER BY year DESC",
        )?;
        let years = stmt
            .query_map(params![corp_name], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i32>, _>>()?;
        Ok(years)
    }
}
