use rusqlite::config::DbConfig;
use rusqlite::Connection;

use crate::core::plan::QueryPlan;
use crate::core::types::{ColumnMeta, DbRow};
use crate::core::{query, schema};
use crate::error::AppResult;

/// The relational store the pipeline runs against. Calls are blocking.
pub trait TableStore {
    fn list_columns(&self, table: &str) -> AppResult<Vec<ColumnMeta>>;

    fn select(&self, plan: &QueryPlan) -> AppResult<Vec<DbRow>>;

    /// Rows matching the plan's filters; order and bounds are ignored.
    fn count(&self, plan: &QueryPlan) -> AppResult<u64>;

    /// Run `f` against one consistent view of the data, as far as the
    /// store can provide one. The default gives no extra guarantee.
    fn snapshot<T, F>(&self, f: F) -> AppResult<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> AppResult<T>,
    {
        f(self)
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Double-quoted names always resolve as identifiers: an unknown
    /// column is an error rather than a string literal.
    pub fn new(conn: Connection) -> Self {
        if let Err(e) = conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DML, false) {
            tracing::warn!(error = %e, "could not disable double-quoted string literals");
        }
        Self { conn }
    }
}

impl TableStore for SqliteStore {
    fn list_columns(&self, table: &str) -> AppResult<Vec<ColumnMeta>> {
        schema::list_columns(&self.conn, table)
    }

    fn select(&self, plan: &QueryPlan) -> AppResult<Vec<DbRow>> {
        query::run_select(&self.conn, &plan.to_sql())
    }

    fn count(&self, plan: &QueryPlan) -> AppResult<u64> {
        query::run_count(&self.conn, &plan.count_sql())
    }

    /// Deferred read transaction: the first read pins the snapshot.
    fn snapshot<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Self) -> AppResult<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }
}
