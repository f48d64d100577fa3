//! Dynamic CRUD execution.
//!
//! [`CrudEngine`] borrows a live [`DbHandle`] and builds parameterized
//! INSERT, batched INSERT, UPDATE, and DELETE statements from in-memory
//! records, inferring a bind type per value. Predicate logic for
//! UPDATE/DELETE comes from an external [`Predicate`].
//!
//! The engine is composition over a handle, not a connection subclass. It
//! performs no retries; a failed operation surfaces as
//! [`SqlGateError::Write`] and the caller owns any reconnect-and-retry
//! policy. Concurrent calls against the same handle require external
//! synchronization.
//!
//! Each submodule below provides the same interface adapted to its database
//! type; the structure is intentionally parallel.

use crate::db::lifecycle::DbHandle;
use crate::db::params::BindValue;
use crate::db::statement::{
    NamedStatement, Record, build_delete, build_insert, build_insert_many, build_update,
};
use crate::error::{SqlGateError, SqlGateResult};
use crate::predicate::Predicate;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Statement builder and executor for one connection handle.
pub struct CrudEngine {
    handle: DbHandle,
}

impl CrudEngine {
    /// Create an engine over a live handle.
    pub fn new(handle: DbHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &DbHandle {
        &self.handle
    }

    /// Insert one record and return the generated key.
    ///
    /// Null-valued fields are omitted so the database applies its own
    /// defaults. The returned value is the first declared column of the
    /// record, fetched through RETURNING; a missing or falsy value is a
    /// write failure.
    pub async fn insert_one(&self, table: &str, record: &Record) -> SqlGateResult<JsonValue> {
        let statement = build_insert(table, record)?;
        let (sql, values) = self.rendered(&statement)?;

        let returned = self
            .fetch_first(&sql, &values)
            .await
            .map_err(|e| SqlGateError::write_with("failed to create record", e))?;

        match returned {
            Some(value) if !is_falsy(&value) => Ok(value),
            _ => Err(SqlGateError::write(
                "insert returned no usable generated key",
            )),
        }
    }

    /// Insert a batch of records in a single multi-row statement.
    ///
    /// All records must share the same non-null column set.
    pub async fn insert_many(&self, table: &str, records: &[Record]) -> SqlGateResult<()> {
        let statement = build_insert_many(table, records)?;
        let (sql, values) = self.rendered(&statement)?;

        self.execute(&sql, &values)
            .await
            .map_err(|e| SqlGateError::write_with("failed to create records", e))?;
        Ok(())
    }

    /// Update records matching the predicate; returns the affected row count.
    pub async fn update(
        &self,
        table: &str,
        record: &Record,
        predicate: &Predicate,
    ) -> SqlGateResult<u64> {
        let statement = build_update(table, record, predicate)?;
        let (sql, values) = self.rendered(&statement)?;

        self.execute(&sql, &values)
            .await
            .map_err(|e| SqlGateError::write_with("failed to change records", e))
    }

    /// Delete records matching the predicate; returns the affected row
    /// count. No matching rows is `Ok(0)`, not an error.
    pub async fn delete(&self, table: &str, predicate: &Predicate) -> SqlGateResult<u64> {
        let statement = build_delete(table, predicate)?;
        let (sql, values) = self.rendered(&statement)?;

        self.execute(&sql, &values)
            .await
            .map_err(|e| SqlGateError::write_with("failed to delete records", e))
    }

    fn rendered(&self, statement: &NamedStatement) -> SqlGateResult<(String, Vec<BindValue>)> {
        let (sql, values) = crate::db::statement::render(statement, self.handle.kind())?;
        debug!(sql = %sql, params = values.len(), "Executing statement");
        Ok((sql, values))
    }

    async fn fetch_first(
        &self,
        sql: &str,
        values: &[BindValue],
    ) -> Result<Option<JsonValue>, sqlx::Error> {
        match &self.handle {
            DbHandle::MySql(pool) => mysql::fetch_first(pool, sql, values).await,
            DbHandle::Postgres(pool) => postgres::fetch_first(pool, sql, values).await,
            DbHandle::Sqlite(pool) => sqlite::fetch_first(pool, sql, values).await,
        }
    }

    async fn execute(&self, sql: &str, values: &[BindValue]) -> Result<u64, sqlx::Error> {
        match &self.handle {
            DbHandle::MySql(pool) => mysql::execute(pool, sql, values).await,
            DbHandle::Postgres(pool) => postgres::execute(pool, sql, values).await,
            DbHandle::Sqlite(pool) => sqlite::execute(pool, sql, values).await,
        }
    }
}

/// A falsy generated key means the insert produced nothing usable: NULL,
/// false, zero, or an empty string.
fn is_falsy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_i64() == Some(0) || n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

mod mysql {
    use super::*;
    use crate::db::params::bind_mysql_param;
    use sqlx::mysql::MySqlRow;
    use sqlx::{MySqlPool, Row};

    pub async fn fetch_first(
        pool: &MySqlPool,
        sql: &str,
        values: &[BindValue],
    ) -> Result<Option<JsonValue>, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_mysql_param(query, value);
        }
        Ok(query.fetch_optional(pool).await?.map(|row| first_column(&row)))
    }

    pub async fn execute(
        pool: &MySqlPool,
        sql: &str,
        values: &[BindValue],
    ) -> Result<u64, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_mysql_param(query, value);
        }
        Ok(query.execute(pool).await?.rows_affected())
    }

    fn first_column(row: &MySqlRow) -> JsonValue {
        if let Ok(v) = row.try_get::<Option<i64>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<bool>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        JsonValue::Null
    }
}

mod postgres {
    use super::*;
    use crate::db::params::bind_postgres_param;
    use sqlx::postgres::PgRow;
    use sqlx::{PgPool, Row};

    pub async fn fetch_first(
        pool: &PgPool,
        sql: &str,
        values: &[BindValue],
    ) -> Result<Option<JsonValue>, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_postgres_param(query, value);
        }
        Ok(query.fetch_optional(pool).await?.map(|row| first_column(&row)))
    }

    pub async fn execute(
        pool: &PgPool,
        sql: &str,
        values: &[BindValue],
    ) -> Result<u64, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_postgres_param(query, value);
        }
        Ok(query.execute(pool).await?.rows_affected())
    }

    fn first_column(row: &PgRow) -> JsonValue {
        if let Ok(v) = row.try_get::<Option<i64>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<bool>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        JsonValue::Null
    }
}

mod sqlite {
    use super::*;
    use crate::db::params::bind_sqlite_param;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Row, SqlitePool};

    pub async fn fetch_first(
        pool: &SqlitePool,
        sql: &str,
        values: &[BindValue],
    ) -> Result<Option<JsonValue>, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_sqlite_param(query, value);
        }
        Ok(query.fetch_optional(pool).await?.map(|row| first_column(&row)))
    }

    pub async fn execute(
        pool: &SqlitePool,
        sql: &str,
        values: &[BindValue],
    ) -> Result<u64, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_sqlite_param(query, value);
        }
        Ok(query.execute(pool).await?.rows_affected())
    }

    fn first_column(row: &SqliteRow) -> JsonValue {
        if let Ok(v) = row.try_get::<Option<i64>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(0) {
            return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
        }
        JsonValue::Null
    }
}
