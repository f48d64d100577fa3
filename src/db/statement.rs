//! Dynamic statement construction.
//!
//! Builders produce a [`NamedStatement`] with `:name` placeholders from
//! in-memory records; [`render`] converts it to the driver's placeholder
//! syntax with an ordered value list. Everything here is pure, so the
//! generated SQL is testable without a database.

use crate::config::DriverKind;
use crate::db::params::{BindValue, BoundParameter, bind};
use crate::error::{SqlGateError, SqlGateResult};
use crate::predicate::Predicate;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// An ordered record: column name to value, in declaration order.
pub type Record = serde_json::Map<String, JsonValue>;

/// A statement with named placeholders and its bound parameters.
#[derive(Debug, Clone)]
pub struct NamedStatement {
    pub sql: String,
    pub params: Vec<BoundParameter>,
}

/// Build a single-row INSERT.
///
/// Null-valued fields are omitted from the column list entirely, letting the
/// database apply its own column default or NULL behavior. The RETURNING
/// target is the first declared column of the record, before the null drop.
pub fn build_insert(table: &str, record: &Record) -> SqlGateResult<NamedStatement> {
    let returning = record
        .keys()
        .next()
        .ok_or_else(|| SqlGateError::invalid_input("cannot insert an empty record"))?
        .clone();

    let mut columns = Vec::new();
    let mut params = Vec::new();
    for (column, value) in record {
        if value.is_null() {
            continue;
        }
        ensure_identifier(column)?;
        columns.push(column.as_str());
        params.push(bind(column.clone(), value));
    }
    if columns.is_empty() {
        return Err(SqlGateError::invalid_input(
            "cannot insert a record whose fields are all null",
        ));
    }

    let placeholders: Vec<String> = columns.iter().map(|c| format!(":{c}")).collect();
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING {returning}",
        columns.join(","),
        placeholders.join(",")
    );
    Ok(NamedStatement { sql, params })
}

/// Build a multi-row INSERT executed as one statement.
///
/// Placeholder names are suffixed with the record ordinal to avoid
/// collisions. All records must share the same non-null column set; a
/// divergent batch is rejected rather than silently misaligned.
pub fn build_insert_many(table: &str, records: &[Record]) -> SqlGateResult<NamedStatement> {
    if records.is_empty() {
        return Err(SqlGateError::invalid_input("cannot insert an empty batch"));
    }

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    let mut params = Vec::new();

    for (ordinal, record) in records.iter().enumerate() {
        let row_columns: Vec<&String> =
            record.iter().filter(|(_, v)| !v.is_null()).map(|(c, _)| c).collect();
        if row_columns.is_empty() {
            return Err(SqlGateError::invalid_input(format!(
                "record {ordinal} has no non-null fields"
            )));
        }

        if ordinal == 0 {
            for column in &row_columns {
                ensure_identifier(column.as_str())?;
            }
            columns = row_columns.iter().map(|c| c.to_string()).collect();
        } else if row_columns.iter().map(|c| c.as_str()).ne(columns.iter().map(|c| c.as_str())) {
            return Err(SqlGateError::invalid_input(format!(
                "record {ordinal} has columns ({}) that differ from the first record ({})",
                row_columns.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(","),
                columns.join(",")
            )));
        }

        let mut placeholders = Vec::new();
        for column in &columns {
            let name = format!("{column}_{ordinal}");
            placeholders.push(format!(":{name}"));
            // Uniform column sets were just enforced, so the lookup succeeds
            params.push(bind(name, record.get(column).unwrap_or(&JsonValue::Null)));
        }
        rows.push(format!("({})", placeholders.join(",")));
    }

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES {}",
        columns.join(","),
        rows.join(",")
    );
    Ok(NamedStatement { sql, params })
}

/// Build an UPDATE with an external predicate.
///
/// Record placeholders are synthesized with an `s_` prefix so they cannot
/// collide with the predicate's own placeholder names. Predicate parameters
/// are bound first, record parameters after.
pub fn build_update(
    table: &str,
    record: &Record,
    predicate: &Predicate,
) -> SqlGateResult<NamedStatement> {
    if record.is_empty() {
        return Err(SqlGateError::invalid_input("cannot update with an empty record"));
    }

    let mut assignments = Vec::new();
    let mut params: Vec<BoundParameter> = predicate.bound_parameters().to_vec();
    for (column, value) in record {
        ensure_identifier(column)?;
        assignments.push(format!("{column}=:s_{column}"));
        params.push(bind(format!("s_{column}"), value));
    }

    let sql = format!(
        "UPDATE {table} SET {} WHERE {}",
        assignments.join(","),
        predicate.fragment()
    );
    Ok(NamedStatement { sql, params })
}

/// Build a DELETE with an external predicate.
pub fn build_delete(table: &str, predicate: &Predicate) -> SqlGateResult<NamedStatement> {
    let sql = format!("DELETE FROM {table} WHERE {}", predicate.fragment());
    Ok(NamedStatement {
        sql,
        params: predicate.bound_parameters().to_vec(),
    })
}

/// Render a named statement into the driver's placeholder syntax.
///
/// Returns the rewritten SQL and the bound values in placeholder order.
/// Placeholders are recognized outside single-quoted strings; `::` stays
/// untouched so Postgres casts survive. A placeholder with no bound
/// parameter is an error.
pub fn render(
    statement: &NamedStatement,
    kind: DriverKind,
) -> SqlGateResult<(String, Vec<BindValue>)> {
    let by_name: HashMap<&str, &BindValue> = statement
        .params
        .iter()
        .map(|p| (p.name.as_str(), &p.value))
        .collect();

    let chars: Vec<char> = statement.sql.chars().collect();
    let mut out = String::with_capacity(statement.sql.len());
    let mut values = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\'' {
            // copy the quoted literal verbatim, honoring '' escapes
            out.push(ch);
            i += 1;
            while i < chars.len() {
                let c = chars[i];
                out.push(c);
                i += 1;
                if c == '\'' {
                    if i < chars.len() && chars[i] == '\'' {
                        out.push('\'');
                        i += 1;
                    } else {
                        break;
                    }
                }
            }
        } else if ch == ':' && i + 1 < chars.len() && chars[i + 1] == ':' {
            out.push_str("::");
            i += 2;
        } else if ch == ':' && i + 1 < chars.len() && is_identifier_start(chars[i + 1]) {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && is_identifier_char(chars[end]) {
                end += 1;
            }
            let name: String = chars[start..end].iter().collect();
            let value = by_name.get(name.as_str()).ok_or_else(|| {
                SqlGateError::invalid_input(format!("no bound parameter for placeholder ':{name}'"))
            })?;
            values.push((*value).clone());
            match kind {
                DriverKind::Postgres => out.push_str(&format!("${}", values.len())),
                DriverKind::MySql | DriverKind::Sqlite => out.push('?'),
            }
            i = end;
        } else {
            out.push(ch);
            i += 1;
        }
    }

    Ok((out, values))
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Column names become placeholder names, so they must be scannable
/// identifiers.
fn ensure_identifier(column: &str) -> SqlGateResult<()> {
    let mut chars = column.chars();
    let valid = match chars.next() {
        Some(first) => is_identifier_start(first) && chars.all(is_identifier_char),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SqlGateError::invalid_input(format!(
            "column name '{column}' is not a valid identifier"
        )))
    }
}
