//! Session timezone synchronization.
//!
//! On connection creation the process timezone is pushed into the session so
//! server-side time functions agree with the application. This is a
//! best-effort convenience: drivers without a session timezone get a warning
//! and nothing else.

use crate::config::DriverKind;
use crate::db::lifecycle::DbHandle;
use tracing::{debug, warn};

/// Session-timezone statement for a driver, or `None` when the driver has no
/// such statement. Oracle-family syntax would be
/// `ALTER SESSION SET TIME_ZONE = '<tz>'`; no such driver is wired here.
pub(crate) fn timezone_statement(kind: DriverKind, tz: &str) -> Option<String> {
    let quoted = quote_literal(tz);
    match kind {
        DriverKind::Postgres => Some(format!("SET TIMEZONE TO {quoted}")),
        DriverKind::MySql => Some(format!("SET time_zone = {quoted}")),
        DriverKind::Sqlite => None,
    }
}

/// Apply the session timezone to a live handle.
///
/// Drivers without a mapped statement are skipped with a warning. Execution
/// failures bubble up; the caller decides whether they are fatal.
pub(crate) async fn apply(handle: &DbHandle, tz: &str) -> Result<(), sqlx::Error> {
    match timezone_statement(handle.kind(), tz) {
        Some(sql) => {
            debug!(timezone = %tz, sql = %sql, "Applying session timezone");
            handle.execute_raw(&sql).await
        }
        None => {
            warn!(
                driver = %handle.kind(),
                "Timezone setting not implemented for driver"
            );
            Ok(())
        }
    }
}

/// Process-local timezone name: `TZ` environment variable, else UTC.
pub(crate) fn local_timezone() -> String {
    std::env::var("TZ")
        .ok()
        .filter(|tz| !tz.trim().is_empty())
        .unwrap_or_else(|| "UTC".to_string())
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
