//! sqlgate — a thin database-access layer over sqlx.
//!
//! Unifies connection configuration, connection lifecycle, and dynamic CRUD
//! statement construction across MySQL, PostgreSQL, and SQLite:
//!
//! - [`DriverConfig`] renders driver-native connection strings from
//!   structured configuration.
//! - [`ConnectionLifecycle`] owns lazy, idempotent connect/disconnect/
//!   reconnect plus health checks with latency measurement.
//! - [`CrudEngine`] builds parameterized INSERT, batched INSERT, UPDATE,
//!   and DELETE statements from heterogeneous records, inferring a bind
//!   type per value.
//! - [`ConnectionRegistry`] shares lazily-connected handles by name.
//!
//! WHERE-clause predicates come from an external query builder through the
//! [`Predicate`] boundary; the engine never inspects fragment content.
//!
//! ```no_run
//! use serde_json::json;
//! use sqlgate::{ConnectionLifecycle, CrudEngine, DriverConfig, Predicate, Record};
//!
//! # async fn demo() -> sqlgate::SqlGateResult<()> {
//! let config = DriverConfig::postgres("app").with_credentials("svc", "secret");
//! let mut lifecycle = ConnectionLifecycle::new(config);
//! let engine = CrudEngine::new(lifecycle.handle().await?);
//!
//! let mut record = Record::new();
//! record.insert("id".into(), json!(null));
//! record.insert("name".into(), json!("Ann"));
//! let id = engine.insert_one("users", &record).await?;
//!
//! let matched = Predicate::new("id = :id").bind("id", &id);
//! engine.delete("users", &matched).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod predicate;

pub use config::{DriverConfig, DriverKind};
pub use db::{
    BindValue, BoundParameter, ConnectionLifecycle, ConnectionRegistry, CrudEngine, DbHandle,
    HealthCheck, Record, bind,
};
pub use error::{SqlGateError, SqlGateResult};
pub use predicate::Predicate;
