//! Database access layer.
//!
//! - Connection lifecycle and health checks
//! - Session timezone synchronization
//! - Parameter binding with per-value type inference
//! - Dynamic statement construction and the CRUD engine
//! - Named connection registry

pub mod crud;
pub mod lifecycle;
pub mod params;
pub mod registry;
pub mod statement;
pub(crate) mod timezone;

pub use crud::CrudEngine;
pub use lifecycle::{ConnectionLifecycle, DbHandle, HealthCheck};
pub use params::{BindValue, BoundParameter, bind};
pub use registry::ConnectionRegistry;
pub use statement::{NamedStatement, Record};
