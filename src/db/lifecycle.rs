//! Connection lifecycle.
//!
//! A [`ConnectionLifecycle`] owns at most one live [`DbHandle`] for its
//! configuration. The handle is created lazily on first use; `connect` is
//! idempotent and `reconnect` is disconnect-then-connect. Concurrent CRUD
//! calls against the same lifecycle require caller-provided mutual
//! exclusion; use [`crate::db::registry::ConnectionRegistry`] for shared,
//! per-name handles.

use crate::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DriverConfig, DriverKind, debug_mode};
use crate::db::timezone;
use crate::error::{SqlGateError, SqlGateResult};
use serde::Serialize;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{MySqlPool, PgPool, SqlitePool};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Idle timeout applied to non-persistent connections.
const IDLE_TIMEOUT_SECS: u64 = 600;

/// A live, driver-native connection handle.
///
/// Backed by a driver-specific pool holding exactly one connection, so a
/// clone shares the same underlying session.
#[derive(Debug, Clone)]
pub enum DbHandle {
    MySql(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DbHandle {
    /// Driver family of this handle.
    pub fn kind(&self) -> DriverKind {
        match self {
            Self::MySql(_) => DriverKind::MySql,
            Self::Postgres(_) => DriverKind::Postgres,
            Self::Sqlite(_) => DriverKind::Sqlite,
        }
    }

    /// Close the underlying connection.
    pub async fn close(&self) {
        match self {
            Self::MySql(pool) => pool.close().await,
            Self::Postgres(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
    }

    /// Execute a statement with no parameters, discarding the result.
    pub(crate) async fn execute_raw(&self, sql: &str) -> Result<(), sqlx::Error> {
        match self {
            Self::MySql(pool) => sqlx::query(sql).execute(pool).await.map(|_| ()),
            Self::Postgres(pool) => sqlx::query(sql).execute(pool).await.map(|_| ()),
            Self::Sqlite(pool) => sqlx::query(sql).execute(pool).await.map(|_| ()),
        }
    }
}

/// Health-check outcome. Produced fresh on each call, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub status: bool,
    /// Wall-clock round-trip in milliseconds, rounded to 2 decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Owns the connection state machine for one configuration.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    config: DriverConfig,
    handle: Option<DbHandle>,
}

impl ConnectionLifecycle {
    /// Create a lifecycle in the Disconnected state.
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            handle: None,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Open the connection if not already open. Idempotent: a second call
    /// against a connected lifecycle does nothing.
    pub async fn connect(&mut self) -> SqlGateResult<()> {
        self.connect_with_timeout(DEFAULT_CONNECT_TIMEOUT_SECS).await
    }

    /// Open the connection with an explicit I/O timeout in seconds.
    ///
    /// On failure the lifecycle stays Disconnected and the driver error is
    /// wrapped as [`SqlGateError::Connection`].
    pub async fn connect_with_timeout(&mut self, timeout_secs: u64) -> SqlGateResult<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let handle = self.open_handle(timeout_secs).await?;

        let strict = debug_mode();
        if let Err(err) = timezone::apply(&handle, &timezone::local_timezone()).await {
            if strict {
                handle.close().await;
                return Err(SqlGateError::connection_with(
                    "failed to apply session timezone",
                    err,
                ));
            }
            warn!(error = %err, "Failed to apply session timezone, continuing");
        }

        info!(dsn = %self.config.masked_dsn(), "Connected");
        self.handle = Some(handle);
        Ok(())
    }

    /// Release the handle unconditionally. Always succeeds; idempotent.
    pub async fn disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close().await;
            info!(dsn = %self.config.masked_dsn(), "Disconnected");
        }
    }

    /// Disconnect, then connect. If the connect fails, the lifecycle is
    /// Disconnected and the error surfaces.
    pub async fn reconnect(&mut self) -> SqlGateResult<()> {
        self.disconnect().await;
        self.connect().await
    }

    /// Connect if needed and return a handle clone.
    pub async fn handle(&mut self) -> SqlGateResult<DbHandle> {
        self.connect().await?;
        // connect() just ensured the handle exists
        self.handle
            .clone()
            .ok_or_else(|| SqlGateError::connection("connection handle missing after connect"))
    }

    /// Round-trip health check. Never errors: any failure, connecting or
    /// querying, is reported as `false`.
    pub async fn ping(&mut self) -> bool {
        match self.try_ping().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Ping failed");
                false
            }
        }
    }

    /// Health check with latency measurement and error capture.
    pub async fn ping_detail(&mut self) -> HealthCheck {
        let start = Instant::now();
        let outcome = self.try_ping().await;
        let latency_ms = round2(start.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            Ok(()) => HealthCheck {
                status: true,
                latency_ms: Some(latency_ms),
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "Ping failed");
                HealthCheck {
                    status: false,
                    latency_ms: Some(latency_ms),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn try_ping(&mut self) -> SqlGateResult<()> {
        let handle = self.handle().await?;
        handle.execute_raw("SELECT 1").await?;
        Ok(())
    }

    async fn open_handle(&self, timeout_secs: u64) -> SqlGateResult<DbHandle> {
        let config = &self.config;
        let acquire_timeout = Duration::from_secs(timeout_secs);
        // Non-persistent connections are reaped when idle; persistent ones
        // are kept warm for reuse across request lifetimes.
        let idle_timeout = if config.persistent() {
            None
        } else {
            Some(Duration::from_secs(IDLE_TIMEOUT_SECS))
        };
        let min_connections = if config.persistent() { 1 } else { 0 };

        debug!(dsn = %config.masked_dsn(), timeout_secs, "Opening connection");

        match config.kind() {
            DriverKind::MySql => {
                let mut options = MySqlConnectOptions::new()
                    .host(config.host())
                    .port(config.port())
                    .database(config.database())
                    .username(config.username())
                    .password(config.password());
                if let Some(charset) = config.charset() {
                    options = options.charset(charset);
                }

                let pool = MySqlPoolOptions::new()
                    .max_connections(1)
                    .min_connections(min_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        SqlGateError::connection_with(
                            format!("failed to connect to {}", config.masked_dsn()),
                            e,
                        )
                    })?;
                Ok(DbHandle::MySql(pool))
            }
            DriverKind::Postgres => {
                let mut options = PgConnectOptions::new()
                    .host(config.host())
                    .port(config.port())
                    .database(config.database())
                    .username(config.username())
                    .password(config.password());
                let mut session_options: Vec<(&str, &str)> = Vec::new();
                if let Some(charset) = config.charset() {
                    session_options.push(("client_encoding", charset));
                }
                if let Some(schema) = config.schema() {
                    session_options.push(("search_path", schema));
                }
                if !session_options.is_empty() {
                    options = options.options(session_options);
                }

                let pool = PgPoolOptions::new()
                    .max_connections(1)
                    .min_connections(min_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        SqlGateError::connection_with(
                            format!("failed to connect to {}", config.masked_dsn()),
                            e,
                        )
                    })?;
                Ok(DbHandle::Postgres(pool))
            }
            DriverKind::Sqlite => {
                let options = SqliteConnectOptions::new()
                    .filename(config.database())
                    .create_if_missing(true);

                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(acquire_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        SqlGateError::connection_with(
                            format!("failed to connect to {}", config.masked_dsn()),
                            e,
                        )
                    })?;
                Ok(DbHandle::Sqlite(pool))
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
