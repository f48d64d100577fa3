//! Error types for sqlgate.
//!
//! All driver-level failures are caught at the lifecycle/CRUD boundary and
//! re-raised through this taxonomy with the original sqlx error preserved as
//! the source. Raw driver errors never leak to callers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlGateError {
    /// Connect-time failure: malformed options, authentication, network,
    /// or timeout while opening the connection.
    #[error("Connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// INSERT/UPDATE/DELETE failed at the driver level, or produced an
    /// unusable result (missing RETURNING value).
    #[error("Write failed: {message}")]
    Write {
        message: String,
        /// e.g. "23505" for a unique violation
        sql_state: Option<String>,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Caller violated a statement-construction precondition.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// No configuration registered under this name.
    #[error("No registered configuration named '{name}'")]
    ConfigNotFound { name: String },
}

impl SqlGateError {
    /// Create a connection error without an underlying driver error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error wrapping a driver error.
    pub fn connection_with(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a write error without an underlying driver error.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
            sql_state: None,
            source: None,
        }
    }

    /// Create a write error wrapping a driver error.
    pub fn write_with(message: impl Into<String>, source: sqlx::Error) -> Self {
        let sql_state = match &source {
            sqlx::Error::Database(db_err) => db_err.code().map(|c| c.to_string()),
            _ => None,
        };
        Self::Write {
            message: message.into(),
            sql_state,
            source: Some(source),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a config-not-found error.
    pub fn config_not_found(name: impl Into<String>) -> Self {
        Self::ConfigNotFound { name: name.into() }
    }

    /// SQLSTATE code of the underlying database error, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Write { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Whether retrying the operation (after a reconnect) could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Convert sqlx errors at the engine boundary.
///
/// Transport-level failures map to `Connection`; database-reported failures
/// map to `Write` with the SQLSTATE preserved.
impl From<sqlx::Error> for SqlGateError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(_) => {
                SqlGateError::connection_with("invalid connection options", err)
            }
            sqlx::Error::Io(_) => SqlGateError::connection_with("I/O failure", err),
            sqlx::Error::Tls(_) => SqlGateError::connection_with("TLS failure", err),
            sqlx::Error::Protocol(_) => SqlGateError::connection_with("protocol failure", err),
            sqlx::Error::PoolTimedOut => {
                SqlGateError::connection_with("timed out acquiring connection", err)
            }
            sqlx::Error::PoolClosed => SqlGateError::connection_with("connection is closed", err),
            sqlx::Error::Database(_) => {
                let message = err.to_string();
                SqlGateError::write_with(message, err)
            }
            _ => {
                let message = err.to_string();
                SqlGateError::write_with(message, err)
            }
        }
    }
}

/// Result type alias for all sqlgate operations.
pub type SqlGateResult<T> = Result<T, SqlGateError>;
