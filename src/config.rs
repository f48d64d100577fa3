//! Driver configuration.
//!
//! A [`DriverConfig`] is an immutable value holding everything needed to open
//! one connection: driver family, endpoint, credentials, and optional
//! charset/schema. The driver family is fixed at construction and determines
//! the DSN grammar and default port.

use serde::{Deserialize, Serialize};

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Environment variable enabling strict mode: session-setup failures abort
/// the connect instead of degrading to a warning.
pub const DEBUG_ENV_VAR: &str = "SQLGATE_DEBUG";

/// Supported driver families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Includes MariaDB
    MySql,
    Postgres,
    Sqlite,
}

impl DriverKind {
    /// DSN scheme prefix for this driver.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "pgsql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Display name for this driver.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::Sqlite => "SQLite",
        }
    }

    /// Default server port, if the driver is network-based.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::Postgres => Some(5432),
            Self::Sqlite => None,
        }
    }
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Connection parameters for one driver family.
///
/// Constructed once, read-only thereafter. The `with_*` methods consume the
/// value and are meant for build-up before first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    kind: DriverKind,
    host: String,
    port: u16,
    database: String,
    username: String,
    /// Sensitive - never serialized or logged
    #[serde(skip_serializing)]
    #[serde(default)]
    password: String,
    charset: Option<String>,
    schema: Option<String>,
    /// Keep the connection alive across logically separate request lifetimes.
    persistent: bool,
}

impl DriverConfig {
    /// MySQL configuration with driver defaults (localhost:3306, user `root`).
    pub fn mysql(database: impl Into<String>) -> Self {
        Self {
            kind: DriverKind::MySql,
            host: "localhost".to_string(),
            port: 3306,
            database: database.into(),
            username: "root".to_string(),
            password: String::new(),
            charset: None,
            schema: None,
            persistent: false,
        }
    }

    /// PostgreSQL configuration with driver defaults (localhost:5432, user
    /// `postgres`, schema `public`).
    pub fn postgres(database: impl Into<String>) -> Self {
        Self {
            kind: DriverKind::Postgres,
            host: "localhost".to_string(),
            port: 5432,
            database: database.into(),
            username: "postgres".to_string(),
            password: String::new(),
            charset: None,
            schema: Some("public".to_string()),
            persistent: false,
        }
    }

    /// SQLite configuration for a database file path.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            kind: DriverKind::Sqlite,
            host: String::new(),
            port: 0,
            database: path.into(),
            username: String::new(),
            password: String::new(),
            charset: None,
            schema: None,
            persistent: false,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Set the schema qualifier. Only meaningful for drivers with schema
    /// support; [`DriverConfig::schema`] stays `None` for the rest.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        if self.kind == DriverKind::Postgres {
            self.schema = Some(schema.into());
        }
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn kind(&self) -> DriverKind {
        self.kind
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Schema qualifier, present only for drivers that support one.
    pub fn schema(&self) -> Option<&str> {
        match self.kind {
            DriverKind::Postgres => self.schema.as_deref(),
            _ => None,
        }
    }

    pub fn persistent(&self) -> bool {
        self.persistent
    }

    /// Render the driver-native connection string.
    ///
    /// Pure function of the config fields: identical fields always yield an
    /// identical string.
    pub fn render_dsn(&self) -> String {
        match self.kind {
            DriverKind::Sqlite => format!("sqlite:{}", self.database),
            DriverKind::MySql => {
                let mut dsn = self.base_dsn();
                if let Some(charset) = &self.charset {
                    dsn.push_str(&format!("charset={charset};"));
                }
                dsn
            }
            DriverKind::Postgres => {
                let mut dsn = self.base_dsn();
                if let Some(charset) = &self.charset {
                    dsn.push_str(&format!("options='--client_encoding={charset}';"));
                }
                dsn
            }
        }
    }

    fn base_dsn(&self) -> String {
        format!(
            "{}:host={};port={};dbname={};",
            self.kind.scheme(),
            self.host,
            self.port,
            self.database
        )
    }

    /// Display-safe DSN for logging. The DSN grammar itself carries no
    /// credentials, but keep the masking seam in one place.
    pub fn masked_dsn(&self) -> String {
        self.render_dsn()
    }
}

/// Whether strict mode is enabled via [`DEBUG_ENV_VAR`].
///
/// Read at connection-creation time. In strict mode, session-setup failures
/// (timezone sync on a mapped driver) abort the connect; in the legacy
/// default mode they are logged and tolerated.
pub fn debug_mode() -> bool {
    std::env::var(DEBUG_ENV_VAR)
        .map(|v| flag_enabled(&v))
        .unwrap_or(false)
}

/// A flag value counts as enabled unless it is empty, `0`, or `false`
/// (case-insensitive, surrounding whitespace ignored).
fn flag_enabled(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    !v.is_empty() && v != "0" && v != "false"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsn_is_deterministic() {
        let config = DriverConfig::postgres("app").with_host("db.internal");
        assert_eq!(config.render_dsn(), config.render_dsn());
    }

    #[test]
    fn mysql_base_dsn() {
        let config = DriverConfig::mysql("shop");
        assert_eq!(config.render_dsn(), "mysql:host=localhost;port=3306;dbname=shop;");
    }

    #[test]
    fn mysql_dsn_appends_charset() {
        let config = DriverConfig::mysql("shop").with_charset("utf8mb4");
        assert_eq!(
            config.render_dsn(),
            "mysql:host=localhost;port=3306;dbname=shop;charset=utf8mb4;"
        );
    }

    #[test]
    fn postgres_base_dsn() {
        let config = DriverConfig::postgres("app")
            .with_host("10.0.0.5")
            .with_port(5433);
        assert_eq!(config.render_dsn(), "pgsql:host=10.0.0.5;port=5433;dbname=app;");
    }

    #[test]
    fn postgres_dsn_appends_client_encoding() {
        let config = DriverConfig::postgres("app").with_charset("UTF8");
        assert_eq!(
            config.render_dsn(),
            "pgsql:host=localhost;port=5432;dbname=app;options='--client_encoding=UTF8';"
        );
    }

    #[test]
    fn sqlite_dsn_is_path_based() {
        let config = DriverConfig::sqlite("/tmp/test.db");
        assert_eq!(config.render_dsn(), "sqlite:/tmp/test.db");
    }

    #[test]
    fn schema_only_for_postgres() {
        assert_eq!(DriverConfig::postgres("app").schema(), Some("public"));
        assert_eq!(
            DriverConfig::postgres("app").with_schema("audit").schema(),
            Some("audit")
        );
        assert_eq!(DriverConfig::mysql("shop").schema(), None);
        assert_eq!(DriverConfig::mysql("shop").with_schema("x").schema(), None);
        assert_eq!(DriverConfig::sqlite("a.db").schema(), None);
    }

    #[test]
    fn default_ports() {
        assert_eq!(DriverKind::MySql.default_port(), Some(3306));
        assert_eq!(DriverKind::Postgres.default_port(), Some(5432));
        assert_eq!(DriverKind::Sqlite.default_port(), None);
        assert_eq!(DriverConfig::mysql("shop").port(), 3306);
        assert_eq!(DriverConfig::postgres("app").port(), 5432);
    }

    #[test]
    fn credentials_default_per_driver() {
        assert_eq!(DriverConfig::mysql("shop").username(), "root");
        assert_eq!(DriverConfig::postgres("app").username(), "postgres");
    }

    #[test]
    fn flag_values_that_enable_strict_mode() {
        assert!(flag_enabled("1"));
        assert!(flag_enabled("true"));
        assert!(flag_enabled("TRUE"));
        assert!(flag_enabled("on"));
        assert!(flag_enabled(" yes "));
    }

    #[test]
    fn flag_values_that_keep_legacy_mode() {
        assert!(!flag_enabled(""));
        assert!(!flag_enabled("   "));
        assert!(!flag_enabled("0"));
        assert!(!flag_enabled(" 0 "));
        assert!(!flag_enabled("false"));
        assert!(!flag_enabled("FALSE"));
    }

    #[test]
    fn serialized_config_omits_password() {
        let config = DriverConfig::postgres("app").with_credentials("svc", "s3cret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("s3cret"));
    }
}
