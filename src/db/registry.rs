//! Process-wide connection registry.
//!
//! Maps a configuration name to a shared, lazily-connected lifecycle. This
//! is the explicit, injectable replacement for static per-type connection
//! lookup: callers hold a registry and ask it by name instead of reaching
//! through a global.

use crate::config::DriverConfig;
use crate::db::lifecycle::{ConnectionLifecycle, DbHandle};
use crate::error::{SqlGateError, SqlGateResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Named configurations and their shared connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    entries: Arc<RwLock<HashMap<String, Arc<Mutex<ConnectionLifecycle>>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration under a name. The connection itself is not
    /// opened until the first [`ConnectionRegistry::for_config`] call.
    pub async fn register(
        &self,
        name: impl Into<String>,
        config: DriverConfig,
    ) -> SqlGateResult<()> {
        let name = name.into();
        let mut entries = self.entries.write().await;
        if entries.contains_key(&name) {
            return Err(SqlGateError::invalid_input(format!(
                "configuration '{name}' is already registered"
            )));
        }
        info!(name = %name, dsn = %config.masked_dsn(), "Registered configuration");
        entries.insert(name, Arc::new(Mutex::new(ConnectionLifecycle::new(config))));
        Ok(())
    }

    /// Shared handle for a named configuration, connecting lazily.
    pub async fn for_config(&self, name: &str) -> SqlGateResult<DbHandle> {
        let entry = {
            let entries = self.entries.read().await;
            entries
                .get(name)
                .cloned()
                .ok_or_else(|| SqlGateError::config_not_found(name))?
        }; // read lock released before connecting

        let mut lifecycle = entry.lock().await;
        lifecycle.handle().await
    }

    /// Run a health check against a named configuration.
    pub async fn ping(&self, name: &str) -> SqlGateResult<bool> {
        let entry = {
            let entries = self.entries.read().await;
            entries
                .get(name)
                .cloned()
                .ok_or_else(|| SqlGateError::config_not_found(name))?
        };
        let mut lifecycle = entry.lock().await;
        Ok(lifecycle.ping().await)
    }

    /// Disconnect one named configuration. Unknown names are ignored; the
    /// registration itself is kept for later reconnects.
    pub async fn disconnect(&self, name: &str) {
        let entry = {
            let entries = self.entries.read().await;
            entries.get(name).cloned()
        };
        if let Some(entry) = entry {
            let mut lifecycle = entry.lock().await;
            lifecycle.disconnect().await;
        }
    }

    /// Disconnect everything and drop all registrations.
    pub async fn disconnect_all(&self) {
        let mut entries = self.entries.write().await;
        for (name, entry) in entries.drain() {
            let mut lifecycle = entry.lock().await;
            info!(name = %name, "Closing connection");
            lifecycle.disconnect().await;
        }
        info!("All connections closed");
    }

    /// Names of all registered configurations.
    pub async fn names(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        entries.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
