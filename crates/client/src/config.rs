//! Konfiguration einer DM-Session

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Einstellungen einer Session (TOML-Abschnitt `[session]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Zeitlimit fuer eine `resolvePeer`-Abfrage beim Relay
    pub resolve_timeout_ms: u64,
    /// Kapazitaet der Ereignis-Queue zur UI
    pub event_queue_groesse: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: 5_000,
            event_queue_groesse: 64,
        }
    }
}

impl SessionConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}
