//! Gemeinsame Identifikationstypen fuer backroom
//!
//! Newtypes statt nackter Strings/UUIDs, damit Teilnehmer-Namen und
//! Relay-Verbindungen zur Compilezeit nicht verwechselt werden.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BackroomError, Result};

/// Name eines Teilnehmers, so wie er beim Relay angemeldet ist
///
/// Der Name ist der einzige Schluessel fuer Verzeichnis- und
/// Secret-Cache. Er ist case-sensitiv.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerName(String);

impl PeerName {
    /// Prueft einen vom Benutzer eingegebenen Namen (getrimmt, nicht leer)
    pub fn pruefen(roh: &str) -> Result<Self> {
        let name = roh.trim();
        if name.is_empty() {
            return Err(BackroomError::UngueltigerName(roh.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeerName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for PeerName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for PeerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Eindeutige ID einer Verbindung zum Relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}
