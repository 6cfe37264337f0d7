//! Fehlertypen fuer den Message-Bus
//!
//! Alles was beim Reden mit dem Relay schiefgehen kann. Die
//! kryptografischen Fehler leben in `backroom-crypto`, die
//! Protokollfehler pro Nachricht in `backroom-client`.

use thiserror::Error;

/// Globaler Result-Alias fuer Bus-Operationen
pub type Result<T> = std::result::Result<T, BackroomError>;

/// Fehler beim Austausch mit dem Relay
#[derive(Debug, Error)]
pub enum BackroomError {
    // --- Verbindung ---
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    #[error("Zeitlimit ueberschritten: {0}")]
    Zeitlimit(String),

    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Ungueltiger Teilnehmer-Name: {0:?}")]
    UngueltigerName(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl BackroomError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler wiederholbar sein koennte
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(
            self,
            Self::Zeitlimit(_) | Self::Verbindung(_) | Self::Getrennt(_)
        )
    }
}
