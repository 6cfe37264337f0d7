//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
///
/// Bis auf `EntropyUnavailable` betreffen alle Fehler genau eine
/// Nachricht und lassen die Session weiterlaufen.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Keine Zufallsquelle verfuegbar: {0}")]
    EntropyUnavailable(String),

    #[error("Ungueltiger oeffentlicher Schluessel: {0}")]
    InvalidKey(String),

    #[error("Ungueltiges Envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Authentifizierung fehlgeschlagen (falscher Schluessel oder manipuliert)")]
    Authentication,

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),
}

impl CryptoError {
    /// Gibt true zurueck wenn die Session nach diesem Fehler nicht weiterlaufen kann
    pub fn ist_fatal(&self) -> bool {
        matches!(self, Self::EntropyUnavailable(_))
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
