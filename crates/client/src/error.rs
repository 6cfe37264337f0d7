//! Fehlertypen fuer das Client-Crate

use backroom_core::{BackroomError, PeerName};
use backroom_crypto::CryptoError;
use thiserror::Error;

use crate::session::SessionState;

/// Fehler einer DM-Session
///
/// Alles ausser `EntropyUnavailable` betrifft genau eine Nachricht und
/// laesst die Session weiterlaufen.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unbekannter Empfaenger: {0}")]
    UnknownRecipient(PeerName),

    #[error("Unbekannter Absender: {0}")]
    UnknownSender(PeerName),

    #[error("Ungueltiges Envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Authentifizierung fehlgeschlagen (falscher Schluessel oder manipulierte Nachricht)")]
    Authentication,

    #[error("Ungueltiger Peer-Schluessel: {0}")]
    InvalidKey(String),

    #[error("Keine Entropie verfuegbar: {0}")]
    EntropyUnavailable(String),

    #[error("Ungueltiger Zustand: erwartet {erwartet:?}, aktuell {aktuell:?}")]
    InvalidState {
        erwartet: SessionState,
        aktuell: SessionState,
    },

    #[error("Klartext von {0} ist kein gueltiges UTF-8")]
    InvalidPlaintext(PeerName),

    #[error("Krypto-Fehler: {0}")]
    Krypto(String),

    #[error("Bus-Fehler: {0}")]
    Bus(#[from] BackroomError),
}

impl SessionError {
    /// Gibt zurueck ob der Fehler die Session beendet
    pub fn ist_fatal(&self) -> bool {
        matches!(self, Self::EntropyUnavailable(_))
    }
}

impl From<CryptoError> for SessionError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::EntropyUnavailable(msg) => Self::EntropyUnavailable(msg),
            CryptoError::InvalidKey(msg) => Self::InvalidKey(msg),
            CryptoError::MalformedEnvelope(msg) => Self::MalformedEnvelope(msg),
            CryptoError::Authentication => Self::Authentication,
            andere => Self::Krypto(andere.to_string()),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
