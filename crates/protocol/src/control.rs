//! Control-Protokoll zwischen Client und Relay
//!
//! ## Design
//! - Client -> Relay: `ClientRequest` (join, resolvePeer, dm)
//! - Relay -> Client: `RelayResponse` als direkte Antwort auf einen Request
//! - Relay -> Client: `ServerEvent` ungefragt (eingehende DM, Roster)
//! - JSON-Serialisierung via serde, Tagged Enums fuer typsichere Nachrichten

use backroom_core::PeerName;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Error-Responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    /// Verbindung hat noch kein `join` gesendet
    NotJoined,
    /// Verbindung ist dem Relay nicht (mehr) bekannt
    UnknownConnection,
}

// ---------------------------------------------------------------------------
// Client -> Relay
// ---------------------------------------------------------------------------

/// Anfragen eines Clients an das Relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Anmeldung unter einem Namen mit Base64-Public-Key
    Join {
        name: PeerName,
        #[serde(rename = "publicKey")]
        public_key: String,
    },
    /// Public Key eines Teilnehmers erfragen
    #[serde(rename = "resolvePeer")]
    ResolvePeer { name: PeerName },
    /// Verschluesselte Direktnachricht (Envelope im Transport-Format)
    Dm { to: PeerName, envelope: String },
}

impl ClientRequest {
    /// Serialisiert die Anfrage als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Anfrage aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Relay -> Client (Antworten)
// ---------------------------------------------------------------------------

/// Direkte Antwort des Relays auf eine `ClientRequest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayResponse {
    /// Anfrage angenommen (join, dm)
    Ok,
    /// Antwort auf `resolvePeer`; `None` wenn der Name unbekannt ist
    PublicKey {
        #[serde(rename = "publicKey")]
        public_key: Option<String>,
    },
    Error { code: ErrorCode, message: String },
}

impl RelayResponse {
    /// Erstellt eine Fehler-Antwort
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Relay -> Client (Ereignisse)
// ---------------------------------------------------------------------------

/// Ungefragte Ereignisse vom Relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Eingehende Direktnachricht; `from` setzt das Relay, nicht der Absender
    Dm { from: PeerName, envelope: String },
    /// Aktuelle Teilnehmerliste
    Roster { names: Vec<PeerName> },
}

impl ServerEvent {
    /// Serialisiert das Ereignis als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert ein Ereignis aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
