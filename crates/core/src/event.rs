//! Message-Bus und UI-Ereignisse
//!
//! Der Kern kennt das Relay nur ueber den `MessageBus`-Trait (ausgehende
//! Richtung). Eingehende Ereignisse kommen ueber eine tokio-Queue in die
//! Session. Was die Session der UI mitteilt, ist ein `SessionEvent`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::PeerName;

/// Ereignisse die eine Session an den UI-Kollaborateur weitergibt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Entschluesselte Direktnachricht
    Nachricht { von: PeerName, text: String },
    /// Eingehende Nachricht wurde verworfen (passiver Hinweis, kein Abbruch)
    Warnung { von: PeerName, grund: String },
    /// Teilnehmerliste des Relays, unveraendert durchgereicht
    Roster { namen: Vec<PeerName> },
}

/// Ausgehende Seite des Message-Bus zum Relay
///
/// Die konkrete Implementierung (In-Process-Relay, spaeter ein echter
/// Transport) entscheidet wie die Anfragen transportiert werden.
#[async_trait]
pub trait MessageBus: Send + Sync + 'static {
    /// Meldet Namen + oeffentlichen Schluessel (Base64) beim Relay an
    async fn join(&self, name: &PeerName, public_key: &str) -> crate::Result<()>;

    /// Fragt den oeffentlichen Schluessel eines Teilnehmers ab (`None` = unbekannt)
    async fn resolve_peer(&self, name: &PeerName) -> crate::Result<Option<String>>;

    /// Uebergibt ein serialisiertes Envelope zur Zustellung an `to`
    async fn send_dm(&self, to: &PeerName, envelope: String) -> crate::Result<()>;

    /// Meldet die Session beim Relay ab
    async fn leave(&self) -> crate::Result<()>;
}
