//! Verbindung eines Teilnehmers zum In-Process-Relay
//!
//! `RelayLink` ist die ausgehende Seite des Message-Bus. Wird der Link
//! fallen gelassen, trennt er die Verbindung wie ein geschlossener Socket.

use async_trait::async_trait;
use backroom_core::{BackroomError, ConnectionId, MessageBus, PeerName};
use backroom_protocol::{ClientRequest, ErrorCode, RelayResponse};

use crate::relay::Relay;

/// Ausgehende Seite einer Relay-Verbindung
pub struct RelayLink {
    relay: Relay,
    verbindung: ConnectionId,
}

impl RelayLink {
    pub(crate) fn neu(relay: Relay, verbindung: ConnectionId) -> Self {
        Self { relay, verbindung }
    }

    pub fn verbindung(&self) -> ConnectionId {
        self.verbindung
    }

    fn anfrage(&self, anfrage: ClientRequest) -> backroom_core::Result<RelayResponse> {
        match self.relay.dispatch(self.verbindung, anfrage) {
            RelayResponse::Error {
                code: ErrorCode::UnknownConnection,
                message,
            } => Err(BackroomError::Getrennt(message)),
            RelayResponse::Error { code, message } => Err(BackroomError::UngueltigeNachricht(
                format!("{code:?}: {message}"),
            )),
            antwort => Ok(antwort),
        }
    }
}

#[async_trait]
impl MessageBus for RelayLink {
    async fn join(&self, name: &PeerName, public_key: &str) -> backroom_core::Result<()> {
        self.anfrage(ClientRequest::Join {
            name: name.clone(),
            public_key: public_key.to_string(),
        })
        .map(|_| ())
    }

    async fn resolve_peer(&self, name: &PeerName) -> backroom_core::Result<Option<String>> {
        match self.anfrage(ClientRequest::ResolvePeer { name: name.clone() })? {
            RelayResponse::PublicKey { public_key } => Ok(public_key),
            andere => Err(BackroomError::intern(format!(
                "Unerwartete Antwort auf resolvePeer: {andere:?}"
            ))),
        }
    }

    async fn send_dm(&self, to: &PeerName, envelope: String) -> backroom_core::Result<()> {
        self.anfrage(ClientRequest::Dm {
            to: to.clone(),
            envelope,
        })
        .map(|_| ())
    }

    async fn leave(&self) -> backroom_core::Result<()> {
        self.relay.trennen(self.verbindung);
        Ok(())
    }
}

impl Drop for RelayLink {
    fn drop(&mut self) {
        self.relay.trennen(self.verbindung);
    }
}
