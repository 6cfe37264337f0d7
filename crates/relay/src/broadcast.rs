//! Event-Broadcaster – Sendet Ereignisse an verbundene Teilnehmer
//!
//! Verwaltet die Ereignis-Queues aller Verbindungen, gezielt oder an alle.

use std::sync::Arc;

use backroom_core::ConnectionId;
use backroom_protocol::ServerEvent;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Groesse der Ereignis-Queue pro Verbindung
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Ereignis-Queue einer Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub verbindung: ConnectionId,
    pub tx: mpsc::Sender<ServerEvent>,
}

impl ClientSender {
    /// Sendet ein Ereignis nicht-blockierend
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.verbindung, "Send-Queue voll – Ereignis verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.verbindung, "Send-Queue geschlossen (Teilnehmer getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Ereignis-Queues aller Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct EventBroadcaster {
    clients: Arc<DashMap<ConnectionId, ClientSender>>,
}

impl EventBroadcaster {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert eine Verbindung und gibt ihre Empfangs-Queue zurueck
    pub fn client_registrieren(&self, verbindung: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        self.clients
            .insert(verbindung, ClientSender { verbindung, tx });
        tracing::debug!(verbindung = %verbindung, "Verbindung im Broadcaster registriert");
        rx
    }

    /// Entfernt eine Verbindung; ihre Queue wird damit geschlossen
    ///
    /// Gibt `false` zurueck wenn die Verbindung nicht registriert war.
    pub fn client_entfernen(&self, verbindung: &ConnectionId) -> bool {
        let entfernt = self.clients.remove(verbindung).is_some();
        if entfernt {
            tracing::debug!(verbindung = %verbindung, "Verbindung aus Broadcaster entfernt");
        }
        entfernt
    }

    pub fn ist_registriert(&self, verbindung: &ConnectionId) -> bool {
        self.clients.contains_key(verbindung)
    }

    /// Sendet ein Ereignis an eine einzelne Verbindung
    pub fn an_verbindung_senden(&self, verbindung: &ConnectionId, event: ServerEvent) -> bool {
        match self.clients.get(verbindung) {
            Some(sender) => sender.senden(event),
            None => {
                tracing::debug!(verbindung = %verbindung, "Senden an unbekannte Verbindung");
                false
            }
        }
    }

    /// Sendet ein Ereignis an alle Verbindungen
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_alle_senden(&self, event: ServerEvent) -> usize {
        self.clients
            .iter()
            .filter(|entry| entry.value().senden(event.clone()))
            .count()
    }

    pub fn anzahl(&self) -> usize {
        self.clients.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
