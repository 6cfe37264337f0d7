//! Relay-Zustand und Dispatch
//!
//! Namensregister (Name -> Verbindung + Public Key) und Weiterleitung.
//! Ein zweiter `join` unter einem vergebenen Namen ueberschreibt den
//! Eintrag; es gibt keine Signaturen, also keinen Schutz gegen
//! Namensuebernahme.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use backroom_core::{ConnectionId, PeerName};
use backroom_protocol::{ClientRequest, ErrorCode, RelayResponse, ServerEvent};
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::broadcast::EventBroadcaster;
use crate::link::RelayLink;

/// Registrierter Teilnehmer
#[derive(Debug, Clone)]
struct Teilnehmer {
    verbindung: ConnectionId,
    /// Base64, so wie beim `join` gesendet
    public_key: String,
}

#[derive(Default)]
struct RelayInner {
    broadcaster: EventBroadcaster,
    teilnehmer: DashMap<PeerName, Teilnehmer>,
    /// Verbindung -> angemeldeter Name
    namen: DashMap<ConnectionId, PeerName>,
    resolve_anfragen: AtomicU64,
    weitergeleitet: AtomicU64,
}

/// In-Process-Relay
///
/// Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oeffnet eine neue Verbindung zum Relay
    ///
    /// Gibt die ausgehende Seite (`MessageBus`) und die Queue der
    /// eingehenden Ereignisse zurueck.
    pub fn verbinden(&self) -> (RelayLink, mpsc::Receiver<ServerEvent>) {
        let verbindung = ConnectionId::new();
        let rx = self.inner.broadcaster.client_registrieren(verbindung);
        tracing::debug!(verbindung = %verbindung, "Neue Relay-Verbindung");
        (RelayLink::neu(self.clone(), verbindung), rx)
    }

    /// Verarbeitet eine Anfrage einer Verbindung
    pub fn dispatch(&self, verbindung: ConnectionId, anfrage: ClientRequest) -> RelayResponse {
        if !self.inner.broadcaster.ist_registriert(&verbindung) {
            return RelayResponse::error(
                ErrorCode::UnknownConnection,
                format!("Verbindung {verbindung} ist getrennt"),
            );
        }

        match anfrage {
            ClientRequest::Join { name, public_key } => self.join(verbindung, name, public_key),
            ClientRequest::ResolvePeer { name } => {
                self.inner.resolve_anfragen.fetch_add(1, Ordering::Relaxed);
                let public_key = self.public_key(&name);
                tracing::debug!(peer = %name, gefunden = public_key.is_some(), "resolvePeer");
                RelayResponse::PublicKey { public_key }
            }
            ClientRequest::Dm { to, envelope } => self.weiterleiten(verbindung, to, envelope),
        }
    }

    /// Trennt eine Verbindung, entfernt ihren Namen und verteilt den Roster
    ///
    /// Mehrfaches Trennen ist wirkungslos.
    pub fn trennen(&self, verbindung: ConnectionId) {
        if !self.inner.broadcaster.client_entfernen(&verbindung) {
            return;
        }
        if let Some((_, name)) = self.inner.namen.remove(&verbindung) {
            self.inner
                .teilnehmer
                .remove_if(&name, |_, t| t.verbindung == verbindung);
            tracing::info!(peer = %name, "Teilnehmer hat das Relay verlassen");
            self.roster_senden();
        }
    }

    fn join(&self, verbindung: ConnectionId, name: PeerName, public_key: String) -> RelayResponse {
        if let Err(e) = PeerName::pruefen(name.as_str()) {
            return RelayResponse::error(ErrorCode::InvalidRequest, e.to_string());
        }

        // Umbenennung: alten Namen dieser Verbindung freigeben
        if let Some(alt) = self.inner.namen.insert(verbindung, name.clone()) {
            if alt != name {
                self.inner
                    .teilnehmer
                    .remove_if(&alt, |_, t| t.verbindung == verbindung);
            }
        }

        let neu = Teilnehmer {
            verbindung,
            public_key,
        };
        if let Some(vorher) = self.inner.teilnehmer.insert(name.clone(), neu) {
            if vorher.verbindung != verbindung {
                tracing::warn!(
                    peer = %name,
                    alte_verbindung = %vorher.verbindung,
                    "Name bereits vergeben – Eintrag wird ueberschrieben"
                );
                self.inner.namen.remove(&vorher.verbindung);
            }
        }

        tracing::info!(peer = %name, verbindung = %verbindung, "Teilnehmer angemeldet");
        self.roster_senden();
        RelayResponse::Ok
    }

    fn weiterleiten(&self, verbindung: ConnectionId, to: PeerName, envelope: String) -> RelayResponse {
        let von = match self.inner.namen.get(&verbindung) {
            Some(name) => name.value().clone(),
            None => {
                return RelayResponse::error(ErrorCode::NotJoined, "dm vor join");
            }
        };

        let ziel = self.inner.teilnehmer.get(&to).map(|t| t.verbindung);
        match ziel {
            Some(ziel) => {
                let event = ServerEvent::Dm {
                    from: von.clone(),
                    envelope,
                };
                if self.inner.broadcaster.an_verbindung_senden(&ziel, event) {
                    self.inner.weitergeleitet.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(von = %von, an = %to, "DM weitergeleitet");
                }
            }
            None => {
                tracing::debug!(von = %von, an = %to, "DM an unbekannten Empfaenger verworfen");
            }
        }
        RelayResponse::Ok
    }

    fn roster_senden(&self) {
        let names = self.roster();
        let anzahl = self.inner.broadcaster.an_alle_senden(ServerEvent::Roster { names });
        tracing::trace!(empfaenger = anzahl, "Roster verteilt");
    }

    /// Stellt einem angemeldeten Teilnehmer ein beliebiges Ereignis zu
    ///
    /// Umgeht die Pruefungen von `dispatch`; damit lassen sich manipulierte
    /// oder fremde Envelopes einspeisen.
    pub fn an_teilnehmer_senden(&self, name: &PeerName, event: ServerEvent) -> bool {
        let ziel = self.inner.teilnehmer.get(name).map(|t| t.verbindung);
        match ziel {
            Some(ziel) => self.inner.broadcaster.an_verbindung_senden(&ziel, event),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    /// Angemeldete Namen, sortiert
    pub fn roster(&self) -> Vec<PeerName> {
        let mut names: Vec<PeerName> = self
            .inner
            .teilnehmer
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn public_key(&self, name: &PeerName) -> Option<String> {
        self.inner
            .teilnehmer
            .get(name)
            .map(|t| t.public_key.clone())
    }

    /// Anzahl der bisher beantworteten `resolvePeer`-Anfragen
    pub fn resolve_anfragen(&self) -> u64 {
        self.inner.resolve_anfragen.load(Ordering::Relaxed)
    }

    /// Anzahl der zugestellten DMs
    pub fn weitergeleitete_dms(&self) -> u64 {
        self.inner.weitergeleitet.load(Ordering::Relaxed)
    }

    pub fn verbindungen(&self) -> usize {
        self.inner.broadcaster.anzahl()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
