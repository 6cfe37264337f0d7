//! DM-Session: Zustandsmaschine und Nachrichtenfluss
//!
//! ```text
//! Unkeyed --generate_identity--> Keyed --join--> Joined --Ack--> Active
//!                                  ^               |
//!                                  +--Bus-Fehler---+
//! Active --verlassen--> Closed
//! ```
//!
//! Senden:    resolve -> derive -> encrypt -> serialize -> Bus
//! Empfangen: deserialize -> resolve -> derive -> decrypt -> UI
//!
//! Jede Session hat ihre eigene Identitaet, ihr eigenes Verzeichnis und
//! ihren eigenen Secret-Cache. Mehrere Sessions in einem Prozess teilen
//! nichts.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use backroom_core::{MessageBus, PeerName, SessionEvent};
use backroom_crypto::{e2e, Identity, SecretCache};
use backroom_protocol::ServerEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::SessionConfig;
use crate::directory::PeerDirectory;
use crate::error::{SessionError, SessionResult};

/// Ausstehende DMs pro Absender in `run`
const ABSENDER_QUEUE_GROESSE: usize = 64;

/// Lebenszyklus einer Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unkeyed,
    Keyed,
    /// Join ist unterwegs, Relay hat noch nicht bestaetigt
    Joined,
    Active,
    Closed,
}

/// Eine Teilnehmer-Session gegen einen Message-Bus
pub struct Session<B: MessageBus> {
    name: PeerName,
    bus: Arc<B>,
    identity: OnceLock<Identity>,
    zustand: Mutex<SessionState>,
    directory: PeerDirectory<B>,
    secrets: SecretCache,
    ui: mpsc::Sender<SessionEvent>,
}

impl<B: MessageBus> Session<B> {
    /// Erstellt eine Session im Zustand `Unkeyed` und die UI-Ereignis-Queue
    pub fn neu(
        name: PeerName,
        bus: Arc<B>,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (ui, ui_rx) = mpsc::channel(config.event_queue_groesse.max(1));
        let session = Self {
            name,
            directory: PeerDirectory::neu(Arc::clone(&bus), config.resolve_timeout()),
            bus,
            identity: OnceLock::new(),
            zustand: Mutex::new(SessionState::Unkeyed),
            secrets: SecretCache::new(),
            ui,
        };
        (session, ui_rx)
    }

    pub fn name(&self) -> &PeerName {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        *self.zustand.lock()
    }

    pub fn directory(&self) -> &PeerDirectory<B> {
        &self.directory
    }

    /// Oeffentlicher Schluessel (Base64), sobald eine Identitaet existiert
    pub fn public_key_base64(&self) -> Option<String> {
        self.identity.get().map(Identity::public_key_base64)
    }

    // -----------------------------------------------------------------------
    // Lebenszyklus
    // -----------------------------------------------------------------------

    /// Erzeugt die Session-Identitaet (genau einmal, vor allem anderen)
    pub fn generate_identity(&self) -> SessionResult<()> {
        let mut zustand = self.zustand.lock();
        Self::erwarte(*zustand, SessionState::Unkeyed)?;

        let identity = Identity::generate()?;
        let public_key = identity.public_key_base64();
        if self.identity.set(identity).is_err() {
            return Err(SessionError::InvalidState {
                erwartet: SessionState::Unkeyed,
                aktuell: SessionState::Keyed,
            });
        }
        *zustand = SessionState::Keyed;

        tracing::info!(name = %self.name, public_key = %public_key, "Identitaet erzeugt");
        Ok(())
    }

    /// Meldet Name und Public Key beim Relay an
    ///
    /// Bei Bus-Fehler faellt die Session auf `Keyed` zurueck und kann
    /// erneut joinen.
    pub async fn join(&self) -> SessionResult<()> {
        let public_key = {
            let mut zustand = self.zustand.lock();
            Self::erwarte(*zustand, SessionState::Keyed)?;
            let public_key = self
                .public_key_base64()
                .ok_or(SessionError::InvalidState {
                    erwartet: SessionState::Keyed,
                    aktuell: SessionState::Unkeyed,
                })?;
            *zustand = SessionState::Joined;
            public_key
        };

        match self.bus.join(&self.name, &public_key).await {
            Ok(()) => {
                *self.zustand.lock() = SessionState::Active;
                tracing::info!(name = %self.name, "Session aktiv");
                Ok(())
            }
            Err(e) => {
                *self.zustand.lock() = SessionState::Keyed;
                tracing::warn!(name = %self.name, fehler = %e, "Join fehlgeschlagen");
                Err(e.into())
            }
        }
    }

    /// Identitaet erzeugen und joinen
    pub async fn starten(&self) -> SessionResult<()> {
        self.generate_identity()?;
        self.join().await
    }

    /// Meldet die Session beim Relay ab
    pub async fn verlassen(&self) -> SessionResult<()> {
        {
            let mut zustand = self.zustand.lock();
            Self::erwarte(*zustand, SessionState::Active)?;
            *zustand = SessionState::Closed;
        }
        self.bus.leave().await?;
        tracing::info!(name = %self.name, "Session verlassen");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Senden / Empfangen
    // -----------------------------------------------------------------------

    /// Verschluesselt `plaintext` fuer `to` und uebergibt es dem Bus
    ///
    /// Entweder genau eine Uebertragung oder ein Fehler; bei unbekanntem
    /// Empfaenger wird nichts gesendet.
    pub async fn send(&self, to: &PeerName, plaintext: &str) -> SessionResult<()> {
        let identity = self.aktive_identity()?;

        let peer_key = self
            .directory
            .resolve(to)
            .await
            .ok_or_else(|| SessionError::UnknownRecipient(to.clone()))?;
        let key = self.secrets.derive(identity, to.as_str(), &peer_key)?;
        let envelope = e2e::encrypt(&key, plaintext.as_bytes())?;
        let transport = e2e::serialize(&envelope);

        self.bus.send_dm(to, transport).await?;
        tracing::debug!(an = %to, bytes = plaintext.len(), "DM gesendet");
        Ok(())
    }

    /// Entschluesselt ein eingehendes Envelope von `from`
    pub async fn receive(&self, from: &PeerName, envelope: &str) -> SessionResult<String> {
        let identity = self.aktive_identity()?;

        let envelope = e2e::deserialize(envelope)?;
        let peer_key = self
            .directory
            .resolve(from)
            .await
            .ok_or_else(|| SessionError::UnknownSender(from.clone()))?;
        let key = self.secrets.derive(identity, from.as_str(), &peer_key)?;
        let plaintext = e2e::decrypt(&key, &envelope)?;

        String::from_utf8(plaintext).map_err(|_| SessionError::InvalidPlaintext(from.clone()))
    }

    /// Verarbeitet ein Ereignis vom Relay; Fehler beenden die Session nie
    pub async fn handle_inbound(&self, event: ServerEvent) {
        match event {
            ServerEvent::Dm { from, envelope } => match self.receive(&from, &envelope).await {
                Ok(text) => {
                    tracing::debug!(von = %from, bytes = text.len(), "DM entschluesselt");
                    self.an_ui(SessionEvent::Nachricht { von: from, text });
                }
                Err(SessionError::MalformedEnvelope(grund)) => {
                    tracing::debug!(von = %from, %grund, "Ungueltiges Envelope verworfen");
                }
                Err(e @ SessionError::Authentication) => {
                    tracing::warn!(von = %from, "DM verworfen: Authentifizierung fehlgeschlagen");
                    self.an_ui(SessionEvent::Warnung {
                        von: from,
                        grund: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(von = %from, fehler = %e, "DM verworfen");
                }
            },
            ServerEvent::Roster { names } => {
                tracing::debug!(anzahl = names.len(), "Roster empfangen");
                self.an_ui(SessionEvent::Roster { namen: names });
            }
        }
    }

    /// Verarbeitet eingehende Ereignisse bis der Bus geschlossen wird
    ///
    /// DMs laufen pro Absender in einem eigenen Task: die Reihenfolge je
    /// Absender bleibt erhalten, eine haengende Abfrage fuer einen
    /// Absender haelt die anderen nicht auf. Kehrt erst zurueck, wenn
    /// alle angenommenen DMs verarbeitet sind.
    pub async fn run(self: Arc<Self>, mut inbound: mpsc::Receiver<ServerEvent>) {
        let mut absender: HashMap<PeerName, mpsc::Sender<String>> = HashMap::new();
        let mut worker = JoinSet::new();

        while let Some(event) = inbound.recv().await {
            match event {
                ServerEvent::Dm { from, envelope } => {
                    let queue = absender.entry(from.clone()).or_insert_with(|| {
                        let (tx, rx) = mpsc::channel(ABSENDER_QUEUE_GROESSE);
                        worker.spawn(Arc::clone(&self).absender_verarbeiten(from.clone(), rx));
                        tx
                    });
                    if queue.try_send(envelope).is_err() {
                        tracing::warn!(von = %from, "Absender-Queue voll, DM verworfen");
                    }
                }
                roster @ ServerEvent::Roster { .. } => self.handle_inbound(roster).await,
            }
        }

        drop(absender);
        while let Some(ergebnis) = worker.join_next().await {
            if let Err(e) = ergebnis {
                tracing::error!(name = %self.name, fehler = %e, "DM-Task abgebrochen");
            }
        }
        tracing::info!(name = %self.name, "Eingehender Bus geschlossen");
    }

    async fn absender_verarbeiten(self: Arc<Self>, from: PeerName, mut rx: mpsc::Receiver<String>) {
        while let Some(envelope) = rx.recv().await {
            self.handle_inbound(ServerEvent::Dm {
                from: from.clone(),
                envelope,
            })
            .await;
        }
    }

    // -----------------------------------------------------------------------
    // Intern
    // -----------------------------------------------------------------------

    fn erwarte(aktuell: SessionState, erwartet: SessionState) -> SessionResult<()> {
        if aktuell == erwartet {
            Ok(())
        } else {
            Err(SessionError::InvalidState { erwartet, aktuell })
        }
    }

    fn aktive_identity(&self) -> SessionResult<&Identity> {
        Self::erwarte(self.state(), SessionState::Active)?;
        self.identity.get().ok_or(SessionError::InvalidState {
            erwartet: SessionState::Active,
            aktuell: SessionState::Unkeyed,
        })
    }

    fn an_ui(&self, event: SessionEvent) {
        match self.ui.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(name = %self.name, "UI-Queue voll – Ereignis verworfen");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(name = %self.name, "UI-Queue geschlossen");
            }
        }
    }
}
