//! backroom-sim – Loopback-Simulation
//!
//! Startet die konfigurierten Teilnehmer als echte Sessions gegen ein
//! In-Process-Relay, spielt das Nachrichten-Skript ab und sammelt die
//! Zustellungen ein.
//!
//! Ablauf:
//! 1. Relay erzeugen
//! 2. Pro Teilnehmer: Session starten (Identitaet + join), Empfangsschleife spawnen
//! 3. Skript senden
//! 4. Auf erwartete Zustellungen warten (mit Zeitlimit)
//! 5. Alle Sessions verlassen

pub mod config;
pub mod logging;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use backroom_client::{Session, SessionError};
use backroom_core::{PeerName, SessionEvent};
use backroom_relay::{Relay, RelayLink};
use crate::config::SimConfig;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Eine zugestellte Nachricht
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Zustellung {
    pub von: PeerName,
    pub an: PeerName,
    pub text: String,
}

/// Ergebnis eines Simulationslaufs
#[derive(Debug, Default, Serialize)]
pub struct SimBericht {
    pub gesendet: usize,
    pub zugestellt: Vec<Zustellung>,
    pub unbekannte_empfaenger: usize,
    pub warnungen: usize,
    pub fehler: usize,
}

struct Teilnehmer {
    session: Arc<Session<RelayLink>>,
    ui: mpsc::Receiver<SessionEvent>,
    schleife: JoinHandle<()>,
}

/// Haelt die Simulation zusammen
pub struct Simulation {
    pub config: SimConfig,
}

impl Simulation {
    pub fn neu(config: SimConfig) -> Self {
        Self { config }
    }

    /// Fuehrt das Skript aus und gibt den Bericht zurueck
    pub async fn ausfuehren(self) -> Result<SimBericht> {
        self.config.pruefen()?;

        let relay = Relay::new();
        let mut teilnehmer = BTreeMap::new();
        for name in &self.config.teilnehmer {
            let name = PeerName::pruefen(name)?;
            let t = self.teilnehmer_starten(&relay, name.clone()).await?;
            teilnehmer.insert(name, t);
        }
        tracing::info!(teilnehmer = teilnehmer.len(), "Alle Sessions aktiv");

        let mut bericht = SimBericht::default();
        let erwartet = self.skript_senden(&teilnehmer, &mut bericht).await?;

        let zeitlimit = Duration::from_millis(self.config.zustell_zeitlimit_ms);
        for (name, t) in teilnehmer.iter_mut() {
            let offen = erwartet.get(name).copied().unwrap_or(0);
            zustellungen_sammeln(name, t, offen, zeitlimit, &mut bericht).await;
        }

        for (name, t) in teilnehmer {
            if let Err(e) = t.session.verlassen().await {
                tracing::warn!(name = %name, fehler = %e, "Verlassen fehlgeschlagen");
            }
            t.schleife.await?;
        }

        tracing::info!(
            gesendet = bericht.gesendet,
            zugestellt = bericht.zugestellt.len(),
            unbekannt = bericht.unbekannte_empfaenger,
            warnungen = bericht.warnungen,
            "Simulation beendet"
        );
        Ok(bericht)
    }

    async fn teilnehmer_starten(&self, relay: &Relay, name: PeerName) -> Result<Teilnehmer> {
        let (link, inbound) = relay.verbinden();
        let (session, ui) = Session::neu(name.clone(), Arc::new(link), self.config.session.clone());
        let session = Arc::new(session);
        session
            .starten()
            .await
            .with_context(|| format!("Session '{name}' konnte nicht starten"))?;

        let schleife = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.run(inbound).await }
        });
        Ok(Teilnehmer {
            session,
            ui,
            schleife,
        })
    }

    /// Sendet das Skript; gibt die erwarteten Zustellungen pro Empfaenger zurueck
    async fn skript_senden(
        &self,
        teilnehmer: &BTreeMap<PeerName, Teilnehmer>,
        bericht: &mut SimBericht,
    ) -> Result<HashMap<PeerName, usize>> {
        let mut erwartet = HashMap::new();

        for nachricht in &self.config.nachrichten {
            let von = PeerName::pruefen(&nachricht.von)?;
            let an = PeerName::pruefen(&nachricht.an)?;
            let absender = teilnehmer
                .get(&von)
                .with_context(|| format!("Absender '{von}' ist kein Teilnehmer"))?;

            match absender.session.send(&an, &nachricht.text).await {
                Ok(()) => {
                    bericht.gesendet += 1;
                    if teilnehmer.contains_key(&an) {
                        *erwartet.entry(an).or_insert(0) += 1;
                    }
                }
                Err(SessionError::UnknownRecipient(an)) => {
                    tracing::warn!(von = %von, an = %an, "Empfaenger unbekannt – nichts gesendet");
                    bericht.unbekannte_empfaenger += 1;
                }
                Err(e) if !e.ist_fatal() => {
                    tracing::warn!(von = %von, an = %an, fehler = %e, "Senden fehlgeschlagen");
                    bericht.fehler += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(erwartet)
    }
}

async fn zustellungen_sammeln(
    name: &PeerName,
    t: &mut Teilnehmer,
    mut offen: usize,
    zeitlimit: Duration,
    bericht: &mut SimBericht,
) {
    while offen > 0 {
        match tokio::time::timeout(zeitlimit, t.ui.recv()).await {
            Ok(Some(SessionEvent::Nachricht { von, text })) => {
                tracing::info!(an = %name, von = %von, text = %text, "Nachricht zugestellt");
                bericht.zugestellt.push(Zustellung {
                    von,
                    an: name.clone(),
                    text,
                });
                offen -= 1;
            }
            Ok(Some(SessionEvent::Warnung { von, grund })) => {
                tracing::warn!(an = %name, von = %von, grund = %grund, "Nachricht verworfen");
                bericht.warnungen += 1;
                offen -= 1;
            }
            Ok(Some(SessionEvent::Roster { namen })) => {
                tracing::debug!(an = %name, anzahl = namen.len(), "Roster");
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(an = %name, offen, "Zeitlimit beim Warten auf Zustellungen");
                break;
            }
        }
    }
}
