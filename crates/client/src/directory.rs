//! Peer-Verzeichnis: Teilnehmer-Name -> Public Key
//!
//! Lokaler Cache plus Tabelle der laufenden Abfragen. Pro Name ist
//! hoechstens eine `resolvePeer`-Abfrage beim Relay unterwegs; weitere
//! Aufrufer haengen sich als Wartende an diese Abfrage an.
//!
//! ## Regeln
//! - Ein gecachter Eintrag wird nie ueberschrieben
//! - "Unbekannt" wird nicht gecacht (ein spaeterer Join kann gelingen)
//! - Ein Key mit falscher Laenge gilt als "unbekannt" und wird nicht gecacht
//! - Zeitlimit oder Bus-Fehler loesen alle Wartenden zu "unbekannt" auf
//! - Die Abfrage laeuft als eigener Task und ueberlebt abbrechende Aufrufer

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use backroom_core::{BackroomError, MessageBus, PeerName};
use backroom_crypto::PeerPublicKey;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;

type Antwort = Option<Vec<u8>>;

/// Wartende einer laufenden Abfrage
struct PendingLookup {
    waiters: Vec<oneshot::Sender<Antwort>>,
}

struct DirectoryState {
    cache: DashMap<PeerName, Vec<u8>>,
    /// Lock-Reihenfolge: erst `pending`, dann `cache`
    pending: Mutex<HashMap<PeerName, PendingLookup>>,
}

impl DirectoryState {
    /// Schliesst eine Abfrage ab und benachrichtigt alle Wartenden
    fn abschliessen(&self, name: &PeerName, key: Antwort) {
        let (waiters, antwort) = {
            let mut pending = self.pending.lock();
            let antwort = key.map(|key| {
                self.cache
                    .entry(name.clone())
                    .or_insert(key)
                    .value()
                    .clone()
            });
            let waiters = pending
                .remove(name)
                .map(|lookup| lookup.waiters)
                .unwrap_or_default();
            (waiters, antwort)
        };

        tracing::debug!(
            peer = %name,
            gefunden = antwort.is_some(),
            wartende = waiters.len(),
            "Peer-Abfrage abgeschlossen"
        );

        for waiter in waiters {
            // Abgebrochene Aufrufer haben ihren Receiver bereits fallen gelassen
            let _ = waiter.send(antwort.clone());
        }
    }
}

/// Verzeichnis der Public Keys einer Session
pub struct PeerDirectory<B: MessageBus> {
    bus: Arc<B>,
    state: Arc<DirectoryState>,
    resolve_timeout: Duration,
}

impl<B: MessageBus> PeerDirectory<B> {
    pub fn neu(bus: Arc<B>, resolve_timeout: Duration) -> Self {
        Self {
            bus,
            state: Arc::new(DirectoryState {
                cache: DashMap::new(),
                pending: Mutex::new(HashMap::new()),
            }),
            resolve_timeout,
        }
    }

    /// Loest einen Namen zum rohen Public Key auf (`None` = unbekannt)
    pub async fn resolve(&self, name: &PeerName) -> Option<Vec<u8>> {
        if let Some(key) = self.gecacht(name) {
            return Some(key);
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.state.pending.lock();
            // Erneut pruefen: eine Abfrage kann zwischenzeitlich fertig geworden sein
            if let Some(key) = self.gecacht(name) {
                return Some(key);
            }
            match pending.get_mut(name) {
                Some(lookup) => {
                    tracing::trace!(peer = %name, "Warte auf laufende Peer-Abfrage");
                    lookup.waiters.push(tx);
                }
                None => {
                    pending.insert(name.clone(), PendingLookup { waiters: vec![tx] });
                    self.abfrage_starten(name.clone());
                }
            }
        }

        rx.await.ok().flatten()
    }

    fn gecacht(&self, name: &PeerName) -> Option<Vec<u8>> {
        self.state.cache.get(name).map(|eintrag| eintrag.value().clone())
    }

    fn abfrage_starten(&self, name: PeerName) {
        let bus = Arc::clone(&self.bus);
        let state = Arc::clone(&self.state);
        let zeitlimit = self.resolve_timeout;

        tokio::spawn(async move {
            let ergebnis = tokio::time::timeout(zeitlimit, bus.resolve_peer(&name))
                .await
                .unwrap_or_else(|_| {
                    Err(BackroomError::Zeitlimit(format!(
                        "resolvePeer nach {} ms",
                        zeitlimit.as_millis()
                    )))
                });
            let key = match ergebnis {
                Ok(Some(base64)) => match PeerPublicKey::from_base64(&base64) {
                    Ok(key) => Some(key.as_bytes().to_vec()),
                    Err(e) => {
                        tracing::warn!(peer = %name, fehler = %e, "Relay lieferte ungueltigen Public Key");
                        None
                    }
                },
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(
                        peer = %name,
                        fehler = %e,
                        wiederholbar = e.ist_wiederholbar(),
                        "Peer-Abfrage fehlgeschlagen"
                    );
                    None
                }
            };
            state.abschliessen(&name, key);
        });
    }

    /// Anzahl der Namen mit laufender Abfrage
    pub fn pending_count(&self) -> usize {
        self.state.pending.lock().len()
    }

    pub fn is_cached(&self, name: &PeerName) -> bool {
        self.state.cache.contains_key(name)
    }
}

impl<B: MessageBus> std::fmt::Debug for PeerDirectory<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerDirectory")
            .field("gecacht", &self.state.cache.len())
            .field("laufend", &self.pending_count())
            .finish()
    }
}
