//! X25519 Diffie-Hellman + HKDF – der Shared-Secret-Deriver
//!
//! Aus dem eigenen privaten Schluessel und dem oeffentlichen Schluessel
//! des Peers entsteht deterministisch ein 32-Byte AES-Schluessel. Die rohe
//! DH-Ausgabe wird nie direkt als AEAD-Schluessel verwendet.
//!
//! ## HKDF-Parameter
//! ```text
//! IKM  = X25519(eigener_priv, peer_pub)
//! Salt = min(pub_a, pub_b) || max(pub_a, pub_b)
//! Info = "backroom-dm-key-v1"
//! ```
//! Die sortierten Public Keys im Salt sorgen dafuer, dass beide Seiten
//! denselben Schluessel ableiten.

use dashmap::DashMap;
use hkdf::Hkdf;
use sha2::Sha256;
use std::sync::Arc;

use crate::error::{CryptoError, CryptoResult};
use crate::identity::Identity;
use crate::types::{PeerPublicKey, SymmetricKey, KEY_LEN, PUBLIC_KEY_LEN};

/// HKDF-Info fuer Direktnachrichten-Schluessel
const DM_KEY_INFO: &[u8] = b"backroom-dm-key-v1";

/// Leitet den symmetrischen Schluessel fuer einen Peer ab
///
/// Schlaegt mit `InvalidKey` fehl, wenn `peer_key` kein gueltiger
/// X25519-Punkt ist (falsche Laenge oder Punkt kleiner Ordnung).
pub fn derive_shared_key(identity: &Identity, peer_key: &[u8]) -> CryptoResult<SymmetricKey> {
    let peer = PeerPublicKey::from_slice(peer_key)?;
    derive_for_point(identity, &peer)
}

fn derive_for_point(identity: &Identity, peer: &PeerPublicKey) -> CryptoResult<SymmetricKey> {
    let dh_output = identity.diffie_hellman(peer);
    if !dh_output.was_contributory() {
        return Err(CryptoError::InvalidKey(
            "Punkt kleiner Ordnung (nicht-kontributiver DH)".to_string(),
        ));
    }

    let eigener = identity.public_key_bytes();
    let (erster, zweiter) = if eigener <= *peer.as_bytes() {
        (eigener, *peer.as_bytes())
    } else {
        (*peer.as_bytes(), eigener)
    };
    let mut salt = [0u8; 2 * PUBLIC_KEY_LEN];
    salt[..PUBLIC_KEY_LEN].copy_from_slice(&erster);
    salt[PUBLIC_KEY_LEN..].copy_from_slice(&zweiter);

    let hk = Hkdf::<Sha256>::new(Some(&salt), dh_output.as_bytes());
    let mut okm = [0u8; KEY_LEN];
    hk.expand(DM_KEY_INFO, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(SymmetricKey::from_bytes(okm))
}

// ---------------------------------------------------------------------------
// SecretCache
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct CachedSecret {
    peer_key: PeerPublicKey,
    key: Arc<SymmetricKey>,
}

/// Memoisiert abgeleitete Schluessel pro Peer-Name
///
/// Kein Lock um die Ableitung: zwei gleichzeitige Aufrufe fuer denselben
/// Peer rechnen beide und schreiben denselben Wert. Ein Eintrag wird nur
/// neu berechnet, wenn sich der oeffentliche Schluessel des Peers aendert.
#[derive(Debug, Default)]
pub struct SecretCache {
    eintraege: DashMap<String, CachedSecret>,
}

impl SecretCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gibt den Schluessel fuer `peer` zurueck und leitet ihn bei Bedarf ab
    ///
    /// Ein fehlgeschlagener Aufruf veraendert den Cache nicht.
    pub fn derive(
        &self,
        identity: &Identity,
        peer: &str,
        peer_key: &[u8],
    ) -> CryptoResult<Arc<SymmetricKey>> {
        let peer_pk = PeerPublicKey::from_slice(peer_key)?;

        if let Some(eintrag) = self.eintraege.get(peer) {
            if eintrag.peer_key == peer_pk {
                return Ok(Arc::clone(&eintrag.key));
            }
            tracing::warn!(peer = %peer, "Oeffentlicher Schluessel des Peers hat sich geaendert");
        }

        let key = Arc::new(derive_for_point(identity, &peer_pk)?);
        self.eintraege.insert(
            peer.to_string(),
            CachedSecret {
                peer_key: peer_pk,
                key: Arc::clone(&key),
            },
        );
        tracing::debug!(peer = %peer, "Shared Secret abgeleitet");
        Ok(key)
    }

    /// Prueft ob fuer einen Peer bereits ein Schluessel existiert
    pub fn contains(&self, peer: &str) -> bool {
        self.eintraege.contains_key(peer)
    }

    pub fn len(&self) -> usize {
        self.eintraege.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eintraege.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
