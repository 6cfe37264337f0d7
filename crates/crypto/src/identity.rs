//! Ephemere Session-Identitaet (X25519) – der Key Manager
//!
//! Jede Session erzeugt beim Start genau ein Schluessel-Paar. Der
//! oeffentliche Teil wird beim Relay angemeldet, der private Teil
//! verlaesst den Prozess nie und wird beim Drop genullt.

use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey as X25519PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{PeerPublicKey, PUBLIC_KEY_LEN};

/// Schluessel-Paar einer Session
///
/// Derselbe private Schluessel wird mit jedem Peer verrechnet.
pub struct Identity {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl Identity {
    /// Generiert ein neues Schluessel-Paar aus dem OS-Zufall
    ///
    /// Schlaegt nur fehl, wenn die Zufallsquelle nicht verfuegbar ist.
    pub fn generate() -> CryptoResult<Self> {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(&mut *seed)
            .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;

        let secret = StaticSecret::from(*seed);
        let public = X25519PublicKey::from(&secret);
        tracing::debug!("Neues X25519-Schluessel-Paar erzeugt");
        Ok(Self { secret, public })
    }

    /// Gibt den oeffentlichen Schluessel als Bytes zurueck
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.public.to_bytes()
    }

    pub fn public_key(&self) -> PeerPublicKey {
        PeerPublicKey::from_bytes(self.public_key_bytes())
    }

    /// Base64-Form fuer `join`
    pub fn public_key_base64(&self) -> String {
        self.public_key().to_base64()
    }

    pub(crate) fn diffie_hellman(&self, peer: &PeerPublicKey) -> SharedSecret {
        let peer_pk = X25519PublicKey::from(*peer.as_bytes());
        self.secret.diffie_hellman(&peer_pk)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Identity {{ public_key: {}, secret: [REDACTED] }}",
            self.public_key_base64()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
