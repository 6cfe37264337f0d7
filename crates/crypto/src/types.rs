//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};

/// Laenge des symmetrischen Schluessels (AES-256)
pub const KEY_LEN: usize = 32;
/// Laenge eines X25519 oeffentlichen Schluessels
pub const PUBLIC_KEY_LEN: usize = 32;
/// Laenge der AES-GCM Nonce
pub const NONCE_LEN: usize = 12;
/// Laenge des AES-GCM Auth-Tags
pub const TAG_LEN: usize = 16;
/// Mindestlaenge eines dekodierten Envelopes (Nonce + Tag)
pub const ENVELOPE_HEADER_LEN: usize = NONCE_LEN + TAG_LEN;

/// Symmetrischer 256-Bit-Schluessel fuer eine Peer-Beziehung (wird beim Drop genullt)
#[derive(Clone)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED] {} bytes)", KEY_LEN)
    }
}

/// Oeffentlicher X25519-Schluessel eines Teilnehmers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerPublicKey([u8; PUBLIC_KEY_LEN]);

impl PeerPublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Uebernimmt Bytes vom Relay; alles ausser exakt 32 Bytes ist kein Kurvenpunkt
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "erwartet {} Bytes, erhalten {}",
                PUBLIC_KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Dekodiert die Base64-Form aus `join`/`resolvePeer`
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidKey(format!("Base64: {e}")))?;
        Self::from_slice(&bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }
}

/// Ergebnis genau einer Verschluesselung
///
/// Byte-Layout auf dem Draht: `[nonce(12)] [tag(16)] [ciphertext]`.
/// Der Tag steht immer getrennt vor dem Ciphertext, egal wie die
/// AEAD-Bibliothek ihn intern liefert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Serialisiert zu Bytes: [nonce(12)] + [tag(16)] + [ciphertext]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENVELOPE_HEADER_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Deserialisiert aus Bytes
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < ENVELOPE_HEADER_LEN {
            return Err(CryptoError::MalformedEnvelope(format!(
                "{} Bytes, mindestens {} erwartet",
                bytes.len(),
                ENVELOPE_HEADER_LEN
            )));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&bytes[NONCE_LEN..ENVELOPE_HEADER_LEN]);
        let ciphertext = bytes[ENVELOPE_HEADER_LEN..].to_vec();

        Ok(Self { nonce, tag, ciphertext })
    }
}
