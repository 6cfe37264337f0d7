//! Nachrichten-Verschluesselung (AES-256-GCM)
//!
//! ## Format
//! ```text
//! [nonce(12)] [tag(16)] [ciphertext]
//! ```
//!
//! Die Nonce ist pro Aufruf frisch aus dem OS-Zufall. Keine AAD.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{Envelope, SymmetricKey, NONCE_LEN, TAG_LEN};

/// Verschluesselt einen Klartext mit dem Schluessel einer Peer-Beziehung
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> CryptoResult<Envelope> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    // aes-gcm haengt den Tag normalerweise an; detached liefert ihn separat
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(AesNonce::from_slice(&nonce), b"", &mut buffer)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(Envelope {
        nonce,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
