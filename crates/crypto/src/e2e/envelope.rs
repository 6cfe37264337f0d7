//! Envelope-Codec fuer den Transport ueber den Message-Bus
//!
//! Byte-Layout `nonce(12) || tag(16) || ciphertext`, als Standard-Base64
//! (mit Padding) kodiert. Alle Teilnehmer einer Installation muessen
//! dieses Layout verwenden.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{CryptoError, CryptoResult};
use crate::types::Envelope;

/// Serialisiert ein Envelope zum Transport-String
pub fn serialize(envelope: &Envelope) -> String {
    STANDARD.encode(envelope.to_bytes())
}

/// Deserialisiert einen Transport-String
///
/// `MalformedEnvelope` bei ungueltigem Base64 oder weniger als 28 Bytes.
/// Die Authentizitaet wird hier nicht geprueft.
pub fn deserialize(transport: &str) -> CryptoResult<Envelope> {
    let bytes = STANDARD
        .decode(transport)
        .map_err(|e| CryptoError::MalformedEnvelope(format!("Base64: {e}")))?;
    Envelope::from_bytes(&bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
