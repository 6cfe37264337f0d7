//! E2E Verschluesselung (End-to-End) fuer Direktnachrichten
//!
//! Client <-> Client Verschluesselung. Das Relay leitet Envelopes blind
//! weiter und kennt weder private Schluessel noch abgeleitete Secrets.
//!
//! ## Ablauf
//! 1. Jede Session hat eine ephemere `Identity` (X25519)
//! 2. Pro Peer: ECDH + HKDF-SHA256 -> 32-Byte-Schluessel (gecacht)
//! 3. Nachricht wird mit AES-256-GCM verschluesselt (frische Nonce)
//! 4. Envelope `nonce || tag || ciphertext` wird Base64-kodiert verschickt

pub mod decrypt;
pub mod encrypt;
pub mod envelope;
pub mod key_exchange;

pub use decrypt::decrypt;
pub use encrypt::encrypt;
pub use envelope::{deserialize, serialize};
pub use key_exchange::{derive_shared_key, SecretCache};
