//! # backroom-crypto
//!
//! Ende-zu-Ende Verschluesselung fuer Direktnachrichten.
//!
//! ## Module
//! - `identity` - Ephemeres X25519-Schluessel-Paar pro Session (Key Manager)
//! - `e2e` - Schluessel-Ableitung, AEAD und Envelope-Codec
//! - `types` - Gemeinsame Typen (SymmetricKey, PeerPublicKey, Envelope)
//! - `error` - Fehlertypen

pub mod e2e;
pub mod error;
pub mod identity;
pub mod types;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use identity::Identity;
pub use types::{Envelope, PeerPublicKey, SymmetricKey};

pub use e2e::{
    decrypt, derive_shared_key, deserialize, encrypt, serialize, SecretCache,
};
