//! Nachrichten-Entschluesselung (AES-256-GCM)
//!
//! Verifiziert den Auth-Tag bevor irgendein Klartext herausgegeben wird.
//! Jeder Verifikationsfehler ist `CryptoError::Authentication`, egal ob
//! falscher Schluessel, manipulierter Ciphertext, Tag oder Nonce.

use aes_gcm::{
    aead::{generic_array::GenericArray, AeadInPlace, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{Envelope, SymmetricKey};

/// Entschluesselt ein Envelope mit dem Schluessel einer Peer-Beziehung
pub fn decrypt(key: &SymmetricKey, envelope: &Envelope) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut buffer = envelope.ciphertext.clone();
    cipher
        .decrypt_in_place_detached(
            AesNonce::from_slice(&envelope.nonce),
            b"",
            &mut buffer,
            GenericArray::from_slice(&envelope.tag),
        )
        .map_err(|_| CryptoError::Authentication)?;

    Ok(buffer)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e2e::encrypt::encrypt;
    use crate::identity::Identity;
    use crate::e2e::key_exchange::derive_shared_key;

    fn test_key(byte: u8) -> SymmetricKey {
        SymmetricKey::from_bytes([byte; 32])
    }

    #[test]
    fn roundtrip_verschiedene_laengen() {
        let key = test_key(0x11);
        for len in [0usize, 1, 15, 16, 17, 255, 4096] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let envelope = encrypt(&key, &plaintext).unwrap();
            assert_eq!(decrypt(&key, &envelope).unwrap(), plaintext);
        }
    }

    #[test]
    fn roundtrip_mit_abgeleitetem_schluessel() {
        let alice = Identity::generate().unwrap();
        let bob = Identity::generate().unwrap();
        let k_alice = derive_shared_key(&alice, &bob.public_key_bytes()).unwrap();
        let k_bob = derive_shared_key(&bob, &alice.public_key_bytes()).unwrap();

        let envelope = encrypt(&k_alice, "hello".as_bytes()).unwrap();
        assert_eq!(decrypt(&k_bob, &envelope).unwrap(), b"hello");
    }

    #[test]
    fn falscher_schluessel_schlaegt_fehl() {
        let envelope = encrypt(&test_key(1), b"Geheime Daten").unwrap();
        let result = decrypt(&test_key(2), &envelope);
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn jedes_gekippte_bit_im_ciphertext_schlaegt_fehl() {
        let key = test_key(3);
        let envelope = encrypt(&key, b"kurz").unwrap();

        for byte in 0..envelope.ciphertext.len() {
            for bit in 0..8 {
                let mut manipuliert = envelope.clone();
                manipuliert.ciphertext[byte] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&key, &manipuliert),
                    Err(CryptoError::Authentication)
                ));
            }
        }
    }

    #[test]
    fn jedes_gekippte_bit_im_tag_schlaegt_fehl() {
        let key = test_key(4);
        let envelope = encrypt(&key, b"Tag-Test").unwrap();

        for byte in 0..envelope.tag.len() {
            for bit in 0..8 {
                let mut manipuliert = envelope.clone();
                manipuliert.tag[byte] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&key, &manipuliert),
                    Err(CryptoError::Authentication)
                ));
            }
        }
    }

    #[test]
    fn manipulierte_nonce_schlaegt_fehl() {
        let key = test_key(5);
        let mut envelope = encrypt(&key, b"Nonce-Test").unwrap();
        envelope.nonce[0] ^= 0x01;
        assert!(matches!(decrypt(&key, &envelope), Err(CryptoError::Authentication)));
    }

    #[test]
    fn abgeschnittener_ciphertext_schlaegt_fehl() {
        let key = test_key(6);
        let mut envelope = encrypt(&key, b"wird abgeschnitten").unwrap();
        envelope.ciphertext.truncate(4);
        assert!(matches!(decrypt(&key, &envelope), Err(CryptoError::Authentication)));
    }
}
