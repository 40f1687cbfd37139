//! Sealed chat events.
//!
//! When `APP_ENCRYPT_KEY` is set the adapter posts `{"encrypt": "<base64>"}`,
//! where the decoded bytes are a 12-byte nonce followed by the AES-256-GCM
//! ciphertext of the event JSON. The cipher key is SHA-256 of the shared key.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_SIZE: usize = 12;

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("body is not a sealed envelope: {0}")]
    NotAnEnvelope(#[from] serde_json::Error),

    #[error("invalid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("envelope shorter than its nonce")]
    Truncated,

    #[error("decryption failed")]
    Decryption,

    #[error("encryption failed")]
    Encryption,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub encrypt: String,
}

#[derive(Clone)]
pub struct EnvelopeKey {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EnvelopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EnvelopeKey(..)")
    }
}

impl EnvelopeKey {
    pub fn new(shared_key: &str) -> Self {
        let digest = Sha256::digest(shared_key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&digest),
        }
    }

    /// `None` when no key is configured.
    pub fn from_config(shared_key: &str) -> Option<Self> {
        (!shared_key.is_empty()).then(|| Self::new(shared_key))
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String, EnvelopeError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| EnvelopeError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    pub fn open(&self, encoded: &str) -> Result<Vec<u8>, EnvelopeError> {
        let sealed = STANDARD.decode(encoded.trim())?;
        if sealed.len() < NONCE_SIZE {
            return Err(EnvelopeError::Truncated);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| EnvelopeError::Decryption)
    }

    /// Unwrap an ingress body of the form `{"encrypt": ...}`.
    pub fn open_body(&self, body: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let envelope: Envelope = serde_json::from_slice(body)?;
        self.open(&envelope.encrypt)
    }

    /// Build an ingress body; the counterpart of [`EnvelopeKey::open_body`].
    pub fn seal_body(&self, plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let envelope = Envelope {
            encrypt: self.seal(plaintext)?,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }
}
