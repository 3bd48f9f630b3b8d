//! Envelope encryption for claim tokens

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;
use base64::Engine;
use std::fmt;

/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CipherError {
    /// Token was not produced by this cipher, or was altered
    #[error("Invalid ciphertext")]
    InvalidCiphertext,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key service or cipher backend failed
    #[error("Cipher unavailable: {0}")]
    Unavailable(String),
}

/// Opaque, authenticated encryption of small payloads
#[async_trait]
pub trait EnvelopeCipher: Send + Sync + fmt::Debug {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError>;

    async fn decrypt(&self, token: &str) -> Result<Vec<u8>, CipherError>;
}

/// AES-256-GCM with a fresh random nonce per token
///
/// Token layout is `base64(nonce || ciphertext || tag)`.
pub struct AesGcmEnvelope {
    cipher: Aes256Gcm,
}

impl AesGcmEnvelope {
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| CipherError::InvalidKey("aes init failed".into()))?;
        Ok(Self { cipher })
    }

    /// Key given as 64 hex characters
    pub fn from_hex(key_hex: &str) -> Result<Self, CipherError> {
        let key = hex::decode(key_hex.trim())
            .map_err(|e| CipherError::InvalidKey(format!("not hex: {}", e)))?;
        Self::new(&key)
    }

    /// Random key that lives only as long as this process; tokens issued
    /// with it cannot be opened after a restart
    pub fn ephemeral() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }
}

impl fmt::Debug for AesGcmEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmEnvelope")
            .field("key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl EnvelopeCipher for AesGcmEnvelope {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ct = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::Unavailable("encryption failed".into()))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ct.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ct);
        Ok(base64::engine::general_purpose::STANDARD.encode(&payload))
    }

    async fn decrypt(&self, token: &str) -> Result<Vec<u8>, CipherError> {
        let payload = base64::engine::general_purpose::STANDARD
            .decode(token.trim())
            .map_err(|_| CipherError::InvalidCiphertext)?;
        if payload.len() <= NONCE_LEN {
            return Err(CipherError::InvalidCiphertext);
        }

        let (nonce, ct) = payload.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ct)
            .map_err(|_| CipherError::InvalidCiphertext)
    }
}
