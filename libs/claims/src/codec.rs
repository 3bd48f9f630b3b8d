use crate::cipher::{CipherError, EnvelopeCipher};
use std::sync::Arc;
use tracing::{debug, warn};
use types::{Claim, SwapIntent, Timestamp};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClaimError {
    /// Token cannot be decrypted or does not hold a claim
    #[error("Invalid swap claim.")]
    Malformed(String),

    #[error("Claim encoding failed: {0}")]
    Encoding(String),

    #[error("Claim cipher failure: {0}")]
    Cipher(CipherError),
}

impl ClaimError {
    /// Infrastructure failure rather than a bad token
    pub fn is_operational(&self) -> bool {
        !matches!(self, ClaimError::Malformed(_))
    }
}

/// Issues and opens claim tokens with a fixed time-to-live
#[derive(Debug, Clone)]
pub struct ClaimCodec {
    cipher: Arc<dyn EnvelopeCipher>,
    ttl: chrono::Duration,
}

impl ClaimCodec {
    pub fn new(cipher: Arc<dyn EnvelopeCipher>, ttl: chrono::Duration) -> Self {
        Self { cipher, ttl }
    }

    /// Seal `intent` into a token that expires `ttl` after `now`
    ///
    /// # Arguments
    /// * `intent` - Swap the holder may later submit
    /// * `contract_id` - Identifier reused as the transaction id at redemption
    /// * `now` - Issue time
    pub async fn issue(
        &self,
        intent: &SwapIntent,
        contract_id: &str,
        now: Timestamp,
    ) -> Result<String, ClaimError> {
        let claim = Claim {
            contract_id: contract_id.to_string(),
            expires_at: now + self.ttl,
            swap_intent: intent.clone(),
        };
        let plaintext =
            serde_json::to_vec(&claim).map_err(|e| ClaimError::Encoding(e.to_string()))?;
        let token = self
            .cipher
            .encrypt(&plaintext)
            .await
            .map_err(ClaimError::Cipher)?;
        debug!(contract_id, expires_at = %claim.expires_at, "Issued swap claim");
        Ok(token)
    }

    /// Decrypt and decode a token; expiry is left to the caller
    pub async fn open(&self, token: &str) -> Result<Claim, ClaimError> {
        let plaintext = self.cipher.decrypt(token).await.map_err(|e| match e {
            CipherError::InvalidCiphertext => {
                warn!("Swap claim failed to decrypt");
                ClaimError::Malformed(e.to_string())
            }
            other => ClaimError::Cipher(other),
        })?;
        serde_json::from_slice(&plaintext).map_err(|e| {
            warn!(error = %e, "Swap claim has unexpected contents");
            ClaimError::Malformed(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::AesGcmEnvelope;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use types::Asset;

    fn intent() -> SwapIntent {
        SwapIntent {
            asset_name_in: Asset::Apples,
            asset_amount_in: dec!(10),
            asset_name_out: Asset::Bananas,
        }
    }

    fn codec() -> ClaimCodec {
        ClaimCodec::new(
            Arc::new(AesGcmEnvelope::ephemeral()),
            chrono::Duration::seconds(90),
        )
    }

    #[tokio::test]
    async fn test_issue_then_open() {
        let codec = codec();
        let now = chrono::Utc::now();
        let token = codec.issue(&intent(), "req-1", now).await.unwrap();

        let claim = codec.open(&token).await.unwrap();
        assert_eq!(claim.contract_id, "req-1");
        assert_eq!(claim.swap_intent, intent());
        assert_eq!(claim.expires_at, now + chrono::Duration::seconds(90));
        assert!(!claim.is_expired_at(now + chrono::Duration::seconds(90)));
        assert!(claim.is_expired_at(now + chrono::Duration::seconds(91)));
    }

    #[tokio::test]
    async fn test_open_rejects_foreign_token() {
        let token = codec()
            .issue(&intent(), "req-2", chrono::Utc::now())
            .await
            .unwrap();
        let err = codec().open(&token).await.unwrap_err();
        assert!(matches!(err, ClaimError::Malformed(_)));
        assert!(!err.is_operational());
        assert_eq!(err.to_string(), "Invalid swap claim.");
    }

    #[tokio::test]
    async fn test_open_rejects_non_claim_plaintext() {
        let cipher = Arc::new(AesGcmEnvelope::ephemeral());
        let token = cipher.encrypt(br#"{"hello":"world"}"#).await.unwrap();
        let codec = ClaimCodec::new(cipher, chrono::Duration::seconds(90));
        assert!(matches!(
            codec.open(&token).await,
            Err(ClaimError::Malformed(_))
        ));
    }

    #[derive(Debug)]
    struct OfflineCipher;

    #[async_trait]
    impl EnvelopeCipher for OfflineCipher {
        async fn encrypt(&self, _plaintext: &[u8]) -> Result<String, CipherError> {
            Err(CipherError::Unavailable("key service offline".into()))
        }

        async fn decrypt(&self, _token: &str) -> Result<Vec<u8>, CipherError> {
            Err(CipherError::Unavailable("key service offline".into()))
        }
    }

    #[tokio::test]
    async fn test_cipher_outage_is_operational() {
        let codec = ClaimCodec::new(Arc::new(OfflineCipher), chrono::Duration::seconds(90));
        let err = codec.open("anything").await.unwrap_err();
        assert!(err.is_operational());
        assert!(codec
            .issue(&intent(), "req-3", chrono::Utc::now())
            .await
            .unwrap_err()
            .is_operational());
    }
}
