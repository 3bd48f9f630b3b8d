//! # Orchard Claims - Swap Claim Tokens
//!
//! ## Purpose
//!
//! A claim is the bearer token returned by Estimate: it carries the swap
//! intent, a contract id and an expiry, sealed so clients can neither read
//! nor forge it. Holding a valid, unexpired claim is the only way to Submit.
//!
//! ## Integration Points
//!
//! - **Estimate**: [`ClaimCodec::issue`] seals the intent with `expires_at = now + ttl`
//! - **Submit**: [`ClaimCodec::open`] recovers the claim; any token that fails
//!   to decrypt or decode is reported as [`ClaimError::Malformed`]
//! - **Key material**: [`AesGcmEnvelope`] takes a 32-byte key as hex from
//!   configuration; other backends implement [`EnvelopeCipher`]
//!
//! ## Architecture Role
//!
//! ```text
//! SwapIntent ──issue──▶ JSON ──EnvelopeCipher::encrypt──▶ token
//! token ──EnvelopeCipher::decrypt──▶ JSON ──open──▶ Claim
//! ```
//!
//! The plaintext is never exposed outside the codec. Expiry is checked by the
//! caller against its own clock, so the codec stays time-agnostic.

pub mod cipher;
pub mod codec;

pub use cipher::{AesGcmEnvelope, CipherError, EnvelopeCipher};
pub use codec::{ClaimCodec, ClaimError};
