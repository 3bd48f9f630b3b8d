//! Swap intents, quotes, claims and the settlement message

use crate::asset::Asset;
use crate::errors::ValidationError;
use crate::pool::{AssetQuote, PoolName};
use crate::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Client-submitted desire to swap `asset_amount_in` of one asset for another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapIntent {
    pub asset_name_in: Asset,
    pub asset_amount_in: Decimal,
    pub asset_name_out: Asset,
}

impl SwapIntent {
    /// Canonical pool that prices this intent
    pub fn pool_name(&self) -> Result<PoolName, ValidationError> {
        PoolName::for_pair(self.asset_name_in, self.asset_name_out)
    }
}

/// Untyped wire form of a [`SwapIntent`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapIntentRequest {
    pub asset_name_in: Option<String>,
    pub asset_amount_in: Option<Decimal>,
    pub asset_name_out: Option<String>,
}

impl SwapIntentRequest {
    pub fn validate(&self) -> Result<SwapIntent, ValidationError> {
        let (name_in, amount_in, name_out) = match (
            self.asset_name_in.as_deref(),
            self.asset_amount_in,
            self.asset_name_out.as_deref(),
        ) {
            (Some(name_in), Some(amount_in), Some(name_out)) => (name_in, amount_in, name_out),
            _ => return Err(ValidationError::MissingFields),
        };

        let asset_name_in: Asset = name_in.parse()?;
        let asset_name_out: Asset = name_out.parse()?;
        if asset_name_in == asset_name_out {
            return Err(ValidationError::DuplicateAsset);
        }
        if amount_in < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount);
        }

        Ok(SwapIntent {
            asset_name_in,
            asset_amount_in: amount_in,
            asset_name_out,
        })
    }
}

/// Result of pricing a [`SwapIntent`] against one pool snapshot
///
/// `in_leg` carries the amount swapped in at the pre-swap input price;
/// `out_leg` carries the amount paid out and the output asset's new price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub in_name: Asset,
    pub in_leg: AssetQuote,
    pub out_name: Asset,
    pub out_leg: AssetQuote,
}

/// Time-bounded, single-use right to execute a swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub contract_id: String,
    pub expires_at: Timestamp,
    pub swap_intent: SwapIntent,
}

impl Claim {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// Settlement work item carried from Submit to Settle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementMessage {
    pub contract_id: String,
    pub swap_intent: SwapIntent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(name_in: &str, amount: Decimal, name_out: &str) -> SwapIntentRequest {
        SwapIntentRequest {
            asset_name_in: Some(name_in.to_string()),
            asset_amount_in: Some(amount),
            asset_name_out: Some(name_out.to_string()),
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_request() {
        let intent = request("Apples", dec!(10), "Bananas").validate().unwrap();
        assert_eq!(intent.asset_name_in, Asset::Apples);
        assert_eq!(intent.asset_amount_in, dec!(10));
        assert_eq!(intent.pool_name().unwrap().to_string(), "Apples-Bananas");

        // zero is a valid amount
        assert!(request("Apples", dec!(0), "Bananas").validate().is_ok());
    }

    #[test]
    fn test_validate_rejections() {
        assert_eq!(
            SwapIntentRequest::default().validate(),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            request("Apples", dec!(1), "Durian").validate(),
            Err(ValidationError::InvalidAssetName)
        );
        assert_eq!(
            request("Apples", dec!(1), "Apples").validate(),
            Err(ValidationError::DuplicateAsset)
        );
        assert_eq!(
            request("Apples", dec!(-1), "Bananas").validate(),
            Err(ValidationError::NegativeAmount)
        );
    }

    #[test]
    fn test_reverse_intent_maps_to_same_pool() {
        let forward = request("Bananas", dec!(5), "Apples").validate().unwrap();
        let backward = request("Apples", dec!(5), "Bananas").validate().unwrap();
        assert_eq!(forward.pool_name(), backward.pool_name());
    }

    #[test]
    fn test_claim_expiry_is_strict() {
        let expires_at = chrono::Utc::now();
        let claim = Claim {
            contract_id: "c-1".to_string(),
            expires_at,
            swap_intent: request("Apples", dec!(1), "Bananas").validate().unwrap(),
        };
        assert!(!claim.is_expired_at(expires_at));
        assert!(claim.is_expired_at(expires_at + chrono::Duration::milliseconds(1)));
    }
}
