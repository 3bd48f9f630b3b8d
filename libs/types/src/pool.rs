//! Liquidity pool model and canonical pool naming

use crate::asset::Asset;
use crate::errors::ValidationError;
use crate::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical `"<A>-<B>"` pool identifier with `A < B`
///
/// The only constructors order the pair (or reject an unordered name), so two
/// `PoolName`s for the same unordered pair are always equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PoolName {
    leading: Asset,
    trailing: Asset,
}

impl PoolName {
    /// Build the canonical name for an unordered pair of assets
    pub fn for_pair(a: Asset, b: Asset) -> Result<Self, ValidationError> {
        match a.as_str().cmp(b.as_str()) {
            std::cmp::Ordering::Less => Ok(Self {
                leading: a,
                trailing: b,
            }),
            std::cmp::Ordering::Greater => Ok(Self {
                leading: b,
                trailing: a,
            }),
            std::cmp::Ordering::Equal => Err(ValidationError::DuplicateAsset),
        }
    }

    /// Asset whose quote is stored in `asset_one`
    pub fn leading(&self) -> Asset {
        self.leading
    }

    /// Asset whose quote is stored in `asset_two`
    pub fn trailing(&self) -> Asset {
        self.trailing
    }

    pub fn contains(&self, asset: Asset) -> bool {
        self.leading == asset || self.trailing == asset
    }
}

impl fmt::Display for PoolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.leading, self.trailing)
    }
}

impl FromStr for PoolName {
    type Err = ValidationError;

    /// Parse an externally supplied name, rejecting anything that is not
    /// already canonical
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 2 {
            return Err(ValidationError::InvalidPoolName);
        }
        let leading: Asset = parts[0].parse()?;
        let trailing: Asset = parts[1].parse()?;
        if leading == trailing {
            return Err(ValidationError::InvalidPoolName);
        }
        if leading.as_str() > trailing.as_str() {
            return Err(ValidationError::PoolNameAssetOrder);
        }
        Ok(Self { leading, trailing })
    }
}

impl TryFrom<String> for PoolName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PoolName> for String {
    fn from(name: PoolName) -> Self {
        name.to_string()
    }
}

/// Supply and unit price of one asset inside a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuote {
    pub amount: Decimal,
    pub price: Decimal,
}

impl AssetQuote {
    pub fn new(amount: Decimal, price: Decimal) -> Self {
        Self { amount, price }
    }

    pub fn market_cap(&self) -> Decimal {
        self.amount * self.price
    }
}

/// Reserve of two assets priced against each other
///
/// `asset_one` always belongs to `pool_name.leading()`. Timestamps are optional
/// so a partial overwrite can leave them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityPool {
    pub pool_name: PoolName,
    pub asset_one: AssetQuote,
    pub asset_two: AssetQuote,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl LiquidityPool {
    /// Quote for `asset`, if it is one of the pool's two legs
    pub fn leg(&self, asset: Asset) -> Option<&AssetQuote> {
        if asset == self.pool_name.leading() {
            Some(&self.asset_one)
        } else if asset == self.pool_name.trailing() {
            Some(&self.asset_two)
        } else {
            None
        }
    }

    /// Merge `update` into `self`, keeping existing values where the update
    /// leaves an optional field unset
    pub fn overlay(&mut self, update: LiquidityPool) {
        self.asset_one = update.asset_one;
        self.asset_two = update.asset_two;
        if update.created_at.is_some() {
            self.created_at = update.created_at;
        }
        if update.updated_at.is_some() {
            self.updated_at = update.updated_at;
        }
    }
}

/// Body of a pool creation request; legs are optional so missing fields map
/// to a validation error instead of a parse failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    pub asset_one: Option<AssetQuote>,
    pub asset_two: Option<AssetQuote>,
}
