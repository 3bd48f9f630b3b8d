//! Bounds and invariants checked when a pool is created

use rust_decimal::Decimal;
use types::{AssetQuote, ValidationError};

/// Accepted ranges for a new pool's legs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolLimits {
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub min_supply: Decimal,
    pub max_supply: Decimal,
    /// Relative tolerance for the equal-market-cap check
    pub cap_tolerance: Decimal,
}

impl PoolLimits {
    /// Check both legs are in range and carry equal market caps
    pub fn validate_new_pool(
        &self,
        asset_one: &AssetQuote,
        asset_two: &AssetQuote,
    ) -> Result<(), ValidationError> {
        for leg in [asset_one, asset_two] {
            if leg.price < self.min_price || leg.price > self.max_price {
                return Err(ValidationError::PriceOutOfRange {
                    min: self.min_price,
                    max: self.max_price,
                });
            }
            if leg.amount < self.min_supply || leg.amount > self.max_supply {
                return Err(ValidationError::SupplyOutOfRange {
                    min: self.min_supply,
                    max: self.max_supply,
                });
            }
        }

        if !within_tolerance(
            asset_one.market_cap(),
            asset_two.market_cap(),
            self.cap_tolerance,
        ) {
            return Err(ValidationError::UnequalMarketCap);
        }
        Ok(())
    }
}

/// `|a - b| <= tolerance × max(|a|, |b|)`
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    let scale = a.abs().max(b.abs());
    (a - b).abs() <= tolerance * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limits() -> PoolLimits {
        PoolLimits {
            min_price: dec!(0.01),
            max_price: dec!(100000),
            min_supply: dec!(1),
            max_supply: dec!(1000000000),
            cap_tolerance: dec!(0.000001),
        }
    }

    #[test]
    fn test_equal_caps_accepted() {
        assert!(limits()
            .validate_new_pool(
                &AssetQuote::new(dec!(100), dec!(10)),
                &AssetQuote::new(dec!(1000), dec!(1)),
            )
            .is_ok());
    }

    #[test]
    fn test_unequal_caps_rejected() {
        assert_eq!(
            limits().validate_new_pool(
                &AssetQuote::new(dec!(100), dec!(10)),
                &AssetQuote::new(dec!(1001), dec!(1)),
            ),
            Err(ValidationError::UnequalMarketCap)
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let limits = limits();
        assert!(matches!(
            limits.validate_new_pool(
                &AssetQuote::new(dec!(100), dec!(0.001)),
                &AssetQuote::new(dec!(0.1), dec!(1)),
            ),
            Err(ValidationError::PriceOutOfRange { .. })
        ));
        assert!(matches!(
            limits.validate_new_pool(
                &AssetQuote::new(dec!(0.5), dec!(2)),
                &AssetQuote::new(dec!(1), dec!(1)),
            ),
            Err(ValidationError::SupplyOutOfRange { .. })
        ));
    }

    #[test]
    fn test_tolerance_is_relative() {
        assert!(within_tolerance(dec!(1000000), dec!(1000000.5), dec!(0.000001)));
        assert!(!within_tolerance(dec!(1), dec!(1.5), dec!(0.000001)));
        assert!(within_tolerance(dec!(0), dec!(0), dec!(0.000001)));
    }
}
