//! Market-cap bonding curve math with exact calculations
//!
//! Preserves full precision using Decimal type; every operation is checked so
//! degenerate pools fail loudly instead of producing NaN-like results.

use crate::errors::PricingError;
use rust_decimal::Decimal;
use tracing::debug;
use types::{AssetQuote, LiquidityPool, SwapIntent, SwapQuote, Timestamp};

/// Bonding-curve pricing functions
pub struct PricingEngine;

impl PricingEngine {
    /// Quote `intent` against `pool` without touching the pool
    ///
    /// # Arguments
    /// * `pool` - Pool snapshot the swap is priced against
    /// * `intent` - Validated swap intent (`asset_amount_in >= 0`)
    ///
    /// # Returns
    /// Quote whose `in_leg` is the amount swapped in at the current input
    /// price and whose `out_leg` is the amount paid out at the output asset's
    /// post-swap price
    pub fn estimate(pool: &LiquidityPool, intent: &SwapIntent) -> Result<SwapQuote, PricingError> {
        if intent.asset_amount_in < Decimal::ZERO {
            return Err(PricingError::NegativeAmount);
        }
        if intent.asset_name_in == intent.asset_name_out {
            return Err(PricingError::SameAsset);
        }

        let leg_in = pool
            .leg(intent.asset_name_in)
            .ok_or(PricingError::AssetNotInPool {
                asset: intent.asset_name_in,
                pool: pool.pool_name,
            })?;
        let leg_out = pool
            .leg(intent.asset_name_out)
            .ok_or(PricingError::AssetNotInPool {
                asset: intent.asset_name_out,
                pool: pool.pool_name,
            })?;

        if leg_in.amount.is_zero() {
            return Err(PricingError::DivisionByZero("input asset supply is zero"));
        }
        if leg_in.price.is_zero() {
            return Err(PricingError::DivisionByZero("input asset price is zero"));
        }
        if leg_out.price.is_zero() {
            return Err(PricingError::DivisionByZero("output asset price is zero"));
        }

        // k = capIn², evaluated at the input asset's current price
        let cap_in = mul(leg_in.amount, leg_in.price, "input market cap")?;
        let k = mul(cap_in, cap_in, "curve constant")?;

        let cap_added = mul(intent.asset_amount_in, leg_in.price, "added market cap")?;
        let new_cap_in = add(cap_in, cap_added, "new input market cap")?;
        let new_cap_out = div(k, new_cap_in, "new output market cap")?;
        let cap_delta = sub(cap_in, new_cap_out, "market cap delta")?;

        let amount_out = div(cap_delta, leg_out.price, "output amount")?;
        let price_ratio = div(cap_in, new_cap_out, "output price ratio")?;
        let new_price_out = mul(price_ratio, leg_out.price, "new output price")?;

        debug!(
            pool = %pool.pool_name,
            cap_in = %cap_in,
            cap_added = %cap_added,
            new_cap_out = %new_cap_out,
            amount_out = %amount_out,
            new_price_out = %new_price_out,
            "Estimated swap"
        );

        Ok(SwapQuote {
            in_name: intent.asset_name_in,
            in_leg: AssetQuote::new(intent.asset_amount_in, leg_in.price),
            out_name: intent.asset_name_out,
            out_leg: AssetQuote::new(amount_out, new_price_out),
        })
    }

    /// Apply `quote` to `pool`, returning the next pool state
    ///
    /// The leg named by `quote.in_name` gains `quote.in_leg.amount`, the other
    /// leg loses `quote.out_leg.amount`, and both legs are repriced so their
    /// market caps equal the input leg's pre-swap market cap. The result has
    /// `updated_at = now` and no `created_at`, so a skip-null overwrite keeps
    /// the stored creation time.
    pub fn apply(
        pool: &LiquidityPool,
        quote: &SwapQuote,
        now: Timestamp,
    ) -> Result<LiquidityPool, PricingError> {
        let name = pool.pool_name;
        if quote.in_name == quote.out_name {
            return Err(PricingError::SameAsset);
        }
        for asset in [quote.in_name, quote.out_name] {
            if !name.contains(asset) {
                return Err(PricingError::AssetNotInPool { asset, pool: name });
            }
        }

        let in_is_leading = quote.in_name == name.leading();
        let input_leg = if in_is_leading {
            &pool.asset_one
        } else {
            &pool.asset_two
        };
        let cap_in = mul(input_leg.amount, input_leg.price, "input market cap")?;

        let (amount_one, amount_two) = if in_is_leading {
            (
                add(pool.asset_one.amount, quote.in_leg.amount, "asset one supply")?,
                sub(pool.asset_two.amount, quote.out_leg.amount, "asset two supply")?,
            )
        } else {
            (
                sub(pool.asset_one.amount, quote.out_leg.amount, "asset one supply")?,
                add(pool.asset_two.amount, quote.in_leg.amount, "asset two supply")?,
            )
        };

        if amount_one <= Decimal::ZERO {
            return Err(PricingError::InsufficientLiquidity {
                asset: name.leading(),
                pool: name,
            });
        }
        if amount_two <= Decimal::ZERO {
            return Err(PricingError::InsufficientLiquidity {
                asset: name.trailing(),
                pool: name,
            });
        }

        let price_one = div(cap_in, amount_one, "asset one price")?;
        let price_two = div(cap_in, amount_two, "asset two price")?;

        Ok(LiquidityPool {
            pool_name: name,
            asset_one: AssetQuote::new(amount_one, price_one),
            asset_two: AssetQuote::new(amount_two, price_two),
            created_at: None,
            updated_at: Some(now),
        })
    }
}

/// Market caps of both legs, in declaration order
pub fn market_caps(pool: &LiquidityPool) -> (Decimal, Decimal) {
    (pool.asset_one.market_cap(), pool.asset_two.market_cap())
}

fn mul(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, PricingError> {
    a.checked_mul(b).ok_or(PricingError::Overflow(what))
}

fn add(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, PricingError> {
    a.checked_add(b).ok_or(PricingError::Overflow(what))
}

fn sub(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, PricingError> {
    a.checked_sub(b).ok_or(PricingError::Overflow(what))
}

fn div(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, PricingError> {
    if b.is_zero() {
        return Err(PricingError::DivisionByZero(what));
    }
    a.checked_div(b).ok_or(PricingError::Overflow(what))
}
