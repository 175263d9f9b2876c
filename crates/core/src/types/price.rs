//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A selling price with its strike-through reference price.
///
/// Products carry both a selling `amount` and an `mrp` (maximum retail
/// price). The invariant `mrp >= amount` is validated at construction;
/// the displayed discount is always derived from the pair, never stored
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Selling amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// Maximum retail price; the pre-discount reference amount.
    pub mrp: Decimal,
}

/// Error constructing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// The selling amount exceeds the MRP.
    #[error("price {amount} exceeds mrp {mrp}")]
    AmountAboveMrp {
        /// Offending selling amount.
        amount: Decimal,
        /// Reference MRP.
        mrp: Decimal,
    },
    /// Negative amounts are not representable prices.
    #[error("price cannot be negative")]
    Negative,
}

impl Price {
    /// Create a new price, validating `mrp >= amount >= 0`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::AmountAboveMrp`] if the selling amount is
    /// greater than the MRP, and [`PriceError::Negative`] if either value
    /// is below zero.
    pub fn new(amount: Decimal, mrp: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() || mrp.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        if amount > mrp {
            return Err(PriceError::AmountAboveMrp { amount, mrp });
        }
        Ok(Self { amount, mrp })
    }

    /// Percentage discount implied by the MRP/amount pair, rounded to a
    /// whole percent. Zero when the MRP is zero.
    #[must_use]
    pub fn discount_percent(&self) -> Decimal {
        if self.mrp.is_zero() {
            return Decimal::ZERO;
        }
        ((self.mrp - self.amount) / self.mrp * Decimal::ONE_HUNDRED).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_amount_above_mrp() {
        let err = Price::new(Decimal::from(120), Decimal::from(100)).unwrap_err();
        assert!(matches!(err, PriceError::AmountAboveMrp { .. }));
    }

    #[test]
    fn rejects_negative_amounts() {
        assert_eq!(
            Price::new(Decimal::from(-1), Decimal::from(10)),
            Err(PriceError::Negative)
        );
    }

    #[test]
    fn discount_is_derived_from_pair() {
        let price = Price::new(Decimal::from(75), Decimal::from(100)).expect("valid price");
        assert_eq!(price.discount_percent(), Decimal::from(25));

        let free = Price::new(Decimal::ZERO, Decimal::ZERO).expect("valid price");
        assert_eq!(free.discount_percent(), Decimal::ZERO);
    }
}
