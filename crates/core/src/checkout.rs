//! Checkout pricing rules.
//!
//! Everything the storefront charges is derived here from the cart summary
//! and the discounts the customer picked:
//!
//! - a promo code takes `percent` off the subtotal;
//! - the `charity` code takes 50% off the subtotal, only for orders up to €100;
//! - wallet points give a flat €10 off when the balance is above 300 points,
//!   and redeeming them costs 300 points;
//! - the optional donation adds €0.50 after discounts.
//!
//! The payable amount never goes below zero before the donation is added, is
//! rounded half away from zero to cents, and must fall inside
//! [`MIN_PAYABLE`]..=[`MAX_PAYABLE`] for the gateway to accept it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::round_money;

/// Percentage taken off the subtotal by the charity discount.
pub const CHARITY_PERCENT: u8 = 50;
/// Orders above this amount cannot use the charity discount.
pub const CHARITY_TOTAL_LIMIT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
/// A wallet must hold strictly more than this many points to redeem them.
pub const POINTS_THRESHOLD: i32 = 300;
/// Points removed from the wallet when the points discount is redeemed.
pub const POINTS_COST: i32 = 300;
/// Flat discount granted by redeeming points.
pub const POINTS_DISCOUNT: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
/// Amount added when the donation toggle is on.
pub const DONATION_AMOUNT: Decimal = Decimal::from_parts(50, 0, 0, false, 2);
/// Smallest amount the gateway will charge.
pub const MIN_PAYABLE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
/// Largest amount the gateway will charge.
pub const MAX_PAYABLE: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

/// Promo code that triggers the charity discount instead of a lookup.
pub const CHARITY_CODE: &str = "charity";

/// Errors raised while pricing an order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("order amounts cannot be negative")]
    NegativeAmount,

    #[error("promo discount must be between 1 and 100 percent, got {0}")]
    InvalidPercent(u8),

    #[error("Charity discount is only available for orders under €100")]
    CharityOverLimit,

    #[error("You need more than 300 points to apply this discount.")]
    InsufficientPoints {
        /// Points currently in the wallet.
        balance: i32,
    },

    #[error("Invalid final total: {0}")]
    OutOfRange(Decimal),
}

/// The code-based discount applied to an order. Promo and charity share the
/// same input field, so at most one of them applies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CodeDiscount {
    #[default]
    None,
    /// A verified promo code worth `percent`% of the subtotal.
    Promo { code: String, percent: u8 },
    /// The charity discount, already verified for this customer.
    Charity,
}

/// Everything needed to price an order.
#[derive(Debug, Clone, Default)]
pub struct PricingInput {
    /// Sum of line items.
    pub subtotal: Decimal,
    /// Subtotal plus tax and delivery.
    pub total: Decimal,
    pub code: CodeDiscount,
    /// Redeem wallet points for the flat discount.
    pub use_points: bool,
    /// Current wallet balance, only consulted when `use_points` is set.
    pub wallet_points: i32,
    pub donate: bool,
}

/// Itemised result of [`price_order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub total: Decimal,
    pub promo_code: Option<String>,
    pub promo_percent: Option<u8>,
    pub promo_discount: Decimal,
    pub charity_discount: Decimal,
    pub points_discount: Decimal,
    pub points_redeemed: i32,
    pub donation: Decimal,
    pub final_total: Decimal,
}

impl PriceBreakdown {
    /// Sum of all discounts.
    #[must_use]
    pub fn total_discount(&self) -> Decimal {
        self.promo_discount + self.charity_discount + self.points_discount
    }

    /// Label stored as `discount_type` on payment confirmations.
    #[must_use]
    pub fn discount_type(&self) -> Option<&'static str> {
        if !self.charity_discount.is_zero() {
            Some("charity")
        } else if !self.promo_discount.is_zero() {
            Some("promo")
        } else if !self.points_discount.is_zero() {
            Some("points")
        } else {
            None
        }
    }
}

/// `subtotal × percent / 100`.
#[must_use]
pub fn promo_discount(subtotal: Decimal, percent: u8) -> Decimal {
    subtotal * Decimal::from(percent) / Decimal::ONE_HUNDRED
}

/// Half the subtotal.
#[must_use]
pub fn charity_discount(subtotal: Decimal) -> Decimal {
    promo_discount(subtotal, CHARITY_PERCENT)
}

/// Whether a wallet balance is large enough to redeem the points discount.
#[must_use]
pub const fn points_redeemable(balance: i32) -> bool {
    balance > POINTS_THRESHOLD
}

/// Whether `amount` can be charged by the gateway.
#[must_use]
pub fn is_payable(amount: Decimal) -> bool {
    (MIN_PAYABLE..=MAX_PAYABLE).contains(&amount)
}

/// Price an order.
///
/// # Errors
///
/// Returns [`PricingError`] when an amount is negative, the promo percentage
/// is outside 1..=100, the charity discount is used on an order over €100,
/// points are redeemed without enough balance, or the resulting amount is not
/// payable.
pub fn price_order(input: &PricingInput) -> Result<PriceBreakdown, PricingError> {
    if input.subtotal.is_sign_negative() || input.total.is_sign_negative() {
        return Err(PricingError::NegativeAmount);
    }

    let donation = if input.donate {
        DONATION_AMOUNT
    } else {
        Decimal::ZERO
    };

    let (points_discount, points_redeemed) = if input.use_points {
        if !points_redeemable(input.wallet_points) {
            return Err(PricingError::InsufficientPoints {
                balance: input.wallet_points,
            });
        }
        (POINTS_DISCOUNT, POINTS_COST)
    } else {
        (Decimal::ZERO, 0)
    };

    let mut promo_code = None;
    let mut promo_percent = None;
    let mut promo = Decimal::ZERO;
    let mut charity = Decimal::ZERO;

    match &input.code {
        CodeDiscount::None => {}
        CodeDiscount::Promo { code, percent } => {
            if !(1..=100).contains(percent) {
                return Err(PricingError::InvalidPercent(*percent));
            }
            promo = promo_discount(input.subtotal, *percent);
            promo_code = Some(code.clone());
            promo_percent = Some(*percent);
        }
        CodeDiscount::Charity => {
            // Checked against what the customer would pay without it.
            let before_charity = clamp_zero(input.total - points_discount + donation);
            if before_charity > CHARITY_TOTAL_LIMIT {
                return Err(PricingError::CharityOverLimit);
            }
            charity = charity_discount(input.subtotal);
        }
    }

    let discounts = promo + charity + points_discount;
    let final_total = round_money(clamp_zero(input.total - discounts + donation));

    if !is_payable(final_total) {
        return Err(PricingError::OutOfRange(final_total));
    }

    Ok(PriceBreakdown {
        subtotal: input.subtotal,
        total: input.total,
        promo_code,
        promo_percent,
        promo_discount: round_money(promo),
        charity_discount: round_money(charity),
        points_discount,
        points_redeemed,
        donation,
        final_total,
    })
}

fn clamp_zero(amount: Decimal) -> Decimal {
    amount.max(Decimal::ZERO)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn eur(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn input(subtotal: i64, total: i64) -> PricingInput {
        PricingInput {
            subtotal: eur(subtotal),
            total: eur(total),
            ..PricingInput::default()
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(CHARITY_TOTAL_LIMIT, Decimal::from(100));
        assert_eq!(POINTS_DISCOUNT, Decimal::from(10));
        assert_eq!(DONATION_AMOUNT, eur(50));
        assert_eq!(MIN_PAYABLE, eur(1));
        assert_eq!(MAX_PAYABLE, eur(99_999_999));
    }

    #[test]
    fn test_no_discounts_charges_total() {
        let breakdown = price_order(&input(4000, 4500)).unwrap();
        assert_eq!(breakdown.final_total, eur(4500));
        assert_eq!(breakdown.discount_type(), None);
    }

    #[test]
    fn test_promo_takes_percent_of_subtotal() {
        let mut req = input(4000, 4500);
        req.code = CodeDiscount::Promo {
            code: "SUMMER10".into(),
            percent: 10,
        };
        let breakdown = price_order(&req).unwrap();
        assert_eq!(breakdown.promo_discount, eur(400));
        assert_eq!(breakdown.final_total, eur(4100));
        assert_eq!(breakdown.discount_type(), Some("promo"));
    }

    #[test]
    fn test_promo_percent_out_of_range() {
        let mut req = input(4000, 4500);
        req.code = CodeDiscount::Promo {
            code: "BAD".into(),
            percent: 0,
        };
        assert_eq!(price_order(&req), Err(PricingError::InvalidPercent(0)));
    }

    #[test]
    fn test_charity_halves_subtotal() {
        let mut req = input(6000, 6500);
        req.code = CodeDiscount::Charity;
        let breakdown = price_order(&req).unwrap();
        assert_eq!(breakdown.charity_discount, eur(3000));
        assert_eq!(breakdown.final_total, eur(3500));
        assert_eq!(breakdown.discount_type(), Some("charity"));
    }

    #[test]
    fn test_charity_refused_over_limit() {
        let mut req = input(9800, 10_050);
        req.code = CodeDiscount::Charity;
        assert_eq!(price_order(&req), Err(PricingError::CharityOverLimit));
    }

    #[test]
    fn test_charity_allowed_at_exactly_limit() {
        let mut req = input(9500, 10_000);
        req.code = CodeDiscount::Charity;
        assert!(price_order(&req).is_ok());
    }

    #[test]
    fn test_points_need_more_than_threshold() {
        let mut req = input(4000, 4500);
        req.use_points = true;
        req.wallet_points = 300;
        assert_eq!(
            price_order(&req),
            Err(PricingError::InsufficientPoints { balance: 300 })
        );

        req.wallet_points = 301;
        let breakdown = price_order(&req).unwrap();
        assert_eq!(breakdown.points_discount, Decimal::from(10));
        assert_eq!(breakdown.points_redeemed, POINTS_COST);
        assert_eq!(breakdown.final_total, eur(3500));
    }

    #[test]
    fn test_donation_does_not_survive_full_discount() {
        let mut req = input(500, 800);
        req.use_points = true;
        req.wallet_points = 1000;
        req.donate = true;
        // 8.00 - 10.00 + 0.50 is still below zero, so nothing is payable.
        assert_eq!(
            price_order(&req),
            Err(PricingError::OutOfRange(Decimal::ZERO.round_dp(2)))
        );
    }

    #[test]
    fn test_donation_offsets_discount_before_clamping() {
        let mut req = input(500, 1000);
        req.use_points = true;
        req.wallet_points = 1000;
        req.donate = true;
        // 10.00 - 10.00 + 0.50
        let breakdown = price_order(&req).unwrap();
        assert_eq!(breakdown.final_total, eur(50));
    }

    #[test]
    fn test_fully_discounted_order_is_not_payable() {
        let mut req = input(500, 800);
        req.use_points = true;
        req.wallet_points = 1000;
        assert_eq!(
            price_order(&req),
            Err(PricingError::OutOfRange(Decimal::ZERO.round_dp(2)))
        );
    }

    #[test]
    fn test_final_total_rounds_half_away_from_zero() {
        let mut req = input(3333, 3333);
        req.code = CodeDiscount::Promo {
            code: "P15".into(),
            percent: 15,
        };
        // 33.33 - 4.9995 = 28.3305 -> 28.33
        let breakdown = price_order(&req).unwrap();
        assert_eq!(breakdown.final_total, eur(2833));
    }

    #[test]
    fn test_negative_amounts_rejected() {
        assert_eq!(
            price_order(&input(-1, 100)),
            Err(PricingError::NegativeAmount)
        );
    }

    #[test]
    fn test_is_payable_bounds() {
        assert!(!is_payable(Decimal::ZERO));
        assert!(is_payable(eur(1)));
        assert!(is_payable(eur(99_999_999)));
        assert!(!is_payable(eur(100_000_000)));
    }
}
