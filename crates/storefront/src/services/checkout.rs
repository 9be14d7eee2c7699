//! Server-side checkout: price the order, take the card payment through
//! `SumUp`, then record the order.
//!
//! A payment confirmation row is written before the card is charged. If
//! anything fails after `SumUp` captured the money, that row (still `PENDING`
//! or already `PAID`) is what `/api/payments/reconcile` and staff use to trace
//! the payment.

use chrono::Utc;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use samara_core::checkout::{
    CHARITY_CODE, CodeDiscount, PriceBreakdown, PricingError, PricingInput,
    price_order,
};
use samara_core::{AddressId, ConfirmationId, CurrencyCode, CustomerId, OrderId, PaymentStatus};

use crate::db::wallet::Deduction;
use crate::db::{
    AddressRepository, ConfirmationRepository, OrderRepository, PromoRepository,
    RepositoryError, WalletRepository,
};
use crate::models::{
    Address, ContactInfo, NewOrder, NewPaymentConfirmation, OrderSummary, PromoCode,
    PromoRejection,
};
use crate::services::sumup::{
    CardDetails, Checkout, NewCheckout, SumUpClient, SumUpError, parse_checkout,
};

/// Description sent to `SumUp` with every storefront checkout.
pub const CHECKOUT_DESCRIPTION: &str = "Website Order";

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Bad input (contact details and the like).
    #[error("{0}")]
    Validation(String),

    #[error("Address not found")]
    AddressNotFound,

    #[error("Sorry, we do not deliver to {0} yet")]
    OutOfCoverage(String),

    #[error(transparent)]
    Promo(#[from] PromoRejection),

    #[error("You are not eligible for charity discount")]
    CharityNotEligible,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// `SumUp` answered the checkout creation with something other than
    /// `PENDING`.
    #[error("Checkout not created")]
    CheckoutNotCreated,

    /// The card was declined.
    #[error("{0}")]
    PaymentFailed(String),

    /// The card payment has not settled.
    #[error("Payment not completed yet")]
    PaymentIncomplete,

    #[error(transparent)]
    SumUp(#[from] SumUpError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A checkout submitted by the customer.
#[derive(Debug)]
pub struct CheckoutRequest {
    pub user_id: CustomerId,
    pub address_id: AddressId,
    pub contact: ContactInfo,
    pub promo_code: Option<String>,
    pub use_points: bool,
    pub donate: bool,
    pub notes: Option<String>,
    pub summary: OrderSummary,
    pub card: CardDetails,
}

/// A paid and recorded order.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    pub checkout_id: String,
    pub breakdown: PriceBreakdown,
}

/// Look up a promo code and check it can be used right now.
///
/// # Errors
///
/// Returns `CheckoutError::Promo` when the code is unknown or not redeemable,
/// `CheckoutError::Repository` if the lookup fails.
pub async fn redeemable_promo(pool: &PgPool, code: &str) -> Result<PromoCode, CheckoutError> {
    let promos = PromoRepository::new(pool);
    let promo = promos
        .find_by_code(code)
        .await?
        .ok_or(PromoRejection::Unknown)?;

    let uses = if promo.max_uses.is_some() {
        promos.count_uses(&promo.code).await?
    } else {
        0
    };
    promo.check_redeemable(Utc::now(), uses)?;
    Ok(promo)
}

/// Create the `SumUp` checkout for an order and make sure it is waiting for
/// payment.
///
/// # Errors
///
/// Returns `CheckoutError::CheckoutNotCreated` when `SumUp` answers with any
/// status other than `PENDING`, `CheckoutError::SumUp` if the call fails.
pub async fn open_checkout(
    sumup: &SumUpClient,
    amount: Decimal,
) -> Result<Checkout, CheckoutError> {
    let (_, checkout) = sumup
        .create_checkout(&NewCheckout {
            amount,
            currency: CurrencyCode::EUR,
            description: CHECKOUT_DESCRIPTION.to_owned(),
            checkout_reference: None,
        })
        .await?;

    if checkout.payment_status() != Some(PaymentStatus::Pending) {
        warn!(checkout_id = %checkout.id, status = ?checkout.status, "Checkout not pending");
        return Err(CheckoutError::CheckoutNotCreated);
    }
    Ok(checkout)
}

/// Submit the card against a checkout and require a settled payment.
///
/// # Errors
///
/// Returns `CheckoutError::PaymentFailed` with the gateway's reason when the
/// card is declined, `CheckoutError::PaymentIncomplete` for any other status
/// than `PAID`, `CheckoutError::SumUp` if the call fails.
pub async fn charge_card(
    sumup: &SumUpClient,
    checkout_id: &str,
    card: &CardDetails,
) -> Result<Checkout, CheckoutError> {
    let paid = sumup.process_checkout(checkout_id, card).await?;
    let paid = parse_checkout(StatusCode::OK, paid)?;

    match paid.payment_status() {
        Some(PaymentStatus::Paid) => Ok(paid),
        Some(PaymentStatus::Failed) => {
            let message = paid
                .failure_message()
                .unwrap_or_else(|| "Payment failed".to_owned());
            Err(CheckoutError::PaymentFailed(message))
        }
        _ => Err(CheckoutError::PaymentIncomplete),
    }
}

/// Checkout orchestration.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    sumup: &'a SumUpClient,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, sumup: &'a SumUpClient) -> Self {
        Self { pool, sumup }
    }

    /// Run the whole checkout.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] naming the step that failed.
    #[instrument(skip_all, fields(user_id = %request.user_id, address_id = %request.address_id))]
    pub async fn place_order(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        request
            .contact
            .validate()
            .map_err(CheckoutError::Validation)?;

        let address = self.deliverable_address(request.user_id, request.address_id).await?;
        let breakdown = self.price(&request).await?;

        let checkout = open_checkout(self.sumup, breakdown.final_total).await?;

        let confirmation = ConfirmationRepository::new(self.pool)
            .create(&confirmation_for(&request, &address, &breakdown, &checkout.id))
            .await?;

        if let Err(e) = charge_card(self.sumup, &checkout.id, &request.card).await {
            if matches!(e, CheckoutError::PaymentFailed(_)) {
                self.mark_failed(confirmation.id, &checkout.id).await;
            }
            return Err(e);
        }

        let order = NewOrder {
            user_id: request.user_id,
            country: Some(address.country.clone()),
            city_id: address.city_id,
            city: address.city_name.clone().or_else(|| address.city.clone()),
            street: Some(address.street.clone()),
            floor: Some(address.floor.clone()),
            landmark: Some(address.landmark.clone()),
            contact: request.contact.clone(),
            promo_code: applied_code(&breakdown),
            discount: breakdown.promo_discount,
            charity_discount: breakdown.charity_discount,
            points_discount: breakdown.points_discount,
            donation: breakdown.donation,
            notes: request.notes.clone(),
            transaction_code: checkout.id.clone(),
            final_total: breakdown.final_total,
            summary: request.summary.clone(),
        };
        let order_id = match OrderRepository::new(self.pool).create(&order).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    checkout_id = %checkout.id,
                    confirmation_id = %confirmation.id,
                    error = %e,
                    "Payment captured but order could not be created"
                );
                return Err(e.into());
            }
        };

        if let Err(e) = ConfirmationRepository::new(self.pool)
            .mark_paid(confirmation.id)
            .await
        {
            error!(
                checkout_id = %checkout.id,
                order_id = %order_id,
                error = %e,
                "Failed to mark confirmation paid"
            );
        }

        if breakdown.points_redeemed > 0 {
            self.redeem_points(request.user_id, breakdown.points_redeemed).await;
        }

        info!(order_id = %order_id, checkout_id = %checkout.id, "Order placed");
        Ok(CheckoutOutcome {
            order_id,
            checkout_id: checkout.id,
            breakdown,
        })
    }

    /// Load the customer's address and make sure we deliver there.
    async fn deliverable_address(
        &self,
        user_id: CustomerId,
        address_id: AddressId,
    ) -> Result<Address, CheckoutError> {
        let address = AddressRepository::new(self.pool)
            .get_for_user(user_id, address_id)
            .await?
            .ok_or(CheckoutError::AddressNotFound)?;

        if address.is_out_of_coverage() {
            let city = address
                .city_name
                .clone()
                .or_else(|| address.city.clone())
                .unwrap_or_default();
            return Err(CheckoutError::OutOfCoverage(city));
        }
        Ok(address)
    }

    /// Verify the requested discounts and price the order.
    async fn price(&self, request: &CheckoutRequest) -> Result<PriceBreakdown, CheckoutError> {
        let code = match request
            .promo_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            None => CodeDiscount::None,
            Some(code) if code.eq_ignore_ascii_case(CHARITY_CODE) => {
                if !PromoRepository::new(self.pool)
                    .is_charity_beneficiary(request.user_id)
                    .await?
                {
                    return Err(CheckoutError::CharityNotEligible);
                }
                CodeDiscount::Charity
            }
            Some(code) => {
                let promo = redeemable_promo(self.pool, code).await?;
                CodeDiscount::Promo {
                    code: promo.code,
                    percent: promo.discount_value,
                }
            }
        };

        let wallet_points = if request.use_points {
            WalletRepository::new(self.pool)
                .balance(request.user_id)
                .await?
        } else {
            0
        };

        Ok(price_order(&PricingInput {
            subtotal: request.summary.subtotal,
            total: request.summary.total,
            code,
            use_points: request.use_points,
            wallet_points,
            donate: request.donate,
        })?)
    }

    /// Record a declined card so reconciliation stops polling the checkout.
    async fn mark_failed(&self, confirmation_id: ConfirmationId, checkout_id: &str) {
        if let Err(e) = ConfirmationRepository::new(self.pool)
            .set_status(confirmation_id, PaymentStatus::Failed)
            .await
        {
            error!(%checkout_id, error = %e, "Failed to mark confirmation failed");
        }
    }

    /// Spend redeemed points. Failures are logged; the order already stands.
    async fn redeem_points(&self, user_id: CustomerId, points: i32) {
        match WalletRepository::new(self.pool).deduct(user_id, points).await {
            Ok(Deduction::Applied(balance)) => {
                info!(points, balance, "Wallet points redeemed");
            }
            Ok(Deduction::Insufficient) => {
                warn!(points, "Wallet balance dropped below redemption cost");
            }
            Err(e) => {
                error!(points, error = %e, "Failed to deduct wallet points");
            }
        }
    }
}

/// Build the confirmation row recorded before the card is charged.
fn confirmation_for(
    request: &CheckoutRequest,
    address: &Address,
    breakdown: &PriceBreakdown,
    checkout_id: &str,
) -> NewPaymentConfirmation {
    NewPaymentConfirmation {
        user_id: Some(request.user_id),
        checkout_id: Some(checkout_id.to_owned()),
        status: Some(PaymentStatus::Pending.as_str().to_owned()),
        country: Some(address.country.clone()),
        city: address.city_name.clone().or_else(|| address.city.clone()),
        street: Some(address.street.clone()),
        floor: Some(address.floor.clone()),
        landmark: Some(address.landmark.clone()),
        f_name: Some(request.contact.first_name.trim().to_owned()),
        s_name: Some(request.contact.last_name.trim().to_owned()),
        phone: Some(request.contact.phone.trim().to_owned()),
        email: Some(request.contact.email.trim().to_owned()),
        notes: request.notes.clone(),
        donation: Some(breakdown.donation),
        discount_type: breakdown.discount_type().map(str::to_owned),
        discount_amount: Some(breakdown.total_discount()),
        promocode: applied_code(breakdown),
        final_price: Some(breakdown.final_total),
        price: Some(breakdown.total),
    }
}

/// Code stored on the order: the promo code, or `charity` for the charity
/// discount.
fn applied_code(breakdown: &PriceBreakdown) -> Option<String> {
    breakdown.promo_code.clone().or_else(|| {
        (!breakdown.charity_discount.is_zero()).then(|| CHARITY_CODE.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use samara_core::CityId;

    use super::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            user_id: CustomerId::new(uuid::Uuid::nil()),
            address_id: AddressId::new(1),
            contact: ContactInfo {
                first_name: "Noor".into(),
                last_name: "Saleh".into(),
                phone: "0851234567".into(),
                email: "noor@example.ie".into(),
            },
            promo_code: Some("SPRING".into()),
            use_points: false,
            donate: true,
            notes: Some("Ring twice".into()),
            summary: OrderSummary {
                subtotal: Decimal::new(4000, 2),
                tax: Decimal::ZERO,
                delivery: Decimal::new(500, 2),
                total: Decimal::new(4500, 2),
                items: vec![],
            },
            card: CardDetails {
                name: "Noor Saleh".into(),
                number: SecretString::from("4111111111111111"),
                expiry_month: "12".into(),
                expiry_year: "30".into(),
                cvv: SecretString::from("123"),
            },
        }
    }

    fn address() -> Address {
        Address {
            id: AddressId::new(1),
            user_id: CustomerId::new(uuid::Uuid::nil()),
            country: "Ireland".into(),
            city_id: Some(CityId::new(2)),
            city: Some("cork".into()),
            city_name: Some("Cork".into()),
            city_active: Some(true),
            street: "Main St".into(),
            floor: "2".into(),
            landmark: "Near the church".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_confirmation_records_breakdown() {
        let breakdown = price_order(&PricingInput {
            subtotal: Decimal::new(4000, 2),
            total: Decimal::new(4500, 2),
            code: CodeDiscount::Promo {
                code: "SPRING".into(),
                percent: 10,
            },
            donate: true,
            ..PricingInput::default()
        })
        .expect("priced");

        let row = confirmation_for(&request(), &address(), &breakdown, "chk_1");
        assert_eq!(row.checkout_id.as_deref(), Some("chk_1"));
        assert_eq!(row.status.as_deref(), Some("PENDING"));
        assert_eq!(row.city.as_deref(), Some("Cork"));
        assert_eq!(row.discount_type.as_deref(), Some("promo"));
        assert_eq!(row.discount_amount, Some(Decimal::new(400, 2)));
        assert_eq!(row.donation, Some(Decimal::new(50, 2)));
        assert_eq!(row.final_price, Some(Decimal::new(4150, 2)));
        assert_eq!(row.price, Some(Decimal::new(4500, 2)));
        assert_eq!(row.promocode.as_deref(), Some("SPRING"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CheckoutError::OutOfCoverage("Sligo".into()).to_string(),
            "Sorry, we do not deliver to Sligo yet"
        );
        assert_eq!(
            CheckoutError::from(PromoRejection::Expired).to_string(),
            "This promo code has expired"
        );
        assert_eq!(
            CheckoutError::PaymentIncomplete.to_string(),
            "Payment not completed yet"
        );
    }
}
