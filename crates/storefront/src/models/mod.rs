//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Most of them serialize straight into API responses.

pub mod address;
pub mod catalog;
pub mod city;
pub mod confirmation;
pub mod order;
pub mod promo;
pub mod review;
pub mod session;
pub mod staff;

pub use address::{Address, AddressInput, CityChoice};
pub use catalog::{Category, CategoryInput, Product};
pub use city::City;
pub use confirmation::{NewPaymentConfirmation, PaymentConfirmation};
pub use order::{ContactInfo, NewOrder, Order, OrderSummary};
pub use promo::{PromoCode, PromoRejection};
pub use review::{Review, ReviewAuthor, ReviewStats};
pub use session::{CurrentStaff, keys as session_keys};
pub use staff::StaffUser;
