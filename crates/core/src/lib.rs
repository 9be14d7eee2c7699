//! Samara Core - Shared types library.
//!
//! This crate provides common types used across the Samara components:
//! - `storefront` - JSON API behind the public food-delivery site
//! - `cli` - Command-line tools for migrations and staff management
//!
//! # Architecture
//!
//! The core crate contains only types and pure business rules - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`checkout`] - Discount, donation, and payable-total rules for an order

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod types;

pub use types::*;
