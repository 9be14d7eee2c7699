//! Business logic services and upstream API clients.
//!
//! # Services
//!
//! - `auth` - Staff authentication (Argon2id passwords)
//! - `chat` - Shopping assistant prompt and catalog cache
//! - `checkout` - Pricing, card payment and order creation
//!
//! # Clients
//!
//! - `sumup` - `SumUp` payment gateway
//! - `openai` - `OpenAI` chat completions
//! - `resend` - Resend audience contacts

pub mod auth;
pub mod chat;
pub mod checkout;
pub mod openai;
pub mod resend;
pub mod sumup;
