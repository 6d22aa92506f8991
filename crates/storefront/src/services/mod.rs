//! Business logic services for the storefront.
//!
//! - `auth` - Email and password accounts
//! - `email` - Order confirmations and newsletter mail
//! - `fulfillment` - Stripe webhook event processing

pub mod auth;
pub mod email;
pub mod fulfillment;
