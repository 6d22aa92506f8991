//! Moonstone Core - Shared domain types.
//!
//! This crate provides the types shared by every Moonstone component:
//! - `storefront` - Public crystal shop, checkout and Stripe webhook
//! - `admin` - Internal dashboards (orders, customers, inventory, campaigns, SEO)
//! - `cli` - Migrations, seeding and offline content generation
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no database access,
//! no HTTP clients. Password hashing lives here because both binaries need it
//! and it is CPU-only. [`env`] reads process environment variables for the
//! binaries' configuration.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money, emails, statuses, zodiac signs and slugs
//! - [`password`] - Argon2 password hashing and policy
//! - [`env`] - Environment lookups, secret checks, SMTP and telemetry settings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod env;
pub mod password;
pub mod types;

pub use types::*;
