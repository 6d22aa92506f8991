//! Core types for Moonstone.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod slug;
pub mod status;
pub mod zodiac;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use slug::{is_valid_slug, slugify};
pub use status::*;
pub use zodiac::{Element, ZodiacSign};
