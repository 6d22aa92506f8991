//! Storefront-specific models.
//!
//! Persistent domain models live in `moonstone-db`; this module holds what
//! the storefront keeps in the session.

pub mod session;

pub use session::{CurrentUser, session_keys};
