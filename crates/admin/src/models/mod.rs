//! Admin-specific models.
//!
//! Persistent models are shared with the storefront via `moonstone-db`.

pub mod session;

pub use session::{CurrentAdmin, session_keys};
