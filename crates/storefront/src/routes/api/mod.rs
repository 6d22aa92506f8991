//! JSON API handlers.
//!
//! Catalog and recommendation endpoints are public; `/api/user/*` requires
//! a signed-in customer and answers 401 otherwise.

pub mod catalog;
pub mod user;
