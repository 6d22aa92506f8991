//! Business logic services for admin.
//!
//! - `auth` - password sign-in restricted to admin accounts
//! - `email` - newsletter campaign delivery via SMTP
//! - `seo` - SEO report over crystals and blog posts
//! - `stats` - dashboard headline numbers

pub mod auth;
pub mod email;
pub mod seo;
pub mod stats;

pub use auth::{AdminAuthService, AuthError};
pub use email::{CampaignDelivery, EmailError, EmailService};
pub use stats::DashboardStats;
