//! HTTP middleware for admin.
//!
//! The stack (outermost first) is Sentry, `TraceLayer`, the session layer,
//! then security headers. Authentication is enforced per handler by the
//! [`RequireAdminAuth`] extractor rather than a blanket layer, so the login
//! page and health checks stay reachable.

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAdminAuth, RequireAdminAuth, clear_current_admin, set_current_admin};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
