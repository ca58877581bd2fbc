//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. CORS for the admin SPA origin
//! 4. Session layer (tower-sessions, `admin.session` table)
//! 5. Security headers
//! 6. Admin guard (the [`RequireAdmin`] extractor on protected handlers)

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdmin, clear_current_admin, set_current_admin};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
