//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, tag requests)
//! 2. `TraceLayer` (request tracing)
//! 3. Rate limiting (governor; strict on auth, relaxed on anonymous
//!    lookup/catalog endpoints)
//!
//! Authentication is an extractor (`RequireAuth`), not a layer: handlers
//! that need a caller declare it in their signature.

pub mod auth;
pub mod rate_limit;

pub use auth::{CurrentUser, RequireAuth};
pub use rate_limit::{anon_rate_limiter, auth_rate_limiter};
