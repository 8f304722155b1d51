//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions over files, holds the client id)

pub mod client;
pub mod request_id;
pub mod session;

pub use client::{CartClient, OptionalCartClient};
pub use request_id::{
    make_request_span, propagate_request_id_layer, request_id_middleware, set_request_id_layer,
};
pub use session::{FileSessionStore, create_session_layer};
