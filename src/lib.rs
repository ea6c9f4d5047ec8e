//! Request gating for the workflow search service.
//!
//! Filename validation, per-client rate limiting, the CORS allow-list and
//! storage bootstrap, plus the HTTP host that wires them together.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::filename::validate as validate_filename;
pub use security::SlidingWindowLimiter;
