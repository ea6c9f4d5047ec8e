//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin allow-list, preflight)
//!     → rate_limit.rs (per-IP look-back window)
//!     → handler
//!         → filename.rs (before any workflow file lookup)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: independent checks, each able to reject alone
//! - Fail closed: anything not positively allowed is rejected
//! - No trust in client input; nothing is decoded before checking

pub mod cors;
pub mod filename;
pub mod rate_limit;

pub use cors::AllowedOrigins;
pub use rate_limit::SlidingWindowLimiter;
