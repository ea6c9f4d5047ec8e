//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → security::rate_limit (429 when over budget)
//!     → workflows.rs (filename check, then file read)
//!     → Send to client
//! ```

pub mod server;
pub mod workflows;

pub use server::{AppState, HttpServer};
