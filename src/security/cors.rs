//! Cross-origin allow-list.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use url::Url;

use crate::config::CorsConfig;

/// Origins allowed out of the box: the local dev frontends and the service itself.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
];

/// Why an origin entry is unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OriginError {
    #[error("wildcard origin is not allowed")]
    Wildcard,
    #[error("origin '{0}' is not a valid URL")]
    Malformed(String),
    #[error("origin '{0}' must use http or https")]
    Scheme(String),
    #[error("origin '{0}' must not carry a path, query or fragment")]
    NotAnOrigin(String),
}

/// Checks a single allow-list entry.
pub fn check_origin(origin: &str) -> Result<(), OriginError> {
    if origin.trim() == "*" {
        return Err(OriginError::Wildcard);
    }
    if !(origin.starts_with("http://") || origin.starts_with("https://")) {
        return Err(OriginError::Scheme(origin.to_string()));
    }
    let url = Url::parse(origin).map_err(|_| OriginError::Malformed(origin.to_string()))?;
    if url.host_str().is_none() {
        return Err(OriginError::Malformed(origin.to_string()));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() || origin.ends_with('/') {
        return Err(OriginError::NotAnOrigin(origin.to_string()));
    }
    Ok(())
}

/// Checks every entry, collecting all failures.
pub fn validate_origins<S: AsRef<str>>(origins: &[S]) -> Result<(), Vec<OriginError>> {
    let errors: Vec<OriginError> = origins
        .iter()
        .filter_map(|origin| check_origin(origin.as_ref()).err())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Immutable set of allowed origins, fixed at startup.
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Vec<String>,
}

impl AllowedOrigins {
    pub fn new(origins: Vec<String>) -> Result<Self, Vec<OriginError>> {
        validate_origins(&origins)?;
        Ok(Self { origins })
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        Self {
            origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Builds the CORS layer for the configured allow-list.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Skipping unusable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age_secs))
}
