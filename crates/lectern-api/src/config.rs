//! Hub configuration.

use std::time::Instant;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Default port for the hub.
pub const DEFAULT_PORT: u16 = 8740;

/// Which browser origins may drive the hub.
///
/// Displays are usually opened from another host or straight from disk, so
/// the default accepts any origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsPolicy {
    #[default]
    AnyOrigin,
    Origins(Vec<String>),
}

impl CorsPolicy {
    /// Builds a policy from `--cors-origin` values. No values, or a `*`
    /// among them, accepts any origin.
    pub fn from_origins(origins: Vec<String>) -> Self {
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Self::AnyOrigin
        } else {
            Self::Origins(origins)
        }
    }

    pub(crate) fn layer(&self) -> CorsLayer {
        let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        match self {
            Self::AnyOrigin => cors.allow_origin(Any),
            Self::Origins(origins) => {
                let allowed: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| match origin.parse() {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!(origin = %origin, "ignoring invalid CORS origin");
                            None
                        }
                    })
                    .collect();
                cors.allow_origin(AllowOrigin::list(allowed))
            }
        }
    }
}

/// Where the hub listens and who may call it.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsPolicy,
    started: Instant,
}

impl ApiConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            cors: CorsPolicy::default(),
            started: Instant::now(),
        }
    }

    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = cors;
        self
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listens_locally_for_any_origin() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8740");
        assert_eq!(config.cors, CorsPolicy::AnyOrigin);
    }

    #[test]
    fn test_cors_policy_from_origins() {
        assert_eq!(CorsPolicy::from_origins(vec![]), CorsPolicy::AnyOrigin);
        assert_eq!(
            CorsPolicy::from_origins(vec!["http://a.test".to_string(), "*".to_string()]),
            CorsPolicy::AnyOrigin
        );
        assert_eq!(
            CorsPolicy::from_origins(vec!["http://a.test".to_string()]),
            CorsPolicy::Origins(vec!["http://a.test".to_string()])
        );
    }
}
