//! Backend liveness check

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope;
use crate::io::HttpClient;

/// Reports whether the backend service can currently be reached
#[async_trait]
pub trait HealthCheck: Send + Sync + std::fmt::Debug {
    /// Perform one check. Failures of any kind are reported as `false`, never as errors.
    async fn check_reachable(&self) -> bool;
}

/// Health check against the platform's liveness endpoint
pub struct HttpHealthCheck {
    url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpHealthCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHealthCheck")
            .field("url", &self.url)
            .finish()
    }
}

impl HttpHealthCheck {
    pub fn new(url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let url = url.into();
        tracing::debug!("Created HttpHealthCheck for {}", url);
        Self { url, http }
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn check_reachable(&self) -> bool {
        match self.http.get(&self.url, &[]).await {
            Ok(response) => {
                if !response.is_success() {
                    tracing::debug!("Health check {} returned {}", self.url, response.status);
                    return false;
                }
                // Plain-text ping bodies count as reachable; envelopes must say so.
                match envelope::success_flag(&response.body) {
                    Some(false) => {
                        tracing::debug!("Health check {} reported success=false", self.url);
                        false
                    }
                    _ => true,
                }
            }
            Err(e) => {
                tracing::debug!("Health check {} failed: {}", self.url, e);
                false
            }
        }
    }
}
