//! Navigation back to the user's original route

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::NavigationConfig;
use crate::io::HttpClient;

/// Capability provided by the hosting application's router
#[async_trait]
pub trait Navigator: Send + Sync + std::fmt::Debug {
    async fn navigate_to(&self, route: &str) -> crate::Result<()>;
}

/// Capture the route to return to from the incoming redirect parameter.
///
/// Only in-app absolute routes are accepted; anything else (missing, empty,
/// external URLs, protocol-relative `//host` or `/\host` paths, control
/// characters) falls back.
pub fn capture_target_route(redirect: Option<&str>, fallback: &str) -> String {
    match redirect.map(str::trim) {
        Some(route) if is_in_app_route(route) => route.to_string(),
        _ => fallback.to_string(),
    }
}

// URL parsers treat `\` like `/`, so `/\host` is protocol-relative too.
fn is_in_app_route(route: &str) -> bool {
    let mut chars = route.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !route.chars().any(char::is_control)
}

/// Pick the route to navigate to once the backend is back.
///
/// Returning to the hosting error route would re-mount the watchdog, so that
/// case goes to the fallback instead.
pub fn destination<'a>(target: &'a str, hosting_route: &str, fallback: &'a str) -> &'a str {
    if route_path(target) == route_path(hosting_route) {
        fallback
    } else {
        target
    }
}

fn route_path(route: &str) -> &str {
    let path = route.split(['?', '#']).next().unwrap_or(route);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Navigator that reports the route for a host without a router of its own
#[derive(Debug, Default)]
pub struct LogNavigator;

#[async_trait]
impl Navigator for LogNavigator {
    async fn navigate_to(&self, route: &str) -> crate::Result<()> {
        tracing::info!("Backend reachable again, navigating to {}", route);
        println!("{}", route);
        Ok(())
    }
}

#[derive(Serialize)]
struct NavigateRequest<'a> {
    route: &'a str,
}

/// Navigator that hands the route to the hosting application over HTTP
pub struct WebhookNavigator {
    url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for WebhookNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNavigator")
            .field("url", &self.url)
            .finish()
    }
}

impl WebhookNavigator {
    pub fn new(url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }
}

#[async_trait]
impl Navigator for WebhookNavigator {
    async fn navigate_to(&self, route: &str) -> crate::Result<()> {
        let body = serde_json::to_string(&NavigateRequest { route })?;
        tracing::debug!("Posting navigation to {} via {}", route, self.url);

        let response = self.http.post_json(&self.url, &[], &body).await?;
        if !response.is_success() {
            return Err(crate::WatchdogError::Navigation(format!(
                "Host returned status {}: {}",
                response.status, response.body
            )));
        }
        Ok(())
    }
}

/// Build the configured navigator
pub fn from_config(config: &NavigationConfig, http: Arc<dyn HttpClient>) -> Arc<dyn Navigator> {
    match config {
        NavigationConfig::Log => Arc::new(LogNavigator),
        NavigationConfig::Webhook { url } => Arc::new(WebhookNavigator::new(url.clone(), http)),
    }
}
