//! Notification endpoints of the platform REST API

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope;
use crate::io::{HttpClient, HttpResponse};
use crate::session::Notification;

/// Server side of the notification read-state
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait NotificationApi: Send + Sync {
    async fn fetch_notifications(&self, token: &str) -> crate::Result<Vec<Notification>>;

    async fn mark_read(&self, token: &str, id: &str) -> crate::Result<()>;

    async fn mark_all_read(&self, token: &str) -> crate::Result<()>;
}

/// REST client for the notification endpoints
pub struct HttpNotificationApi {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpNotificationApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNotificationApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpNotificationApi {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn segments_url(&self, segments: &[&str]) -> crate::Result<String> {
        let invalid = || {
            crate::WatchdogError::Config(format!("Invalid API base URL {}", self.base_url))
        };
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Unwrap an envelope. A non-2xx status without an envelope is an API error;
/// an empty 2xx body carries no payload.
fn decode<T>(response: HttpResponse) -> crate::Result<Option<T>>
where
    T: for<'de> serde::Deserialize<'de>,
{
    if response.is_success() && response.body.trim().is_empty() {
        return Ok(None);
    }
    match envelope::parse::<T>(&response.body) {
        Ok(env) => env.into_result(),
        Err(_) if !response.is_success() => Err(crate::WatchdogError::Api(format!(
            "status {}: {}",
            response.status, response.body
        ))),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn fetch_notifications(&self, token: &str) -> crate::Result<Vec<Notification>> {
        let auth = bearer(token);
        let response = self
            .http
            .get(&self.url("/notifications"), &[("Authorization", auth.as_str())])
            .await?;
        let notifications = decode::<Vec<Notification>>(response)?.unwrap_or_default();
        tracing::debug!("Fetched {} notifications", notifications.len());
        Ok(notifications)
    }

    async fn mark_read(&self, token: &str, id: &str) -> crate::Result<()> {
        let auth = bearer(token);
        let url = self.segments_url(&["notifications", id, "read"])?;
        let response = self
            .http
            .put_json(
                &url,
                &[("Authorization", auth.as_str())],
                "{}",
            )
            .await?;
        decode::<serde_json::Value>(response)?;
        Ok(())
    }

    async fn mark_all_read(&self, token: &str) -> crate::Result<()> {
        let auth = bearer(token);
        let response = self
            .http
            .put_json(
                &self.url("/notifications/read-all"),
                &[("Authorization", auth.as_str())],
                "{}",
            )
            .await?;
        decode::<serde_json::Value>(response)?;
        Ok(())
    }
}
