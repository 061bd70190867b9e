//! Connectivity watchdog: retries the health check until the backend is back,
//! then returns the user to the route they came from.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::health::HealthCheck;
use crate::navigator::{self, Navigator};

/// Lifecycle state of a watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogStatus {
    Idle,
    Retrying,
    Succeeded,
    Stopped,
}

impl fmt::Display for WatchdogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchdogStatus::Idle => write!(f, "Idle"),
            WatchdogStatus::Retrying => write!(f, "Retrying"),
            WatchdogStatus::Succeeded => write!(f, "Succeeded"),
            WatchdogStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Point-in-time view for display ("Retry attempt N")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogSnapshot {
    pub status: WatchdogStatus,
    pub attempt_count: u64,
    pub target_route: String,
}

/// Timing and routing parameters
#[derive(Debug, Clone)]
pub struct WatchdogSettings {
    pub interval: Duration,
    pub check_timeout: Duration,
    /// Route of the view hosting the watchdog
    pub hosting_route: String,
    pub fallback_route: String,
    pub warn_after_failures: u64,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            check_timeout: Duration::from_secs(10),
            hosting_route: "/error".to_string(),
            fallback_route: "/".to_string(),
            warn_after_failures: 5,
        }
    }
}

impl From<&Config> for WatchdogSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.watchdog.interval,
            check_timeout: config.health.timeout,
            hosting_route: config.watchdog.error_route.clone(),
            fallback_route: config.watchdog.fallback_route.clone(),
            warn_after_failures: config.watchdog.warn_after_failures,
        }
    }
}

#[derive(Debug)]
struct WatchdogState {
    status: WatchdogStatus,
    attempt_count: u64,
    /// Cancels the polling task of the current run
    run: Option<CancellationToken>,
}

#[derive(Debug)]
struct Inner {
    health: Arc<dyn HealthCheck>,
    navigator: Arc<dyn Navigator>,
    settings: WatchdogSettings,
    target_route: String,
    state: RwLock<WatchdogState>,
    /// Cancelled when the hosting view goes away; every run token is a child of it
    scope: CancellationToken,
    finished: watch::Sender<bool>,
}

/// Watches backend reachability on behalf of the error view.
///
/// Dropping the watchdog unmounts it: any pending tick is cancelled and a
/// check still in flight is discarded.
#[derive(Debug)]
pub struct Watchdog {
    inner: Arc<Inner>,
}

impl Watchdog {
    /// Create an idle watchdog. The target route is captured here, once.
    pub fn new(
        health: Arc<dyn HealthCheck>,
        navigator: Arc<dyn Navigator>,
        settings: WatchdogSettings,
        redirect: Option<&str>,
    ) -> Self {
        let target_route = navigator::capture_target_route(redirect, &settings.fallback_route);
        tracing::debug!(
            "Created watchdog for {} (interval {:?}, timeout {:?})",
            target_route,
            settings.interval,
            settings.check_timeout
        );
        let (finished, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                health,
                navigator,
                settings,
                target_route,
                state: RwLock::new(WatchdogState {
                    status: WatchdogStatus::Idle,
                    attempt_count: 0,
                    run: None,
                }),
                scope: CancellationToken::new(),
                finished,
            }),
        }
    }

    /// Create a watchdog and start it right away, as the error view does on mount
    pub async fn mount(
        health: Arc<dyn HealthCheck>,
        navigator: Arc<dyn Navigator>,
        settings: WatchdogSettings,
        redirect: Option<&str>,
    ) -> Self {
        let watchdog = Self::new(health, navigator, settings, redirect);
        watchdog.start().await;
        watchdog
    }

    /// Begin retrying. No-op while already retrying, after success, or after unmount.
    pub async fn start(&self) {
        let mut state = self.inner.state.write().await;

        if self.inner.scope.is_cancelled() {
            tracing::debug!("Ignoring start on an unmounted watchdog");
            return;
        }

        match state.status {
            WatchdogStatus::Retrying | WatchdogStatus::Succeeded => {
                tracing::debug!("Ignoring start while {}", state.status);
                return;
            }
            WatchdogStatus::Idle | WatchdogStatus::Stopped => {}
        }

        let cancel = self.inner.scope.child_token();
        state.run = Some(cancel.clone());
        self.inner.transition(&mut state, WatchdogStatus::Retrying);
        drop(state);

        tokio::spawn(retry_loop(Arc::clone(&self.inner), cancel));
    }

    /// Cancel the pending tick. No-op unless retrying.
    pub async fn stop(&self) {
        let mut state = self.inner.state.write().await;
        if state.status != WatchdogStatus::Retrying {
            tracing::debug!("Ignoring stop while {}", state.status);
            return;
        }

        if let Some(run) = state.run.take() {
            run.cancel();
        }
        self.inner.transition(&mut state, WatchdogStatus::Stopped);
    }

    /// Tear down the watchdog's scope. Safe to call more than once.
    pub fn unmount(&self) {
        if !self.inner.scope.is_cancelled() {
            tracing::debug!("Unmounting watchdog for {}", self.inner.target_route);
            self.inner.scope.cancel();
        }
    }

    pub async fn status(&self) -> WatchdogStatus {
        self.inner.state.read().await.status
    }

    pub async fn attempt_count(&self) -> u64 {
        self.inner.state.read().await.attempt_count
    }

    pub fn target_route(&self) -> &str {
        &self.inner.target_route
    }

    pub async fn snapshot(&self) -> WatchdogSnapshot {
        let state = self.inner.state.read().await;
        WatchdogSnapshot {
            status: state.status,
            attempt_count: state.attempt_count,
            target_route: self.inner.target_route.clone(),
        }
    }

    /// Resolve once the backend was reached and navigation has been handed off
    pub async fn wait_for_success(&self) {
        let mut finished = self.inner.finished.subscribe();
        // The sender lives in `inner`, which we hold, so this only ends on `true`.
        let _ = finished.wait_for(|done| *done).await;
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// What the polling task does after recording an attempt
enum Next {
    Retry,
    Finish,
}

impl Inner {
    fn transition(&self, state: &mut WatchdogState, next: WatchdogStatus) {
        tracing::debug!("Watchdog {} -> {}", state.status, next);
        state.status = next;
    }

    async fn record_attempt(&self, cancel: &CancellationToken, reachable: bool) -> Next {
        let mut state = self.state.write().await;

        // stop() cancels under this lock, so a superseded run never gets past here.
        if cancel.is_cancelled() || state.status != WatchdogStatus::Retrying {
            tracing::debug!("Discarding health check result from a cancelled run");
            return Next::Finish;
        }

        state.attempt_count += 1;
        let attempt = state.attempt_count;

        if !reachable {
            tracing::debug!("Retry attempt {}: backend unreachable", attempt);
            if attempt == self.settings.warn_after_failures {
                tracing::warn!(
                    "Backend still unreachable after {} attempts, continuing to retry",
                    attempt
                );
            }
            return Next::Retry;
        }

        state.run = None;
        self.transition(&mut state, WatchdogStatus::Succeeded);
        drop(state);
        cancel.cancel();

        tracing::info!("Backend reachable after {} attempts", attempt);
        self.navigate().await;
        self.finished.send_replace(true);
        Next::Finish
    }

    async fn navigate(&self) {
        if self.scope.is_cancelled() {
            tracing::debug!("Watchdog unmounted before navigation, skipping");
            return;
        }

        let route = navigator::destination(
            &self.target_route,
            &self.settings.hosting_route,
            &self.settings.fallback_route,
        );
        if let Err(e) = self.navigator.navigate_to(route).await {
            tracing::warn!("Navigation to {} failed: {}", route, e);
        }
    }
}

async fn retry_loop(inner: Arc<Inner>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(inner.settings.interval) => {}
            _ = cancel.cancelled() => {
                tracing::debug!("Retry loop cancelled while waiting");
                return;
            }
        }

        // The next sleep is only armed after this check settles, so checks never overlap.
        let reachable = tokio::select! {
            result = tokio::time::timeout(inner.settings.check_timeout, inner.health.check_reachable()) => {
                match result {
                    Ok(reachable) => reachable,
                    Err(_) => {
                        tracing::debug!(
                            "Health check timed out after {:?}",
                            inner.settings.check_timeout
                        );
                        false
                    }
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!("Retry loop cancelled with a health check in flight");
                return;
            }
        };

        match inner.record_attempt(&cancel, reachable).await {
            Next::Retry => continue,
            Next::Finish => return,
        }
    }
}
