//! BDD test world for the watchdog service

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cucumber::World;
use watchdog::api::NotificationApi;
use watchdog::health::HealthCheck;
use watchdog::navigator::Navigator;
use watchdog::session::{Notification, SessionContext};
use watchdog::Watchdog;

/// A health check that replays scripted answers
#[derive(Debug, Default)]
pub struct ScriptedHealth {
    pub answers: Mutex<VecDeque<bool>>,
    pub otherwise: bool,
    pub delay: Duration,
    pub calls: AtomicU32,
}

impl ScriptedHealth {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HealthCheck for ScriptedHealth {
    async fn check_reachable(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.otherwise)
    }
}

/// A navigator that records every route it is asked to open
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate_to(&self, route: &str) -> watchdog::Result<()> {
        self.routes.lock().unwrap().push(route.to_string());
        Ok(())
    }
}

/// Notification endpoint that either accepts or rejects every update
#[derive(Debug, Default)]
pub struct StubNotificationApi {
    pub reject: bool,
    pub requests: AtomicU32,
}

#[async_trait::async_trait]
impl NotificationApi for StubNotificationApi {
    async fn fetch_notifications(&self, _token: &str) -> watchdog::Result<Vec<Notification>> {
        Ok(Vec::new())
    }

    async fn mark_read(&self, _token: &str, _id: &str) -> watchdog::Result<()> {
        self.respond()
    }

    async fn mark_all_read(&self, _token: &str) -> watchdog::Result<()> {
        self.respond()
    }
}

impl StubNotificationApi {
    fn respond(&self) -> watchdog::Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            Err(watchdog::WatchdogError::Api("Internal server error".to_string()))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default, World)]
pub struct WatchdogWorld {
    // Watchdog testing
    pub health: Option<Arc<ScriptedHealth>>,
    pub navigator: Arc<RecordingNavigator>,
    pub redirect: Option<String>,
    pub watchdog: Option<Watchdog>,

    // Session testing
    pub session: Option<SessionContext>,
    pub api: Arc<StubNotificationApi>,
    pub last_error: Option<String>,
}
