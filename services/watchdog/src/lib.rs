//! Watchdog - connectivity watchdog for the civic issue-reporting platform
//!
//! Polls the platform's health endpoint while the backend is unreachable and
//! returns the user to the route they came from once it answers again. Also
//! carries the client-side session context used by the notification commands.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod health;
pub mod io;
pub mod navigator;
pub mod session;
pub mod watchdog;

pub use config::{load_config, Config};
pub use error::{Result, WatchdogError};
pub use watchdog::{Watchdog, WatchdogSettings, WatchdogSnapshot, WatchdogStatus};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::health::HttpHealthCheck;
use crate::io::{HttpClient, ReqwestHttpClient};

/// Run the watchdog service until the backend is reachable again or shutdown is requested
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(config.health.timeout)?);
    let health = Arc::new(HttpHealthCheck::new(
        config.health.url.clone(),
        Arc::clone(&http),
    ));
    let navigator = navigator::from_config(&config.navigation, Arc::clone(&http));
    let cancel = CancellationToken::new();

    let watchdog = Arc::new(
        Watchdog::mount(
            health,
            navigator,
            WatchdogSettings::from(&config),
            config.watchdog.redirect.as_deref(),
        )
        .await,
    );

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                cancel_for_signal.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
    });

    // Start dashboard if enabled
    let dashboard = if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_watchdog = Arc::clone(&watchdog);
        let cancel_for_dashboard = cancel.clone();

        Some(tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_watchdog);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };
            tracing::info!("Dashboard listening on http://{}", addr);

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        }))
    } else {
        None
    };

    tracing::info!(
        "Watching {} every {:?}, will return to {}",
        config.health.url,
        config.watchdog.interval,
        watchdog.target_route()
    );

    tokio::select! {
        _ = watchdog.wait_for_success() => {
            tracing::info!("Backend is reachable again");
        }
        _ = cancel.cancelled() => {
            tracing::info!(
                "Stopping after {} attempts",
                watchdog.attempt_count().await
            );
        }
    }

    watchdog.unmount();
    cancel.cancel();
    if let Some(handle) = dashboard {
        let _ = handle.await;
    }
    tracing::info!("Watchdog stopped");

    Ok(())
}
