//! BDD step definitions for the watchdog feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use watchdog::{Watchdog, WatchdogSettings, WatchdogStatus};

use crate::world::{ScriptedHealth, WatchdogWorld};

fn parse_status(status: &str) -> WatchdogStatus {
    match status {
        "Idle" => WatchdogStatus::Idle,
        "Retrying" => WatchdogStatus::Retrying,
        "Succeeded" => WatchdogStatus::Succeeded,
        "Stopped" => WatchdogStatus::Stopped,
        other => panic!("Unknown status: {}", other),
    }
}

fn mounted(world: &WatchdogWorld) -> &Watchdog {
    world.watchdog.as_ref().expect("watchdog not mounted")
}

#[given("a backend that is reachable")]
fn backend_reachable(world: &mut WatchdogWorld) {
    world.health = Some(Arc::new(ScriptedHealth {
        otherwise: true,
        ..Default::default()
    }));
}

#[given("a backend that never recovers")]
fn backend_never_recovers(world: &mut WatchdogWorld) {
    world.health = Some(Arc::new(ScriptedHealth::default()));
}

#[given(expr = "a backend that fails {int} health checks and then recovers")]
fn backend_recovers_after(world: &mut WatchdogWorld, failures: usize) {
    let health = ScriptedHealth {
        otherwise: true,
        ..Default::default()
    };
    health.answers.lock().unwrap().extend(vec![false; failures]);
    world.health = Some(Arc::new(health));
}

#[given(expr = "a reachable backend that takes {int} milliseconds to answer")]
fn backend_slow(world: &mut WatchdogWorld, millis: u64) {
    world.health = Some(Arc::new(ScriptedHealth {
        otherwise: true,
        delay: Duration::from_millis(millis),
        ..Default::default()
    }));
}

#[given(expr = "the user arrived from {string}")]
fn user_arrived_from(world: &mut WatchdogWorld, route: String) {
    world.redirect = Some(route);
}

#[when("the error page mounts the watchdog")]
async fn mount_watchdog(world: &mut WatchdogWorld) {
    let health = world.health.clone().expect("no backend configured");
    let watchdog = Watchdog::mount(
        health,
        world.navigator.clone(),
        WatchdogSettings::default(),
        world.redirect.as_deref(),
    )
    .await;
    world.watchdog = Some(watchdog);
}

#[when(expr = "{int} milliseconds pass")]
async fn time_passes(_world: &mut WatchdogWorld, millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

#[when("the user stops the watchdog")]
async fn user_stops(world: &mut WatchdogWorld) {
    mounted(world).stop().await;
}

#[when("the user starts the watchdog")]
async fn user_starts(world: &mut WatchdogWorld) {
    mounted(world).start().await;
}

#[when("the error page unmounts")]
fn page_unmounts(world: &mut WatchdogWorld) {
    drop(world.watchdog.take());
}

#[then(expr = "the watchdog status should be {string}")]
async fn status_should_be(world: &mut WatchdogWorld, expected: String) {
    assert_eq!(mounted(world).status().await, parse_status(&expected));
}

#[then(expr = "the attempt count should be {int}")]
async fn attempt_count_should_be(world: &mut WatchdogWorld, expected: u64) {
    assert_eq!(mounted(world).attempt_count().await, expected);
}

#[then(expr = "the backend should have been checked {int} time(s)")]
fn backend_checked(world: &mut WatchdogWorld, expected: u32) {
    let health = world.health.as_ref().expect("no backend configured");
    assert_eq!(health.calls(), expected);
}

#[then(expr = "the user should have been sent to {string} exactly once")]
fn sent_once(world: &mut WatchdogWorld, route: String) {
    let routes = world.navigator.routes.lock().unwrap().clone();
    assert_eq!(routes, vec![route]);
}

#[then("no navigation should have happened")]
fn no_navigation(world: &mut WatchdogWorld) {
    assert!(world.navigator.routes.lock().unwrap().is_empty());
}
