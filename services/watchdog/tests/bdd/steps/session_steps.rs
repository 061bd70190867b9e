//! BDD step definitions for the session feature

use std::sync::Arc;

use cucumber::{given, then, when};
use watchdog::session::{Notification, Role, Session, SessionContext, SessionUser};

use crate::world::{StubNotificationApi, WatchdogWorld};

fn session(world: &WatchdogWorld) -> &SessionContext {
    world.session.as_ref().expect("no session context")
}

#[given(expr = "a resident signed in with {int} unread notification(s)")]
async fn resident_signed_in(world: &mut WatchdogWorld, unread: usize) {
    let ctx = SessionContext::in_memory();
    ctx.begin(Session {
        user: SessionUser {
            id: "u1".to_string(),
            name: "Resident".to_string(),
            email: "resident@example.org".to_string(),
            role: Role::Resident,
        },
        token: "token".to_string(),
    })
    .await
    .expect("begin session");

    let notifications: Vec<Notification> = (1..=unread)
        .map(|i| Notification {
            id: format!("n{}", i),
            message: format!("Update on report {}", i),
            read: false,
            created_at: None,
        })
        .collect();
    // Seed through a fetch so the context owns the list.
    ctx.refresh_notifications(&SeededApi(notifications))
        .await
        .expect("seed notifications");

    world.api = Arc::new(StubNotificationApi::default());
    world.session = Some(ctx);
}

#[given("the server rejects notification updates")]
fn server_rejects(world: &mut WatchdogWorld) {
    world.api = Arc::new(StubNotificationApi {
        reject: true,
        ..Default::default()
    });
}

#[when(expr = "the resident marks notification {string} as read")]
async fn marks_read(world: &mut WatchdogWorld, id: String) {
    let result = session(world).mark_read(world.api.as_ref(), &id).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when("the resident marks all notifications as read")]
async fn marks_all_read(world: &mut WatchdogWorld) {
    let result = session(world).mark_all_read(world.api.as_ref()).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when("the resident logs out")]
async fn logs_out(world: &mut WatchdogWorld) {
    session(world).end().await.expect("end session");
}

#[then(expr = "the resident should have {int} unread notification(s)")]
async fn unread_should_be(world: &mut WatchdogWorld, expected: usize) {
    assert_eq!(session(world).unread_count().await, expected);
}

#[then("the update should have failed")]
fn update_failed(world: &mut WatchdogWorld) {
    assert!(world.last_error.is_some(), "expected the update to fail");
}

#[then("the update should have succeeded")]
fn update_succeeded(world: &mut WatchdogWorld) {
    assert_eq!(world.last_error, None);
}

#[then("nobody should be signed in")]
async fn nobody_signed_in(world: &mut WatchdogWorld) {
    assert!(!session(world).is_authenticated().await);
    assert_eq!(session(world).unread_count().await, 0);
}

/// Serves a fixed notification list
struct SeededApi(Vec<Notification>);

#[async_trait::async_trait]
impl watchdog::api::NotificationApi for SeededApi {
    async fn fetch_notifications(&self, _token: &str) -> watchdog::Result<Vec<Notification>> {
        Ok(self.0.clone())
    }

    async fn mark_read(&self, _token: &str, _id: &str) -> watchdog::Result<()> {
        Ok(())
    }

    async fn mark_all_read(&self, _token: &str) -> watchdog::Result<()> {
        Ok(())
    }
}
