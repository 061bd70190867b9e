//! Session context: the signed-in user, their token, and notification read-state
//!
//! The context is constructed explicitly and passed by reference to whatever
//! needs it. `begin` starts a session at login and `end` tears it down at
//! logout; both are reflected in the persisted snapshot file so a restarted
//! client picks up where it left off.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::api::NotificationApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Resident,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Persisted form of the context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

#[derive(Debug)]
pub struct SessionContext {
    path: Option<PathBuf>,
    data: RwLock<SessionSnapshot>,
}

impl SessionContext {
    /// Context that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(SessionSnapshot::default()),
        }
    }

    /// Load the persisted context at `path`, or start empty if there is none yet
    pub fn open(path: &Path) -> crate::Result<Self> {
        let snapshot = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                crate::WatchdogError::Session(format!(
                    "Failed to read session file {:?}: {}",
                    path, e
                ))
            })?;
            serde_json::from_str(&content).map_err(|e| {
                crate::WatchdogError::Session(format!(
                    "Corrupt session file {:?}: {}",
                    path, e
                ))
            })?
        } else {
            SessionSnapshot::default()
        };

        tracing::debug!(
            "Opened session context at {:?} (signed in: {})",
            path,
            snapshot.session.is_some()
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            data: RwLock::new(snapshot),
        })
    }

    /// Start a session after login, discarding anything left from a previous one
    pub async fn begin(&self, session: Session) -> crate::Result<()> {
        let mut data = self.data.write().await;
        let email = session.user.email.clone();
        let next = SessionSnapshot {
            session: Some(session),
            notifications: Vec::new(),
        };
        self.persist(&next)?;
        *data = next;
        tracing::info!("Session started for {}", email);
        Ok(())
    }

    /// Tear down the session at logout, in memory and on disk
    pub async fn end(&self) -> crate::Result<()> {
        let mut data = self.data.write().await;
        if let Some(session) = data.session.take() {
            tracing::info!("Session ended for {}", session.user.email);
        }
        data.notifications.clear();

        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.data.read().await.session.is_some()
    }

    pub async fn user(&self) -> Option<SessionUser> {
        self.data
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub async fn is_admin(&self) -> bool {
        self.data
            .read()
            .await
            .session
            .as_ref()
            .is_some_and(|s| s.user.role == Role::Admin)
    }

    pub async fn token(&self) -> Option<String> {
        self.data
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.data.read().await.notifications.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.data
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| !n.read)
            .count()
    }

    /// Replace local notifications with the server's list
    pub async fn refresh_notifications(&self, api: &dyn NotificationApi) -> crate::Result<usize> {
        let token = self.require_token().await?;
        let notifications = api.fetch_notifications(&token).await?;

        let mut data = self.data.write().await;
        let count = notifications.len();
        self.commit(&mut data, notifications)?;
        Ok(count)
    }

    /// Mark one notification read.
    ///
    /// The local flag flips before the request is sent; if the server rejects
    /// it, the notifications are restored to the state they had before.
    pub async fn mark_read(&self, api: &dyn NotificationApi, id: &str) -> crate::Result<()> {
        let token = self.require_token().await?;

        let previous = {
            let mut data = self.data.write().await;
            let mut updated = data.notifications.clone();
            let notification = updated.iter_mut().find(|n| n.id == id).ok_or_else(|| {
                crate::WatchdogError::Session(format!("Unknown notification '{}'", id))
            })?;
            if notification.read {
                return Ok(());
            }
            notification.read = true;
            self.commit(&mut data, updated)?
        };

        if let Err(e) = api.mark_read(&token, id).await {
            tracing::warn!("Marking notification '{}' read failed, rolling back: {}", id, e);
            self.restore(previous).await;
            return Err(e);
        }
        Ok(())
    }

    /// Mark every notification read, with the same rollback as `mark_read`
    pub async fn mark_all_read(&self, api: &dyn NotificationApi) -> crate::Result<()> {
        let token = self.require_token().await?;

        let previous = {
            let mut data = self.data.write().await;
            if data.notifications.iter().all(|n| n.read) {
                return Ok(());
            }
            let mut updated = data.notifications.clone();
            for notification in &mut updated {
                notification.read = true;
            }
            self.commit(&mut data, updated)?
        };

        if let Err(e) = api.mark_all_read(&token).await {
            tracing::warn!("Marking all notifications read failed, rolling back: {}", e);
            self.restore(previous).await;
            return Err(e);
        }
        Ok(())
    }

    /// Put back the notifications from before a rejected update. Memory is
    /// always restored; a failed write is only logged.
    async fn restore(&self, previous: Vec<Notification>) {
        let mut data = self.data.write().await;
        data.notifications = previous;
        if let Err(e) = self.persist(&data) {
            tracing::warn!("Rolled back notifications could not be saved: {}", e);
        }
    }

    /// Write `notifications` through to disk, then swap them in. Memory is left
    /// untouched when the write fails. Returns the list that was replaced.
    fn commit(
        &self,
        data: &mut SessionSnapshot,
        notifications: Vec<Notification>,
    ) -> crate::Result<Vec<Notification>> {
        let next = SessionSnapshot {
            session: data.session.clone(),
            notifications,
        };
        self.persist(&next)?;
        Ok(std::mem::replace(&mut data.notifications, next.notifications))
    }

    async fn require_token(&self) -> crate::Result<String> {
        self.token()
            .await
            .ok_or_else(|| crate::WatchdogError::Session("Not signed in".to_string()))
    }

    fn persist(&self, snapshot: &SessionSnapshot) -> crate::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(path, content).map_err(|e| {
            crate::WatchdogError::Session(format!("Failed to write session file {:?}: {}", path, e))
        })
    }
}
