//! Periodic re-check of the session, published on a watch channel.
//!
//! Optional: the gateway's 401 handling is what actually ends a session.
//! The monitor only lets a long-lived view notice a token that expired or
//! was cleared by another process sharing the same storage.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{AuthState, SessionStore};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub struct AuthMonitor {
    session: Arc<SessionStore>,
    interval: Duration,
    tx: watch::Sender<AuthState>,
}

impl AuthMonitor {
    pub fn new(session: Arc<SessionStore>) -> Self {
        let (tx, _rx) = watch::channel(session.auth_state());
        Self {
            session,
            interval: DEFAULT_POLL_INTERVAL,
            tx,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    /// Re-read the session; receivers are only woken on a transition.
    pub fn check(&self) -> AuthState {
        let state = self.session.auth_state();
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        if changed {
            tracing::info!(?state, "Session state changed");
        }
        state
    }

    /// Poll until every receiver is gone. Subscribe before spawning.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.check();
                if self.tx.is_closed() {
                    tracing::debug!("No session watchers left, stopping monitor");
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserData;
    use crate::session::TokenData;

    fn sign_in(session: &SessionStore) {
        session.set_credential(&TokenData::new("abc"));
        session.set_user(&UserData {
            email: Some("ada@example.com".into()),
            ..UserData::default()
        });
    }

    fn signed_in() -> Arc<SessionStore> {
        let session = Arc::new(SessionStore::in_memory());
        sign_in(&session);
        session
    }

    #[test]
    fn check_only_notifies_on_transition() {
        let session = signed_in();
        let monitor = AuthMonitor::new(session.clone());
        let mut rx = monitor.subscribe();
        assert_eq!(*rx.borrow_and_update(), AuthState::Authenticated);

        assert_eq!(monitor.check(), AuthState::Authenticated);
        assert!(!rx.has_changed().unwrap());

        session.clear_all();
        assert_eq!(monitor.check(), AuthState::Anonymous);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::Anonymous);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_picks_up_cleared_session_within_interval() {
        let session = signed_in();
        let monitor = AuthMonitor::new(session.clone());
        let mut rx = monitor.subscribe();
        let handle = monitor.spawn();

        let started = tokio::time::Instant::now();
        session.clear_all();
        rx.changed().await.unwrap();

        assert_eq!(*rx.borrow(), AuthState::Anonymous);
        assert!(started.elapsed() <= DEFAULT_POLL_INTERVAL);

        drop(rx);
        tokio::time::timeout(Duration::from_secs(300), handle)
            .await
            .expect("monitor should stop once receivers are dropped")
            .unwrap();
    }

    #[test]
    fn check_sees_logout_from_another_process() {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(SessionStore::open_dir(dir.path()).unwrap());
        sign_in(&session);
        let monitor = AuthMonitor::new(session);
        let mut rx = monitor.subscribe();
        assert_eq!(*rx.borrow_and_update(), AuthState::Authenticated);

        let other = SessionStore::open_dir(dir.path()).unwrap();
        assert!(other.is_authenticated());
        other.clear_all();

        assert_eq!(monitor.check(), AuthState::Anonymous);
        assert!(rx.has_changed().unwrap());

        sign_in(&other);
        assert_eq!(monitor.check(), AuthState::Authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_picks_up_file_cleared_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(SessionStore::open_dir(dir.path()).unwrap());
        sign_in(&session);
        let monitor = AuthMonitor::new(session);
        let mut rx = monitor.subscribe();
        let handle = monitor.spawn();

        let started = tokio::time::Instant::now();
        SessionStore::open_dir(dir.path()).unwrap().clear_all();
        rx.changed().await.unwrap();

        assert_eq!(*rx.borrow(), AuthState::Anonymous);
        assert!(started.elapsed() <= DEFAULT_POLL_INTERVAL);

        drop(rx);
        tokio::time::timeout(Duration::from_secs(300), handle)
            .await
            .expect("monitor should stop once receivers are dropped")
            .unwrap();
    }
}
