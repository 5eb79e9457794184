//! Shared slot holding the current session with change notification

use std::sync::{Arc, Mutex};

use parking_shared::{
    time::Timestamp,
    uac::{Account, Role, Session},
};
use tracing::{debug, instrument};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    /// The access token expired or the server stopped accepting it
    Expired,
    RefreshFailed,
    /// The account no longer has any active role
    AccessRevoked,
}

/// Sent to every observer after the slot changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    LoggedIn { expires_at: Timestamp },
    /// Loaded from persistent storage at startup
    Restored { expires_at: Timestamp },
    TokenRefreshed { expires_at: Timestamp },
    RoleChanged(Role),
    ProfileUpdated,
    LoggedOut(LogoutReason),
}

pub trait SessionObserver: Fn(&SessionChange) + Send + Sync + 'static {}
impl<T> SessionObserver for T where T: Fn(&SessionChange) + Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

/// Cloneable handle to the session slot. All clones see the same state
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<Mutex<SessionInner>>,
}

#[derive(Default)]
struct SessionInner {
    session: Option<Arc<Session>>,
    account: Option<Arc<Account>>,
    etag: Option<String>,
    next_observer_id: u64,
    observers: Vec<(ObserverId, Arc<dyn SessionObserver>)>,
}

impl SessionState {
    /// The current session if it is usable. A session without an access
    /// token is reported as absent
    pub fn current(&self) -> Option<Arc<Session>> {
        self.lock()
            .session
            .as_ref()
            .filter(|s| s.has_access_token())
            .cloned()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current().is_some()
    }

    pub fn account(&self) -> Option<Arc<Account>> {
        self.lock().account.clone()
    }

    pub fn etag(&self) -> Option<String> {
        self.lock().etag.clone()
    }

    /// Replaces the whole session (or clears it when `session` is `None`)
    #[instrument(skip(self, session, account), fields(has_session = session.is_some()))]
    pub fn set(
        &self,
        session: Option<Session>,
        account: Option<Account>,
        etag: Option<String>,
        change: SessionChange,
    ) {
        {
            let mut guard = self.lock();
            guard.session = session.map(Arc::new);
            guard.account = account.map(Arc::new);
            guard.etag = etag;
        }
        self.notify(&change);
    }

    /// Applies `edit` to the session if there is one. `edit` returns the
    /// change to announce or `None` to stay silent
    ///
    /// Returns `false` if there was no session to edit
    pub fn update<F>(&self, edit: F) -> bool
    where
        F: FnOnce(&mut Session) -> Option<SessionChange>,
    {
        let change = {
            let mut guard = self.lock();
            let Some(current) = guard.session.as_mut() else {
                return false;
            };
            edit(Arc::make_mut(current))
        };
        if let Some(change) = change {
            self.notify(&change);
        }
        true
    }

    pub fn set_account(&self, account: Account, etag: Option<String>) {
        let mut guard = self.lock();
        guard.account = Some(Arc::new(account));
        guard.etag = etag;
    }

    pub fn subscribe<F: SessionObserver>(&self, observer: F) -> ObserverId {
        let mut guard = self.lock();
        let id = ObserverId(guard.next_observer_id);
        guard.next_observer_id += 1;
        guard.observers.push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        self.lock().observers.retain(|(x, _)| *x != id);
    }

    /// Observers are called without the lock held so they may read the state
    fn notify(&self, change: &SessionChange) {
        let observers: Vec<_> = self
            .lock()
            .observers
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        debug!(?change, observer_count = observers.len(), "notifying");
        for observer in observers {
            observer(change);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        self.inner.lock().expect("session mutex poisoned")
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.lock();
        f.debug_struct("SessionState")
            .field("session", &guard.session)
            .field("observer_count", &guard.observers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_shared::token::expose_internal::make_unsigned_token;
    use secrecy::SecretString;

    use super::*;

    pub(crate) fn test_session(token: &str) -> Session {
        Session {
            user_id: "0f8fad5b-d9cb-469f-a165-70867728950e".parse().unwrap(),
            login: "jerzybem".try_into().unwrap(),
            roles: vec![Role::Client, Role::Staff],
            active_role: Role::Client,
            access_token: SecretString::from(token),
            refresh_token: SecretString::from("refresh"),
            expires_at: Timestamp::from_unix_secs(500),
        }
    }

    #[test]
    fn session_without_token_is_absent() {
        let state = SessionState::default();

        state.set(
            Some(test_session("")),
            None,
            None,
            SessionChange::ProfileUpdated,
        );

        assert!(state.current().is_none());
        assert!(!state.is_logged_in());
    }

    #[test]
    fn observers_receive_changes_in_order() {
        let state = SessionState::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        state.subscribe(move |change: &SessionChange| {
            seen_clone.lock().unwrap().push(change.clone())
        });
        let token = make_unsigned_token("jerzybem", Timestamp::from_unix_secs(500));

        state.set(
            Some(test_session(&token)),
            None,
            None,
            SessionChange::LoggedIn {
                expires_at: Timestamp::from_unix_secs(500),
            },
        );
        state.update(|s| {
            s.switch_role(Role::Staff).ok()?;
            Some(SessionChange::RoleChanged(Role::Staff))
        });
        state.set(
            None,
            None,
            None,
            SessionChange::LoggedOut(LogoutReason::UserRequested),
        );

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                SessionChange::LoggedIn {
                    expires_at: Timestamp::from_unix_secs(500)
                },
                SessionChange::RoleChanged(Role::Staff),
                SessionChange::LoggedOut(LogoutReason::UserRequested),
            ]
        );
    }

    #[test]
    fn unsubscribed_observer_not_called() {
        let state = SessionState::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let id = state.subscribe(move |_: &SessionChange| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        state.unsubscribe(id);
        state.set(None, None, None, SessionChange::ProfileUpdated);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn observer_may_read_state() {
        let state = SessionState::default();
        let reader = state.clone();
        let saw_session = Arc::new(Mutex::new(None));
        let saw_clone = Arc::clone(&saw_session);
        state.subscribe(move |_: &SessionChange| {
            *saw_clone.lock().unwrap() = Some(reader.is_logged_in());
        });

        state.set(
            Some(test_session("token")),
            None,
            None,
            SessionChange::LoggedIn {
                expires_at: Timestamp::from_unix_secs(500),
            },
        );

        assert_eq!(*saw_session.lock().unwrap(), Some(true));
    }

    #[test]
    fn update_without_session_reports_false() {
        let state = SessionState::default();

        let actual = state.update(|_| Some(SessionChange::ProfileUpdated));

        assert!(!actual);
        assert!(state.current().is_none());
    }
}
