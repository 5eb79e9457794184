//! Watches the access token expiry and says when to warn the user and when
//! the session is over
//!
//! The monitor owns no timer. The UI polls it with the current time on every
//! frame and repaints at least once a second so deadlines are never missed.

use std::sync::mpsc;

use parking_shared::time::{Seconds, Timestamp};
use tracing::{debug, info, instrument};

use crate::session::{LogoutReason, ObserverId, SessionChange, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Monitoring {
        warn_at: Timestamp,
        expires_at: Timestamp,
    },
    WarningShown {
        expires_at: Timestamp,
    },
    Expired,
}

/// Actions the UI must take, each reported once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Offer to refresh the token
    ShowWarning { expires_at: Timestamp },
    /// Tear down the session
    Expired,
}

#[derive(Debug)]
pub struct TokenMonitor {
    lead: Seconds,
    state: MonitorState,
    changes: Option<mpsc::Receiver<SessionChange>>,
    subscription: Option<(SessionState, ObserverId)>,
}

impl TokenMonitor {
    /// `lead` is how long before expiry the warning is raised
    pub fn new(lead: Seconds) -> Self {
        Self {
            lead,
            state: MonitorState::Idle,
            changes: None,
            subscription: None,
        }
    }

    /// Follows the session held in `session` from now on
    #[instrument(skip(session))]
    pub fn attach(&mut self, session: &SessionState) {
        self.detach();
        let (tx, rx) = mpsc::channel();
        let id = session.subscribe(move |change: &SessionChange| {
            // Receiver is gone once the monitor is dropped
            let _ = tx.send(change.clone());
        });
        self.changes = Some(rx);
        self.subscription = Some((session.clone(), id));
        match session.current() {
            Some(current) => self.schedule(current.expires_at),
            None => self.state = MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Starts monitoring a token that expires at `expires_at`. Any earlier
    /// deadline is forgotten
    #[instrument(skip(self))]
    pub fn schedule(&mut self, expires_at: Timestamp) {
        self.state = MonitorState::Monitoring {
            warn_at: expires_at.saturating_sub(self.lead),
            expires_at,
        };
    }

    /// Advances the state machine to `now`
    pub fn poll(&mut self, now: Timestamp) -> Option<MonitorEvent> {
        self.drain_changes();
        match self.state {
            MonitorState::Monitoring {
                warn_at,
                expires_at,
            } => {
                if now.has_reached(expires_at) {
                    info!(%expires_at, "access token expired");
                    self.state = MonitorState::Expired;
                    Some(MonitorEvent::Expired)
                } else if now.has_reached(warn_at) {
                    debug!(%expires_at, "access token about to expire");
                    self.state = MonitorState::WarningShown { expires_at };
                    Some(MonitorEvent::ShowWarning { expires_at })
                } else {
                    None
                }
            }
            MonitorState::WarningShown { expires_at } => {
                if now.has_reached(expires_at) {
                    info!(%expires_at, "access token expired while warning shown");
                    self.state = MonitorState::Expired;
                    Some(MonitorEvent::Expired)
                } else {
                    None
                }
            }
            MonitorState::Idle | MonitorState::Expired => None,
        }
    }

    /// Time remaining on the token, `None` when not monitoring
    pub fn seconds_left(&self, now: Timestamp) -> Option<Seconds> {
        match self.state {
            MonitorState::Monitoring { expires_at, .. }
            | MonitorState::WarningShown { expires_at } => Some(now.until(expires_at)),
            MonitorState::Idle | MonitorState::Expired => None,
        }
    }

    /// A refresh attempt failed, the session is finished
    pub fn refresh_failed(&mut self) {
        self.state = MonitorState::Expired;
    }

    fn drain_changes(&mut self) {
        let Some(changes) = &self.changes else {
            return;
        };
        let received: Vec<_> = changes.try_iter().collect();
        for change in received {
            self.apply(change);
        }
    }

    fn apply(&mut self, change: SessionChange) {
        match change {
            SessionChange::LoggedIn { expires_at }
            | SessionChange::Restored { expires_at }
            | SessionChange::TokenRefreshed { expires_at } => self.schedule(expires_at),
            SessionChange::LoggedOut(LogoutReason::Expired | LogoutReason::RefreshFailed) => {
                self.state = MonitorState::Expired
            }
            SessionChange::LoggedOut(LogoutReason::UserRequested | LogoutReason::AccessRevoked) => {
                self.state = MonitorState::Idle
            }
            SessionChange::RoleChanged(_) | SessionChange::ProfileUpdated => {}
        }
    }

    fn detach(&mut self) {
        if let Some((session, id)) = self.subscription.take() {
            session.unsubscribe(id);
        }
        self.changes = None;
    }
}

impl Drop for TokenMonitor {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use parking_shared::const_config::client::CLIENT_DEFAULT_TOKEN_REFRESH_LEAD;
    use rstest::rstest;

    use super::*;

    const NOW: Timestamp = Timestamp::from_unix_secs(10_000);

    fn monitor() -> TokenMonitor {
        TokenMonitor::new(CLIENT_DEFAULT_TOKEN_REFRESH_LEAD)
    }

    #[test]
    fn warning_raised_at_lead_time_before_expiry() {
        let mut monitor = monitor();
        let expires_at = NOW + Seconds::new(181);
        monitor.schedule(expires_at);

        assert_eq!(monitor.poll(NOW), None);
        assert_eq!(
            monitor.poll(NOW + Seconds::new(1)),
            Some(MonitorEvent::ShowWarning { expires_at })
        );
    }

    #[test]
    fn warning_only_shown_once() {
        let mut monitor = monitor();
        monitor.schedule(NOW + Seconds::new(100));

        assert!(monitor.poll(NOW).is_some());
        assert_eq!(monitor.poll(NOW), None);
        assert_eq!(monitor.poll(NOW + Seconds::new(50)), None);
        assert_eq!(
            monitor.state(),
            MonitorState::WarningShown {
                expires_at: NOW + Seconds::new(100)
            }
        );
    }

    #[rstest]
    #[case::while_monitoring(NOW + Seconds::new(500), false)]
    #[case::while_warning_shown(NOW + Seconds::new(100), true)]
    fn expiry_reported(#[case] expires_at: Timestamp, #[case] warn_first: bool) {
        let mut monitor = monitor();
        monitor.schedule(expires_at);
        if warn_first {
            assert!(matches!(
                monitor.poll(NOW),
                Some(MonitorEvent::ShowWarning { .. })
            ));
        }

        let actual = monitor.poll(expires_at);

        assert_eq!(actual, Some(MonitorEvent::Expired));
        assert_eq!(monitor.state(), MonitorState::Expired);
        assert_eq!(monitor.poll(expires_at + Seconds::new(1)), None);
    }

    #[test]
    fn reschedule_replaces_deadline() {
        let mut monitor = monitor();
        monitor.schedule(NOW + Seconds::new(100));
        assert!(monitor.poll(NOW).is_some());

        monitor.schedule(NOW + Seconds::new(900));

        assert_eq!(monitor.poll(NOW + Seconds::new(101)), None);
        assert_eq!(
            monitor.state(),
            MonitorState::Monitoring {
                warn_at: NOW + Seconds::new(900 - 180),
                expires_at: NOW + Seconds::new(900),
            }
        );
    }

    #[test]
    fn refresh_failure_expires() {
        let mut monitor = monitor();
        monitor.schedule(NOW + Seconds::new(100));

        monitor.refresh_failed();

        assert_eq!(monitor.state(), MonitorState::Expired);
        assert_eq!(monitor.seconds_left(NOW), None);
    }

    #[test]
    fn follows_session_changes() {
        let session = SessionState::default();
        let mut monitor = monitor();
        monitor.attach(&session);
        assert_eq!(monitor.state(), MonitorState::Idle);

        session.set(
            None,
            None,
            None,
            SessionChange::LoggedIn {
                expires_at: NOW + Seconds::new(600),
            },
        );
        assert_eq!(monitor.poll(NOW), None);
        assert_eq!(monitor.seconds_left(NOW), Some(Seconds::new(600)));

        session.set(
            None,
            None,
            None,
            SessionChange::LoggedOut(LogoutReason::UserRequested),
        );
        assert_eq!(monitor.poll(NOW), None);
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[test]
    fn dropped_monitor_unsubscribes() {
        let session = SessionState::default();
        let mut monitor = monitor();
        monitor.attach(&session);

        drop(monitor);

        // Must not panic with the receiver gone
        session.set(None, None, None, SessionChange::ProfileUpdated);
    }
}
