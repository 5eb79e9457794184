//! Second resolution time wrappers. Tokens carry their expiry as seconds since
//! the unix epoch so everything time related on the client is kept at that
//! resolution.

use std::{fmt::Display, time::Duration};

/// A span of time that is always clearly in seconds
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Seconds(u64);

/// Wall clock time in seconds since the unix epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Seconds {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, rhs: Seconds) -> Seconds {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Timestamp {
    pub fn now() -> Self {
        Self(
            web_time::SystemTime::UNIX_EPOCH
                .elapsed()
                .expect("expected date on system to be after the epoch")
                .as_secs(),
        )
    }

    pub const fn from_unix_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_unix_secs(self) -> u64 {
        self.0
    }

    /// Returns the earlier of the two values after moving back by `secs`,
    /// stopping at the epoch
    pub fn saturating_sub(self, secs: Seconds) -> Self {
        Self(self.0.saturating_sub(secs.0))
    }

    /// Time remaining until `later` or zero if it has already passed
    pub fn until(self, later: Self) -> Seconds {
        Seconds(later.0.saturating_sub(self.0))
    }

    /// Returns `true` if `self` is at or after `deadline`
    pub fn has_reached(self, deadline: Self) -> bool {
        self.0 >= deadline.0
    }

    pub fn as_local_datetime(self) -> Option<chrono::DateTime<chrono::Local>> {
        let secs = i64::try_from(self.0).ok()?;
        chrono::DateTime::from_timestamp(secs, 0).map(Into::into)
    }

    pub fn display_as_local_datetime(self) -> String {
        match self.as_local_datetime() {
            Some(dt) => dt.format("%F %R").to_string(),
            None => format!("@{}", self.0),
        }
    }
}

impl std::ops::Add<Seconds> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Seconds) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl From<Seconds> for Duration {
    fn from(value: Seconds) -> Self {
        Duration::from_secs(value.0)
    }
}

impl From<u64> for Seconds {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for Seconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_as_local_datetime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn until_is_zero_once_passed() {
        let earlier = Timestamp::from_unix_secs(100);
        let later = Timestamp::from_unix_secs(160);

        assert_eq!(earlier.until(later), Seconds::new(60));
        assert_eq!(later.until(earlier), Seconds::ZERO);
    }

    #[test]
    fn saturating_sub_stops_at_epoch() {
        let ts = Timestamp::from_unix_secs(10);

        assert_eq!(ts.saturating_sub(Seconds::new(180)), Timestamp::from_unix_secs(0));
    }

    #[test]
    fn has_reached_includes_the_deadline_itself() {
        let deadline = Timestamp::from_unix_secs(50);

        assert!(Timestamp::from_unix_secs(50).has_reached(deadline));
        assert!(!Timestamp::from_unix_secs(49).has_reached(deadline));
    }
}
