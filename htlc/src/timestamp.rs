use crate::ethereum::U256;
use chrono::{DateTime, Utc};
use std::{convert::TryFrom, fmt, time::SystemTime};

/// An exact time and date used to represent absolute timelocks
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The refund window the initiator locks its funds for.
    pub const INITIATOR_WINDOW: u64 = 48 * 60 * 60;

    pub fn now() -> Self {
        let seconds = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or_default();

        Timestamp(seconds)
    }

    pub fn plus(self, seconds: u64) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    /// Timelock for the party that generated the secret.
    pub fn initiator_timelock(now: Timestamp) -> Self {
        now.plus(Self::INITIATOR_WINDOW)
    }

    /// Timelock for the responding party: halfway between `now` and the
    /// initiator's timelock, so the initiator must reveal the secret while the
    /// participant can still claim. Returns `None` once the initiator's
    /// timelock has passed.
    pub fn participant_timelock(now: Timestamp, initiator_timelock: Timestamp) -> Option<Self> {
        if initiator_timelock.has_passed(now) {
            return None;
        }

        let remaining = initiator_timelock.0 - now.0;

        Some(now.plus(remaining / 2))
    }

    pub fn has_passed(self, now: Timestamp) -> bool {
        self <= now
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// The u64 input is the number of seconds since epoch
impl From<u64> for Timestamp {
    fn from(item: u64) -> Self {
        Self(item)
    }
}

impl From<Timestamp> for u64 {
    fn from(item: Timestamp) -> Self {
        item.0
    }
}

impl From<Timestamp> for U256 {
    fn from(item: Timestamp) -> Self {
        U256::from(item.0)
    }
}

/// Contracts store timelocks as `uint256`; anything beyond `u64` saturates.
impl From<U256> for Timestamp {
    fn from(item: U256) -> Self {
        if item > U256::from(u64::MAX) {
            Timestamp(u64::MAX)
        } else {
            Timestamp(item.low_u64())
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => write!(f, "{} ({})", self.0, datetime.to_rfc3339()),
            None => write!(f, "{}", self.0),
        }
    }
}
