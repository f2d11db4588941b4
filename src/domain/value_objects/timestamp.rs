//! # Timestamp Value Object
//!
//! UTC instant used for deal creation, lock windows and swap deadlines.
//!
//! Lock windows and deadlines are whole seconds added to an instant, so
//! they go through [`Timestamp::checked_add_secs`] and
//! [`Timestamp::saturating_add_secs`] instead of the panicking chrono
//! operators.
//!
//! # Examples
//!
//! ```
//! use data_deal_escrow::domain::value_objects::timestamp::Timestamp;
//!
//! let created = Timestamp::from_secs(1_700_000_000).unwrap();
//! let unlocks = created.saturating_add_secs(1_296_000);
//!
//! assert_eq!(unlocks.timestamp_secs(), 1_701_296_000);
//! assert!(created < unlocks);
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC instant, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Latest representable instant; saturated window ends land here.
    pub const MAX: Self = Self(DateTime::<Utc>::MAX_UTC);

    /// Current wall-clock instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Instant at `secs` Unix seconds, or `None` out of range.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Unix seconds.
    #[inline]
    #[must_use]
    pub fn timestamp_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Adds `secs`, returning `None` past [`Timestamp::MAX`].
    ///
    /// ```
    /// use data_deal_escrow::domain::value_objects::timestamp::Timestamp;
    ///
    /// let ts = Timestamp::from_secs(1_000).unwrap();
    /// assert_eq!(ts.checked_add_secs(1_200).unwrap().timestamp_secs(), 2_200);
    /// assert!(ts.checked_add_secs(u64::MAX).is_none());
    /// ```
    #[must_use]
    pub fn checked_add_secs(&self, secs: u64) -> Option<Self> {
        let secs = i64::try_from(secs).ok()?;
        let delta = Duration::try_seconds(secs)?;
        self.0.checked_add_signed(delta).map(Self)
    }

    /// Adds `secs`, clamping to [`Timestamp::MAX`].
    #[must_use]
    pub fn saturating_add_secs(&self, secs: u64) -> Self {
        self.checked_add_secs(secs).unwrap_or(Self::MAX)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unix_seconds_roundtrip() {
        let ts = Timestamp::from_secs(1_704_067_200).unwrap();
        assert_eq!(ts.timestamp_secs(), 1_704_067_200);
    }

    #[test]
    fn lock_window_end() {
        let created = Timestamp::from_secs(1_000).unwrap();
        let unlocks = created.checked_add_secs(1_296_000).unwrap();
        assert_eq!(unlocks.timestamp_secs(), 1_297_000);
    }

    #[test]
    fn overflow_is_none_or_clamped() {
        let ts = Timestamp::from_secs(1_000).unwrap();
        assert!(ts.checked_add_secs(u64::MAX).is_none());
        assert!(Timestamp::MAX.checked_add_secs(1).is_none());
        assert_eq!(ts.saturating_add_secs(u64::MAX), Timestamp::MAX);
    }

    #[test]
    fn display_and_serde_use_rfc3339() {
        let ts = Timestamp::from_secs(1_704_067_200).unwrap();
        assert!(ts.to_string().starts_with("2024-01-01T00:00:00"));
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
