//! Clocks for evaluating token lifetimes
//!
//! Every time-dependent check in the authorizer reads "now" through the
//! [`Clock`] trait, so that expiry and not-before boundaries can be pinned
//! down exactly in tests with a [`TestClock`].

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_must_use
)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::{
    ops::{Add, Sub},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unix time
///
/// Seconds elapsed since 1970-01-01T00:00:00Z. This is the representation
/// used by the `exp` and `nbf` claims of a JWT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct UnixTime(pub u64);

impl UnixTime {
    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later
    #[inline]
    #[must_use]
    pub fn saturating_duration_since(self, earlier: UnixTime) -> Duration {
        Duration::from_secs(self.0.saturating_sub(earlier.0))
    }
}

impl From<SystemTime> for UnixTime {
    /// Times before the epoch collapse to the epoch itself
    #[inline]
    fn from(t: SystemTime) -> Self {
        let secs = t
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        UnixTime(secs)
    }
}

impl Add<Duration> for UnixTime {
    type Output = UnixTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        UnixTime(self.0.saturating_add(rhs.as_secs()))
    }
}

impl Sub<Duration> for UnixTime {
    type Output = UnixTime;

    #[inline]
    fn sub(self, rhs: Duration) -> Self::Output {
        UnixTime(self.0.saturating_sub(rhs.as_secs()))
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl Serialize for UnixTime {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> Deserialize<'de> for UnixTime {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = u64::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// Represents a clock, which can tell the current time
pub trait Clock {
    /// Gets the current time according to this clock
    fn now(&self) -> UnixTime;
}

impl<T: Clock + ?Sized> Clock for &'_ T {
    #[inline]
    fn now(&self) -> UnixTime {
        T::now(self)
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    #[inline]
    fn now(&self) -> UnixTime {
        T::now(self)
    }
}

/// The system clock as provided by `std::time::SystemTime`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime::from(SystemTime::now())
    }
}

/// A manually driven clock
///
/// Clones share the same underlying time, so a test can hand one clone to
/// the code under test and keep another to move time forward.
#[derive(Clone, Debug, Default)]
pub struct TestClock(Arc<AtomicU64>);

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime(self.0.load(Ordering::SeqCst))
    }
}

impl TestClock {
    /// Creates a new test clock reading the specified time
    #[inline]
    pub fn new(time: UnixTime) -> Self {
        Self(Arc::new(AtomicU64::new(time.0)))
    }

    /// Sets the clock's current time to `val`
    pub fn set(&self, val: UnixTime) {
        self.0.store(val.0, Ordering::SeqCst);
    }

    /// Moves the clock forward by `inc` seconds
    pub fn inc(&self, inc: u64) {
        self.0.fetch_add(inc, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_clones_share_time() {
        let clock = TestClock::new(UnixTime(100));
        let observer = clock.clone();

        clock.inc(5);
        assert_eq!(observer.now(), UnixTime(105));

        observer.set(UnixTime(7));
        assert_eq!(clock.now(), UnixTime(7));
    }

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(UnixTime(3) - Duration::from_secs(10), UnixTime(0));
        assert_eq!(UnixTime(u64::MAX) + Duration::from_secs(1), UnixTime(u64::MAX));
        assert_eq!(
            UnixTime(10).saturating_duration_since(UnixTime(4)),
            Duration::from_secs(6)
        );
        assert_eq!(
            UnixTime(4).saturating_duration_since(UnixTime(10)),
            Duration::ZERO
        );
    }

    #[test]
    fn pre_epoch_system_time_is_epoch() {
        let before = SystemTime::UNIX_EPOCH - Duration::from_secs(30);
        assert_eq!(UnixTime::from(before), UnixTime(0));
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(System.now() > UnixTime(1_577_836_800));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_plain_seconds() {
        let json = serde_json::to_string(&UnixTime(42)).unwrap();
        assert_eq!(json, "42");
        let back: UnixTime = serde_json::from_str("1700000000").unwrap();
        assert_eq!(back, UnixTime(1_700_000_000));
    }
}
