/// Timestamps and validity intervals
use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer instant on a document's timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Sentinel end meaning "valid until further notice"
    pub const OPEN: Self = Self(i64::MAX);

    /// Instant before any cut has been taken
    pub const ORIGIN: Self = Self(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_open(&self) -> bool {
        *self == Self::OPEN
    }

    /// The instant immediately before this one. OPEN has no predecessor and maps to itself.
    pub fn pred(&self) -> Self {
        if self.is_open() {
            *self
        } else {
            Self(self.0 - 1)
        }
    }

    /// The instant immediately after this one, saturating at OPEN
    pub fn succ(&self) -> Self {
        if self.is_open() {
            *self
        } else {
            Self(self.0.saturating_add(1))
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() {
            write!(f, "OPEN")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A validity interval. `to` is the last instant of validity, so a record truncated at cut
/// `T` ends at `T - 1` and its successor starts at `T` with no gap between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl Interval {
    pub fn new(from: Timestamp, to: Timestamp) -> Self {
        Self { from, to }
    }

    /// `[from, OPEN]`
    pub fn open_from(from: Timestamp) -> Self {
        Self {
            from,
            to: Timestamp::OPEN,
        }
    }

    pub fn is_open(&self) -> bool {
        self.to.is_open()
    }

    pub fn covers(&self, t: Timestamp) -> bool {
        self.from <= t && t <= self.to
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.from <= other.from && other.to <= self.to
    }

    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        if !self.intersects(other) {
            return None;
        }
        Some(Interval {
            from: self.from.max(other.from),
            to: self.to.min(other.to),
        })
    }

    /// The part of this interval strictly before `cut`, if any
    pub fn truncated_at(&self, cut: Timestamp) -> Option<Interval> {
        if self.from >= cut {
            return None;
        }
        Some(Interval {
            from: self.from,
            to: self.to.min(cut.pred()),
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Which records a navigation query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFilter {
    /// Every record ever written
    All,
    /// Records valid at one instant
    At(Timestamp),
    /// Records whose validity intersects the interval
    Between(Interval),
}

impl TimeFilter {
    /// The window a record's interval must intersect to pass the filter
    pub fn window(&self) -> Interval {
        match self {
            TimeFilter::All => Interval::new(Timestamp(i64::MIN), Timestamp::OPEN),
            TimeFilter::At(t) => Interval::new(*t, *t),
            TimeFilter::Between(interval) => *interval,
        }
    }

    pub fn accepts(&self, valid: &Interval) -> bool {
        self.window().intersects(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(from: i64, to: i64) -> Interval {
        Interval::new(Timestamp(from), Timestamp(to))
    }

    #[test]
    fn test_covers_is_inclusive() {
        let interval = iv(3, 7);
        assert!(!interval.covers(Timestamp(2)));
        assert!(interval.covers(Timestamp(3)));
        assert!(interval.covers(Timestamp(7)));
        assert!(!interval.covers(Timestamp(8)));
    }

    #[test]
    fn test_open_interval_covers_future() {
        let interval = Interval::open_from(Timestamp(5));
        assert!(interval.is_open());
        assert!(interval.covers(Timestamp(1_000_000)));
        assert!(!interval.covers(Timestamp(4)));
    }

    #[test]
    fn test_truncation_tiles_without_gap() {
        let interval = Interval::open_from(Timestamp(2));
        let head = interval.truncated_at(Timestamp(10)).unwrap();
        assert_eq!(head, iv(2, 9));
        let tail = Interval::open_from(Timestamp(10));
        assert!(!head.intersects(&tail));
        assert_eq!(head.to.succ(), tail.from);

        // Nothing survives a cut at or before the start
        assert!(interval.truncated_at(Timestamp(2)).is_none());
    }

    #[test]
    fn test_intersection() {
        assert_eq!(iv(1, 5).intersection(&iv(4, 9)), Some(iv(4, 5)));
        assert_eq!(iv(1, 5).intersection(&iv(6, 9)), None);
        assert!(iv(1, 9).contains(&iv(2, 3)));
        assert!(!iv(2, 3).contains(&iv(1, 9)));
    }

    #[test]
    fn test_time_filter_windows() {
        let record = iv(3, 7);
        assert!(TimeFilter::All.accepts(&record));
        assert!(TimeFilter::At(Timestamp(5)).accepts(&record));
        assert!(!TimeFilter::At(Timestamp(8)).accepts(&record));
        assert!(TimeFilter::Between(iv(7, 12)).accepts(&record));
        assert!(!TimeFilter::Between(iv(8, 12)).accepts(&record));
    }

    #[test]
    fn test_open_display_and_pred() {
        assert_eq!(Timestamp::OPEN.to_string(), "OPEN");
        assert_eq!(Timestamp::OPEN.pred(), Timestamp::OPEN);
        assert_eq!(Timestamp(4).pred(), Timestamp(3));
        assert_eq!(iv(1, 2).to_string(), "[1, 2]");
    }
}
