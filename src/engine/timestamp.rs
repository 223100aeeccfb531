//! Human-readable time buckets for timestamp labels.
//!
//! Bucket thresholds are policy: [`TimeBucketPolicy`] decides which bucket a
//! timestamp falls in and how the bucket reads. [`RelativeBuckets`] is the
//! default ("just now", "3 minutes ago", ..., calendar date).

use chrono::{DateTime, NaiveDate, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Coarse age of a message relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeBucket {
    JustNow,
    Minutes(i64),
    OneHour,
    Hours(i64),
    OneDay,
    Days(i64),
    Date(NaiveDate),
}

impl TimeBucket {
    /// The bucket the forward break rule treats as "no break".
    pub fn is_most_recent(&self) -> bool {
        matches!(self, Self::JustNow)
    }
}

/// Maps timestamps to buckets and buckets to label text.
pub trait TimeBucketPolicy {
    fn bucket(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> TimeBucket;
    fn render(&self, bucket: &TimeBucket) -> String;

    fn label(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> (TimeBucket, String) {
        let bucket = self.bucket(timestamp, now);
        let text = self.render(&bucket);
        (bucket, text)
    }
}

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Relative buckets with a calendar-date fallback after five days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeBuckets {
    date_format: String,
}

impl RelativeBuckets {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }
}

impl Default for RelativeBuckets {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

const MINUTE: i64 = 60;
const HOUR: i64 = 3600;
const DAY: i64 = 24 * HOUR;

impl TimeBucketPolicy for RelativeBuckets {
    fn bucket(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> TimeBucket {
        let seconds = (now - timestamp).num_seconds();
        let days = seconds.div_euclid(DAY);
        if days > 5 {
            return TimeBucket::Date(timestamp.date_naive());
        }
        if days > 1 {
            return TimeBucket::Days(days);
        }
        if days == 1 {
            return TimeBucket::OneDay;
        }
        let hours = seconds.div_euclid(HOUR);
        if hours > 1 {
            return TimeBucket::Hours(hours);
        }
        if hours == 1 {
            return TimeBucket::OneHour;
        }
        let minutes = seconds.div_euclid(MINUTE);
        if minutes > 1 {
            return TimeBucket::Minutes(minutes);
        }
        TimeBucket::JustNow
    }

    fn render(&self, bucket: &TimeBucket) -> String {
        match bucket {
            TimeBucket::JustNow => "just now".to_string(),
            TimeBucket::Minutes(n) => format!("{n} minutes ago"),
            TimeBucket::OneHour => "one hour ago".to_string(),
            TimeBucket::Hours(n) => format!("{n} hours ago"),
            TimeBucket::OneDay => "one day ago".to_string(),
            TimeBucket::Days(n) => format!("{n} days ago"),
            TimeBucket::Date(date) => date.format(&self.date_format).to_string(),
        }
    }
}
