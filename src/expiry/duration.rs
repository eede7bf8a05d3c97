//! Duration Resolver
//!
//! Turns a human-friendly time specification into a millisecond count.
//!
//! Two forms are accepted:
//!
//! - [`TimeSpec::Days`]: a plain number of whole days
//! - [`TimeSpec::Span`]: any combination of days, hours, minutes, seconds
//!   and milliseconds
//!
//! Spans are resolved by adding them to a fixed anchor date and measuring
//! the distance, so the result is always the exact span. No timezone or DST
//! rules are involved.
//!
//! ## Example
//!
//! ```
//! use kvexpiry::expiry::{resolve, Span, TimeSpec};
//!
//! assert_eq!(resolve(TimeSpec::Days(2)), 2 * 86_400_000);
//! assert_eq!(resolve(Span::new().hours(1).minutes(30)), 5_400_000);
//! assert_eq!("1h30m".parse::<TimeSpec>().unwrap().as_millis(), 5_400_000);
//! ```

use chrono::{NaiveDate, TimeDelta};
use std::str::FromStr;
use thiserror::Error;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// A structured duration. Every field defaults to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Days
    pub dd: u32,
    /// Hours
    pub hh: u32,
    /// Minutes
    pub mm: u32,
    /// Seconds
    pub ss: u32,
    /// Milliseconds
    pub ms: u32,
}

impl Span {
    /// Creates a zero-length span.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn days(mut self, dd: u32) -> Self {
        self.dd = dd;
        self
    }

    pub fn hours(mut self, hh: u32) -> Self {
        self.hh = hh;
        self
    }

    pub fn minutes(mut self, mm: u32) -> Self {
        self.mm = mm;
        self
    }

    pub fn seconds(mut self, ss: u32) -> Self {
        self.ss = ss;
        self
    }

    pub fn millis(mut self, ms: u32) -> Self {
        self.ms = ms;
        self
    }

    /// Resolves the span to milliseconds using date arithmetic.
    pub fn as_millis(&self) -> u64 {
        let delta = TimeDelta::days(i64::from(self.dd))
            + TimeDelta::hours(i64::from(self.hh))
            + TimeDelta::minutes(i64::from(self.mm))
            + TimeDelta::seconds(i64::from(self.ss))
            + TimeDelta::milliseconds(i64::from(self.ms));

        let measured = NaiveDate::from_ymd_opt(1970, 2, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|anchor| {
                anchor
                    .checked_add_signed(delta)
                    .map(|end| end.signed_duration_since(anchor))
            })
            // Spans that run past the calendar's range are still exact deltas
            .unwrap_or(delta);

        measured.num_milliseconds().max(0) as u64
    }
}

/// A time-to-live specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSpec {
    /// Whole days
    Days(u32),
    /// Structured span
    Span(Span),
}

impl TimeSpec {
    /// Resolves this specification to milliseconds.
    pub fn as_millis(&self) -> u64 {
        match self {
            TimeSpec::Days(days) => u64::from(*days) * MILLIS_PER_DAY,
            TimeSpec::Span(span) => span.as_millis(),
        }
    }

    /// A zero day count means "no TTL" when passed to `set_with_ttl`.
    ///
    /// A zero [`Span`] is different: it expires immediately.
    pub(crate) fn is_unset(&self) -> bool {
        matches!(self, TimeSpec::Days(0))
    }
}

impl From<u32> for TimeSpec {
    fn from(days: u32) -> Self {
        TimeSpec::Days(days)
    }
}

impl From<Span> for TimeSpec {
    fn from(span: Span) -> Self {
        TimeSpec::Span(span)
    }
}

/// Resolves a time specification to a millisecond count.
pub fn resolve(spec: impl Into<TimeSpec>) -> u64 {
    spec.into().as_millis()
}

/// Errors that can occur when parsing a textual time specification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeSpecError {
    /// The input was empty or only whitespace
    #[error("empty time specification")]
    Empty,

    /// A number was missing or out of range
    #[error("invalid number in time specification: {0}")]
    InvalidNumber(String),

    /// A number was not followed by a unit
    #[error("missing unit after {0}")]
    MissingUnit(String),

    /// The unit is not one of d, h, m, s, ms
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    /// The same unit appeared twice
    #[error("duplicate unit: {0}")]
    DuplicateUnit(String),
}

impl FromStr for TimeSpec {
    type Err = TimeSpecError;

    /// Parses `"3"` as three days, or compounds such as `"1h30m"`,
    /// `"2d"`, `"45s"` and `"1m500ms"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeSpecError::Empty);
        }

        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse::<u32>()
                .map(TimeSpec::Days)
                .map_err(|_| TimeSpecError::InvalidNumber(s.to_string()));
        }

        let mut span = Span::new();
        let mut seen: Vec<&str> = Vec::with_capacity(5);
        let mut rest = s;

        while !rest.is_empty() {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return Err(TimeSpecError::InvalidNumber(rest.to_string()));
            }
            let (number, tail) = rest.split_at(digits);
            let value = number
                .parse::<u32>()
                .map_err(|_| TimeSpecError::InvalidNumber(number.to_string()))?;

            let unit_len = tail.bytes().take_while(u8::is_ascii_alphabetic).count();
            if unit_len == 0 {
                return Err(TimeSpecError::MissingUnit(number.to_string()));
            }
            let (unit, tail) = tail.split_at(unit_len);

            if seen.contains(&unit) {
                return Err(TimeSpecError::DuplicateUnit(unit.to_string()));
            }
            match unit {
                "d" => span.dd = value,
                "h" => span.hh = value,
                "m" => span.mm = value,
                "s" => span.ss = value,
                "ms" => span.ms = value,
                other => return Err(TimeSpecError::UnknownUnit(other.to_string())),
            }
            seen.push(unit);
            rest = tail;
        }

        Ok(TimeSpec::Span(span))
    }
}
