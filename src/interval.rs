//! # Intervals: operator-facing durations.
//!
//! [`Interval`] is a thin wrapper over [`Duration`] with the syntax used by
//! the command line and the human form used in log records.
//!
//! Parsing accepts a decimal number with an optional unit suffix. A bare
//! number is milliseconds; `s`, `m`, `h` and `d` scale to seconds, minutes,
//! hours and days. Anything after the unit is rejected.
//!
//! Formatting truncates from the largest non-zero unit down to seconds, or
//! prints milliseconds when the value is under one second.
//!
//! # Example
//! ```
//! use procvisor::Interval;
//!
//! let restart: Interval = "90s".parse().unwrap();
//! assert_eq!(restart.to_string(), "1m 30s");
//!
//! let short: Interval = "250".parse().unwrap();
//! assert_eq!(short.to_string(), "250ms");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::IntervalError;

/// A non-negative duration with millisecond precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval(Duration);

impl Interval {
    /// Returns the wrapped duration.
    pub fn duration(self) -> Duration {
        self.0
    }
}

impl From<Duration> for Interval {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IntervalError::Empty);
        }
        let digits = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        if digits == 0 {
            return Err(IntervalError::MissingNumber(s.to_owned()));
        }
        let n: u64 = s[..digits]
            .parse()
            .map_err(|_| IntervalError::OutOfRange(s.to_owned()))?;
        let seconds = |unit: u64| {
            n.checked_mul(unit)
                .map(Duration::from_secs)
                .ok_or_else(|| IntervalError::OutOfRange(s.to_owned()))
        };
        let duration = match &s[digits..] {
            "" => Duration::from_millis(n),
            "s" => seconds(1)?,
            "m" => seconds(60)?,
            "h" => seconds(60 * 60)?,
            "d" => seconds(24 * 60 * 60)?,
            rest => {
                let unit = rest.chars().next().unwrap_or_default();
                return Err(match unit {
                    's' | 'm' | 'h' | 'd' => IntervalError::Trailing(s.to_owned()),
                    other => IntervalError::UnknownUnit(other),
                });
            }
        };
        Ok(Self(duration))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_secs();
        if total == 0 {
            return write!(f, "{}ms", self.0.subsec_millis());
        }
        let d = total / (24 * 60 * 60);
        let h = total % (24 * 60 * 60) / (60 * 60);
        let m = total % (60 * 60) / 60;
        let s = total % 60;
        if d > 0 {
            write!(f, "{d}d {h}h {m}m {s}s")
        } else if h > 0 {
            write!(f, "{h}h {m}m {s}s")
        } else if m > 0 {
            write!(f, "{m}m {s}s")
        } else {
            write!(f, "{s}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Interval {
        s.parse().unwrap()
    }

    #[test]
    fn bare_numbers_are_milliseconds() {
        assert_eq!(parse("500").duration(), Duration::from_millis(500));
        assert_eq!(parse("0").duration(), Duration::ZERO);
    }

    #[test]
    fn unit_suffixes_scale() {
        assert_eq!(parse("2s").duration(), Duration::from_secs(2));
        assert_eq!(parse("15m").duration(), Duration::from_secs(15 * 60));
        assert_eq!(parse("1h").duration(), Duration::from_secs(3600));
        assert_eq!(parse("2d").duration(), Duration::from_secs(2 * 86_400));
    }

    #[test]
    fn bad_syntax_is_rejected() {
        assert_eq!("".parse::<Interval>(), Err(IntervalError::Empty));
        assert_eq!(
            "abc".parse::<Interval>(),
            Err(IntervalError::MissingNumber("abc".into()))
        );
        assert_eq!("10x".parse::<Interval>(), Err(IntervalError::UnknownUnit('x')));
        assert_eq!(
            "10ms".parse::<Interval>(),
            Err(IntervalError::Trailing("10ms".into()))
        );
        assert_eq!(
            "99999999999999999999".parse::<Interval>(),
            Err(IntervalError::OutOfRange("99999999999999999999".into()))
        );
    }

    #[test]
    fn sub_second_formats_as_milliseconds() {
        assert_eq!(Interval::from(Duration::from_millis(250)).to_string(), "250ms");
        assert_eq!(Interval::from(Duration::ZERO).to_string(), "0ms");
    }

    #[test]
    fn formats_truncate_from_largest_unit() {
        assert_eq!(Interval::from(Duration::from_secs(16)).to_string(), "16s");
        assert_eq!(Interval::from(Duration::from_secs(90)).to_string(), "1m 30s");
        assert_eq!(
            Interval::from(Duration::from_secs(3661)).to_string(),
            "1h 1m 1s"
        );
        assert_eq!(
            Interval::from(Duration::from_secs(90_061)).to_string(),
            "1d 1h 1m 1s"
        );
    }

    #[test]
    fn fractional_seconds_truncate() {
        assert_eq!(Interval::from(Duration::from_millis(1600)).to_string(), "1s");
    }
}
