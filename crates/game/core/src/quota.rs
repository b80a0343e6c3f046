//! Daily play quota bookkeeping.
//!
//! The quota is keyed by the player's local calendar date. Stored dates use
//! the host's unpadded `Y-M-D` rendering (`2026-1-5`), so parsing accepts both
//! padded and unpadded components and comparison is structural.
use core::fmt;
use core::str::FromStr;

/// Local calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid calendar date: {0}")]
pub struct DateParseError(pub String);

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.year, self.month, self.day)
    }
}

impl FromStr for CalendarDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DateParseError(s.to_string());
        let mut parts = s.trim().splitn(3, '-');
        let year = parts.next().and_then(|p| p.parse::<i32>().ok());
        let month = parts.next().and_then(|p| p.parse::<u32>().ok());
        let day = parts.next().and_then(|p| p.parse::<u32>().ok());
        match (year, month, day) {
            (Some(year), Some(month), Some(day))
                if (1..=12).contains(&month) && (1..=31).contains(&day) =>
            {
                Ok(Self { year, month, day })
            }
            _ => Err(invalid()),
        }
    }
}

/// Plays used on a given calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DailyQuota {
    pub date: CalendarDate,
    pub plays_used: u32,
}

impl DailyQuota {
    pub fn fresh(date: CalendarDate) -> Self {
        Self {
            date,
            plays_used: 0,
        }
    }

    /// Returns this record if it belongs to `today`, otherwise a zeroed one.
    pub fn for_day(self, today: CalendarDate) -> Self {
        if self.date == today {
            self
        } else {
            Self::fresh(today)
        }
    }

    pub fn is_exhausted(&self, max_plays: u32) -> bool {
        self.plays_used >= max_plays
    }

    pub fn remaining(&self, max_plays: u32) -> u32 {
        max_plays.saturating_sub(self.plays_used)
    }

    /// Records one concluded run.
    pub fn record_play(self) -> Self {
        Self {
            date: self.date,
            plays_used: self.plays_used.saturating_add(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_without_zero_padding() {
        assert_eq!(CalendarDate::new(2026, 1, 5).to_string(), "2026-1-5");
    }

    #[test]
    fn padded_and_unpadded_dates_are_the_same_day() {
        let unpadded: CalendarDate = "2026-1-5".parse().unwrap();
        let padded: CalendarDate = "2026-01-05".parse().unwrap();
        assert_eq!(unpadded, padded);
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!("yesterday".parse::<CalendarDate>().is_err());
        assert!("2026-13-1".parse::<CalendarDate>().is_err());
        assert!("2026-1".parse::<CalendarDate>().is_err());
    }

    #[test]
    fn stale_record_resets_to_zero() {
        let yesterday = DailyQuota {
            date: CalendarDate::new(2026, 10, 17),
            plays_used: 3,
        };
        let today = CalendarDate::new(2026, 10, 18);
        assert_eq!(yesterday.for_day(today), DailyQuota::fresh(today));

        let current = DailyQuota {
            date: today,
            plays_used: 2,
        };
        assert_eq!(current.for_day(today), current);
    }

    #[test]
    fn remaining_never_underflows() {
        let quota = DailyQuota {
            date: CalendarDate::new(2026, 10, 18),
            plays_used: 2,
        };
        assert_eq!(quota.remaining(3), 1);
        assert!(!quota.is_exhausted(3));
        let quota = quota.record_play();
        assert!(quota.is_exhausted(3));
        assert_eq!(quota.record_play().remaining(3), 0);
    }
}
