use crate::date::CalendarDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Restricted ISO 8601 duration: years, months and days only.
static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([-+])?P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?$").expect("static duration pattern")
});

/// A signed calendar offset of whole years, months and days.
///
/// Advancing a date applies the years, then the months, then the days, each
/// with calendar rollover: one month after January 31 is early March, not
/// the end of February.
///
/// # Examples
///
/// ```
/// use chronofilter_types::date::CalendarDate;
/// use chronofilter_types::duration::Duration;
///
/// let decade = Duration::parse("P10Y").unwrap();
/// assert_eq!(decade, Duration::new(10, 0, 0));
///
/// let start = CalendarDate::new(1900, 1, 1).unwrap();
/// assert_eq!(decade.advance(start), CalendarDate::new(1910, 1, 1));
///
/// // Text without the `P` designator is not a duration
/// assert!(Duration::parse("10Y").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Duration {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl Duration {
    pub const fn new(years: i32, months: i32, days: i32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    pub const fn years(years: i32) -> Self {
        Self::new(years, 0, 0)
    }

    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Parse `[-+]P[nY][nM][nD]`.
    ///
    /// Missing components are zero, so a bare `P` is a zero duration. A leading
    /// `-` negates every component. Returns `None` when the text does not
    /// follow the grammar or a component does not fit in an `i32`.
    pub fn parse(text: &str) -> Option<Self> {
        let captures = ISO_DURATION.captures(text)?;
        let sign = match captures.get(1).map(|m| m.as_str()) {
            Some("-") => -1,
            _ => 1,
        };
        let component = |index: usize| -> Option<i32> {
            match captures.get(index) {
                Some(digits) => digits.as_str().parse::<i32>().ok().map(|value| sign * value),
                None => Some(0),
            }
        };
        Some(Self::new(component(2)?, component(3)?, component(4)?))
    }

    /// The date this duration after `date`, or `None` outside the calendar's range.
    pub fn advance(&self, date: CalendarDate) -> Option<CalendarDate> {
        let month0 = |date: &CalendarDate| i64::from(date.month()) - 1;

        let date = CalendarDate::from_components(
            date.year().checked_add(self.years)?,
            month0(&date),
            i64::from(date.day()),
        )?;
        let date = CalendarDate::from_components(
            date.year(),
            month0(&date) + i64::from(self.months),
            i64::from(date.day()),
        )?;
        CalendarDate::from_components(
            date.year(),
            month0(&date),
            i64::from(date.day()) + i64::from(self.days),
        )
    }

    pub fn negated(&self) -> Self {
        Self::new(-self.years, -self.months, -self.days)
    }
}

impl fmt::Display for Duration {
    /// Writes the ISO form, e.g. `P1Y6M`, `-P10D` or `P0D` for zero.
    ///
    /// Mixed-sign durations have no ISO spelling; their negative components
    /// are written with their own minus sign.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [self.years, self.months, self.days];
        let negative = parts.iter().all(|part| *part <= 0) && parts.iter().any(|part| *part < 0);
        let shown = if negative { self.negated() } else { *self };

        if negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        if shown.is_zero() {
            return f.write_str("0D");
        }
        for (value, unit) in [(shown.years, 'Y'), (shown.months, 'M'), (shown.days, 'D')] {
            if value != 0 {
                write!(f, "{value}{unit}")?;
            }
        }
        Ok(())
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Duration::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration: {text}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> CalendarDate {
        CalendarDate::new(year, month, day).unwrap()
    }

    #[test]
    fn test_parse_single_components() {
        assert_eq!(Duration::parse("P5Y"), Some(Duration::new(5, 0, 0)));
        assert_eq!(Duration::parse("P3M"), Some(Duration::new(0, 3, 0)));
        assert_eq!(Duration::parse("P10D"), Some(Duration::new(0, 0, 10)));
    }

    #[test]
    fn test_parse_signs_and_empty() {
        assert_eq!(Duration::parse("-P1Y"), Some(Duration::new(-1, 0, 0)));
        assert_eq!(Duration::parse("+P1Y2M3D"), Some(Duration::new(1, 2, 3)));
        assert_eq!(Duration::parse("-P1Y2M3D"), Some(Duration::new(-1, -2, -3)));
        assert_eq!(Duration::parse("P"), Some(Duration::zero()));
    }

    #[test]
    fn test_parse_rejects_non_durations() {
        for text in ["", "garbage", "5Y", "P1W", "PT1H", "P1D1Y", "P-1Y", "p1y", "P1.5Y"] {
            assert!(Duration::parse(text).is_none(), "accepted {text:?}");
        }
        assert!(Duration::parse("P99999999999Y").is_none());
    }

    #[test]
    fn test_advance_by_years_months_days() {
        assert_eq!(Duration::years(1).advance(date(1900, 1, 1)), Some(date(1901, 1, 1)));
        assert_eq!(
            Duration::new(0, 1, 0).advance(date(1900, 12, 15)),
            Some(date(1901, 1, 15))
        );
        assert_eq!(
            Duration::new(0, 0, 10).advance(date(1900, 12, 25)),
            Some(date(1901, 1, 4))
        );
        assert_eq!(
            Duration::new(-1, 0, 0).advance(date(1, 6, 1)),
            Some(date(0, 6, 1))
        );
    }

    #[test]
    fn test_advance_rolls_over_short_months() {
        // Feb 29 plus a year has no Feb 29 to land on
        assert_eq!(Duration::years(1).advance(date(2024, 2, 29)), Some(date(2025, 3, 1)));
        assert_eq!(Duration::new(0, 1, 0).advance(date(1900, 1, 31)), Some(date(1900, 3, 3)));
        assert_eq!(Duration::new(0, 1, 0).advance(date(2000, 1, 31)), Some(date(2000, 3, 2)));
    }

    #[test]
    fn test_display_round_trips() {
        for duration in [
            Duration::years(1),
            Duration::new(1, 6, 0),
            Duration::new(0, 0, -10),
            Duration::new(-2, -1, -1),
            Duration::zero(),
        ] {
            let text = duration.to_string();
            assert_eq!(Duration::parse(&text), Some(duration), "{text}");
        }
        assert_eq!(Duration::zero().to_string(), "P0D");
        assert_eq!(Duration::new(0, 0, -10).to_string(), "-P10D");
    }
}
