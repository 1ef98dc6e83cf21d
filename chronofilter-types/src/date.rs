use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// `[-]YYYY[-MM[-DD]]` with one to four year digits.
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,4}(?:-\d{2}){0,2}$").expect("static date pattern"));

/// How many fields a partial ISO date carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Year,
    Month,
    Day,
}

/// A UTC calendar date in the proleptic Gregorian calendar.
///
/// Years use astronomical numbering: year `0` exists and `-44` is 45 BCE.
/// Two-digit years are always taken literally, so `CalendarDate::new(99, 1, 1)`
/// is the year 99, never 1999.
///
/// # Examples
///
/// ```
/// use chronofilter_types::date::CalendarDate;
///
/// let ides = CalendarDate::parse_iso("-0044-03-15").unwrap();
/// assert_eq!((ides.year(), ides.month(), ides.day()), (-44, 3, 15));
/// assert_eq!(ides.to_string(), "-0044-03-15");
///
/// // Calendar-invalid dates are rejected rather than rolled over
/// assert!(CalendarDate::parse_iso("1900-02-30").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Create a date from a one-based month and day, rejecting invalid combinations.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Build a date from components the way a calendar normalizes them.
    ///
    /// `month0` is zero-based and both `month0` and `day` may fall outside
    /// their usual ranges: overflowing months roll into following years and
    /// overflowing days into following months (`day == 0` is the last day of
    /// the previous month). The year is used as given, including `0..=99`.
    ///
    /// Returns `None` only when the result leaves the representable range.
    ///
    /// ```
    /// use chronofilter_types::date::CalendarDate;
    ///
    /// let rolled = CalendarDate::from_components(1899, 12, 1).unwrap();
    /// assert_eq!(rolled, CalendarDate::new(1900, 1, 1).unwrap());
    ///
    /// let leap = CalendarDate::from_components(2024, 1, 30).unwrap();
    /// assert_eq!(leap, CalendarDate::new(2024, 3, 1).unwrap());
    ///
    /// assert_eq!(CalendarDate::from_components(12, 0, 1).unwrap().year(), 12);
    /// ```
    pub fn from_components(year: i32, month0: i64, day: i64) -> Option<Self> {
        let months = i64::from(year).checked_mul(12)?.checked_add(month0)?;
        let year = i32::try_from(months.div_euclid(12)).ok()?;
        let month = u32::try_from(months.rem_euclid(12) + 1).ok()?;
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;

        let offset = day.checked_sub(1)?;
        let date = if offset >= 0 {
            first.checked_add_days(Days::new(offset.unsigned_abs()))?
        } else {
            first.checked_sub_days(Days::new(offset.unsigned_abs()))?
        };
        Some(Self(date))
    }

    /// January 1 of the given year.
    pub fn new_year(year: i32) -> Option<Self> {
        Self::new(year, 1, 1)
    }

    /// Parse a `[-]YYYY[-MM[-DD]]` date. Missing month and day default to 1.
    ///
    /// Malformed text and dates that do not exist on the calendar yield `None`.
    pub fn parse_iso(text: &str) -> Option<Self> {
        Self::parse_with_precision(text).map(|(date, _)| date)
    }

    /// Like [`CalendarDate::parse_iso`], also reporting how many fields were given.
    pub fn parse_with_precision(text: &str) -> Option<(Self, Precision)> {
        if !ISO_DATE.is_match(text) {
            return None;
        }

        // A leading minus leaves an empty first field when split on '-'
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let mut fields = body.split('-');
        let magnitude: i32 = fields.next()?.parse().ok()?;
        let year = if negative { -magnitude } else { magnitude };

        let (month, precision) = match fields.next() {
            Some(field) => (field.parse::<u32>().ok()?, Precision::Month),
            None => (1, Precision::Year),
        };
        let (day, precision) = match fields.next() {
            Some(field) => (field.parse::<u32>().ok()?, Precision::Day),
            None => (1, precision),
        };

        // Round-trip through normalization so 1900-02-30 is not silently March 2
        let normalized = Self::from_components(year, i64::from(month) - 1, i64::from(day))?;
        if normalized.year() != year || normalized.month() != month || normalized.day() != day {
            return None;
        }
        Some((normalized, precision))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// One-based month.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// One-based day of month.
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Number of days in this date's year (365 or 366).
    pub fn days_in_year(&self) -> u32 {
        NaiveDate::from_ymd_opt(self.year(), 12, 31).map_or(365, |last| last.ordinal())
    }

    /// The date as a continuous year coordinate.
    ///
    /// `year + (days since January 1) / (days in that year)`, so January 1
    /// maps exactly onto the integer year and leap years divide by 366.
    ///
    /// ```
    /// use chronofilter_types::date::CalendarDate;
    ///
    /// assert_eq!(CalendarDate::new(1900, 1, 1).unwrap().decimal_year(), 1900.0);
    /// assert_eq!(CalendarDate::new(2001, 7, 2).unwrap().decimal_year(), 2001.0 + 182.0 / 365.0);
    /// ```
    pub fn decimal_year(&self) -> f64 {
        f64::from(self.year()) + f64::from(self.0.ordinal0()) / f64::from(self.days_in_year())
    }

    /// Whether the year fits the four-digit form [`CalendarDate::parse_iso`] reads.
    pub fn is_iso_representable(&self) -> bool {
        (-9999..=9999).contains(&self.year())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    /// `[-]YYYY-MM-DD`, year padded to four digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self.year();
        if year < 0 {
            f.write_str("-")?;
        }
        write!(
            f,
            "{:04}-{:02}-{:02}",
            year.unsigned_abs(),
            self.month(),
            self.day()
        )
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        CalendarDate::parse_iso(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid calendar date: {text}")))
    }
}

/// A half-open span of days `[start, end)` denoted by a partial date.
///
/// `1900` covers the whole year, `1900-02` all of February and
/// `1900-02-14` a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: CalendarDate,
    pub end: CalendarDate,
}

impl DateRange {
    /// Parse a partial ISO date into the range of days it covers.
    ///
    /// ```
    /// use chronofilter_types::date::{CalendarDate, DateRange};
    ///
    /// let february = DateRange::from_iso("1900-02").unwrap();
    /// assert_eq!(february.start, CalendarDate::new(1900, 2, 1).unwrap());
    /// assert_eq!(february.end, CalendarDate::new(1900, 3, 1).unwrap());
    /// ```
    pub fn from_iso(text: &str) -> Option<Self> {
        let (start, precision) = CalendarDate::parse_with_precision(text)?;
        let (year, month0, day) = (
            start.year(),
            i64::from(start.month()) - 1,
            i64::from(start.day()),
        );
        let end = match precision {
            Precision::Year => CalendarDate::from_components(year.checked_add(1)?, 0, 1)?,
            Precision::Month => CalendarDate::from_components(year, month0 + 1, 1)?,
            Precision::Day => CalendarDate::from_components(year, month0, day + 1)?,
        };
        Some(Self { start, end })
    }

    pub fn contains(&self, date: &CalendarDate) -> bool {
        self.start <= *date && *date < self.end
    }
}
