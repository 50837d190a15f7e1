//! Period specification parsing and bucket arithmetic.
//!
//! A specification names an optional repeating interval and an optional
//! `[from, to)` range, e.g. `every 2 weeks from 2024-01-07` or
//! `monthly until 2025-01-01`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, TimeDelta};

use super::error::PeriodError;

/// An inclusive span of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateRange {
    /// First day of the span.
    pub start: NaiveDate,
    /// Last day of the span.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Returns true if the given date falls within this range.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Widens the range so that it covers `date`.
    pub fn include(&mut self, date: NaiveDate) {
        self.start = self.start.min(date);
        self.end = self.end.max(date);
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Calendar unit of a repeating interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    /// Calendar days.
    Day,
    /// Weeks starting on Sunday.
    Week,
    /// Calendar months.
    Month,
    /// Calendar quarters (Jan, Apr, Jul, Oct).
    Quarter,
    /// Calendar years.
    Year,
}

impl IntervalUnit {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "day" | "days" => Some(Self::Day),
            "week" | "weeks" => Some(Self::Week),
            "month" | "months" => Some(Self::Month),
            "quarter" | "quarters" => Some(Self::Quarter),
            "year" | "years" => Some(Self::Year),
            _ => None,
        }
    }
}

/// A repeating interval: `count` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Unit of the interval.
    pub unit: IntervalUnit,
    /// Number of units per bucket (at least one).
    pub count: u32,
}

impl Interval {
    /// Creates a new interval.
    #[must_use]
    pub const fn new(unit: IntervalUnit, count: u32) -> Self {
        Self { unit, count }
    }

    /// The natural boundary at or before `date` for this interval's unit.
    #[must_use]
    pub fn natural_start(&self, date: NaiveDate) -> NaiveDate {
        let first_of_month = |month: u32| NaiveDate::from_ymd_opt(date.year(), month, 1);
        let start = match self.unit {
            IntervalUnit::Day => Some(date),
            IntervalUnit::Week => date.checked_sub_signed(TimeDelta::days(i64::from(
                date.weekday().num_days_from_sunday(),
            ))),
            IntervalUnit::Month => first_of_month(date.month()),
            IntervalUnit::Quarter => first_of_month(date.month0() / 3 * 3 + 1),
            IntervalUnit::Year => first_of_month(1),
        };
        start.unwrap_or(date)
    }

    /// Returns the bucket containing `date`, counting from `anchor`.
    ///
    /// Dates before the anchor fall into buckets extending backwards.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::OutOfRange` if the bucket cannot be represented.
    pub fn bucket(&self, anchor: NaiveDate, date: NaiveDate) -> Result<DateRange, PeriodError> {
        let out_of_range = || PeriodError::OutOfRange(date);
        match self.unit {
            IntervalUnit::Day | IntervalUnit::Week => {
                let unit_days = if self.unit == IntervalUnit::Day { 1 } else { 7 };
                let span = i64::from(self.count) * unit_days;
                let index = (date - anchor).num_days().div_euclid(span);
                let start = anchor
                    .checked_add_signed(TimeDelta::days(index * span))
                    .ok_or_else(out_of_range)?;
                let end = start
                    .checked_add_signed(TimeDelta::days(span - 1))
                    .ok_or_else(out_of_range)?;
                Ok(DateRange::new(start, end))
            }
            IntervalUnit::Month | IntervalUnit::Quarter | IntervalUnit::Year => {
                let unit_months = match self.unit {
                    IntervalUnit::Quarter => 3,
                    IntervalUnit::Year => 12,
                    _ => 1,
                };
                let span = i64::from(self.count) * unit_months;
                let elapsed = (i64::from(date.year()) - i64::from(anchor.year())) * 12
                    + i64::from(date.month0())
                    - i64::from(anchor.month0());
                let bucket_at = |offset: i64| -> Result<DateRange, PeriodError> {
                    let start = shift_months(anchor, offset).ok_or_else(out_of_range)?;
                    let end = shift_months(anchor, offset + span)
                        .and_then(|next| next.pred_opt())
                        .ok_or_else(out_of_range)?;
                    Ok(DateRange::new(start, end))
                };
                // Month arithmetic clamps to month ends, so the calendar
                // month count can be one bucket off in either direction.
                let offset = elapsed.div_euclid(span) * span;
                let range = bucket_at(offset)?;
                if range.contains_date(date) {
                    Ok(range)
                } else if date < range.start {
                    bucket_at(offset - span)
                } else {
                    bucket_at(offset + span)
                }
            }
        }
    }
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

/// A parsed period specification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodSpec {
    /// Repeating interval, if any. Without one, everything in range forms
    /// a single bucket.
    pub interval: Option<Interval>,
    /// Inclusive beginning of the reported range.
    pub begin: Option<NaiveDate>,
    /// Exclusive end of the reported range.
    pub end: Option<NaiveDate>,
}

impl PeriodSpec {
    /// Parses a specification such as `monthly from 2024-01-01`.
    ///
    /// # Errors
    ///
    /// Returns a `PeriodError` describing the first token that could not
    /// be understood.
    pub fn parse(text: &str) -> Result<Self, PeriodError> {
        let lowered = text.trim().to_lowercase();
        let mut tokens = lowered.split_whitespace().peekable();
        if tokens.peek().is_none() {
            return Err(PeriodError::Empty);
        }

        let mut spec = Self::default();
        while let Some(token) = tokens.next() {
            let named = match token {
                "daily" => Some(Interval::new(IntervalUnit::Day, 1)),
                "weekly" => Some(Interval::new(IntervalUnit::Week, 1)),
                "biweekly" => Some(Interval::new(IntervalUnit::Week, 2)),
                "monthly" => Some(Interval::new(IntervalUnit::Month, 1)),
                "bimonthly" => Some(Interval::new(IntervalUnit::Month, 2)),
                "quarterly" => Some(Interval::new(IntervalUnit::Quarter, 1)),
                "yearly" | "annually" => Some(Interval::new(IntervalUnit::Year, 1)),
                _ => None,
            };
            if let Some(interval) = named {
                spec.set_interval(interval)?;
                continue;
            }

            match token {
                "every" => {
                    let mut word = tokens
                        .next()
                        .ok_or_else(|| PeriodError::MissingArgument(token.to_string()))?;
                    let mut count = 1;
                    if word.chars().all(|c| c.is_ascii_digit()) {
                        count = word
                            .parse::<u32>()
                            .ok()
                            .filter(|n| *n > 0)
                            .ok_or_else(|| PeriodError::InvalidCount(word.to_string()))?;
                        word = tokens
                            .next()
                            .ok_or_else(|| PeriodError::MissingArgument(token.to_string()))?;
                    }
                    let unit = IntervalUnit::from_word(word)
                        .ok_or_else(|| PeriodError::UnknownToken(word.to_string()))?;
                    spec.set_interval(Interval::new(unit, count))?;
                }
                "from" | "since" => {
                    let value = tokens
                        .next()
                        .ok_or_else(|| PeriodError::MissingArgument(token.to_string()))?;
                    spec.begin = Some(parse_date(value)?);
                }
                "to" | "until" => {
                    let value = tokens
                        .next()
                        .ok_or_else(|| PeriodError::MissingArgument(token.to_string()))?;
                    spec.end = Some(parse_date(value)?);
                }
                other => return Err(PeriodError::UnknownToken(other.to_string())),
            }
        }

        if let (Some(begin), Some(end)) = (spec.begin, spec.end)
            && begin > end
        {
            return Err(PeriodError::InvertedRange { begin, end });
        }
        Ok(spec)
    }

    fn set_interval(&mut self, interval: Interval) -> Result<(), PeriodError> {
        if self.interval.replace(interval).is_some() {
            return Err(PeriodError::DuplicateInterval);
        }
        Ok(())
    }

    /// Returns true if `date` lies within `[begin, end)`.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.begin.is_none_or(|begin| date >= begin) && self.end.is_none_or(|end| date < end)
    }

    /// The anchor buckets are counted from, given the first date seen.
    #[must_use]
    pub fn anchor_for(&self, first_date: NaiveDate) -> NaiveDate {
        match (self.begin, self.interval) {
            (Some(begin), _) => begin,
            (None, Some(interval)) => interval.natural_start(first_date),
            (None, None) => first_date,
        }
    }
}

impl FromStr for PeriodSpec {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, PeriodError> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y/%m/%d"))
        .map_err(|_| PeriodError::InvalidDate(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("daily", IntervalUnit::Day, 1)]
    #[case("weekly", IntervalUnit::Week, 1)]
    #[case("biweekly", IntervalUnit::Week, 2)]
    #[case("Monthly", IntervalUnit::Month, 1)]
    #[case("quarterly", IntervalUnit::Quarter, 1)]
    #[case("annually", IntervalUnit::Year, 1)]
    #[case("every 3 days", IntervalUnit::Day, 3)]
    #[case("every month", IntervalUnit::Month, 1)]
    #[case("every 2 years", IntervalUnit::Year, 2)]
    fn test_parse_intervals(#[case] text: &str, #[case] unit: IntervalUnit, #[case] count: u32) {
        let spec = PeriodSpec::parse(text).unwrap();
        assert_eq!(spec.interval, Some(Interval::new(unit, count)));
        assert!(spec.begin.is_none());
        assert!(spec.end.is_none());
    }

    #[test]
    fn test_parse_range() {
        let spec: PeriodSpec = "monthly from 2024-01-01 to 2024/07/01".parse().unwrap();
        assert_eq!(spec.begin, Some(date(2024, 1, 1)));
        assert_eq!(spec.end, Some(date(2024, 7, 1)));
        assert!(spec.contains(date(2024, 6, 30)));
        assert!(!spec.contains(date(2024, 7, 1)));
        assert!(!spec.contains(date(2023, 12, 31)));
    }

    #[rstest]
    #[case("", PeriodError::Empty)]
    #[case("fortnightly", PeriodError::UnknownToken("fortnightly".to_string()))]
    #[case("every 0 days", PeriodError::InvalidCount("0".to_string()))]
    #[case("every", PeriodError::MissingArgument("every".to_string()))]
    #[case("from", PeriodError::MissingArgument("from".to_string()))]
    #[case("from 2024-13-01", PeriodError::InvalidDate("2024-13-01".to_string()))]
    #[case("weekly monthly", PeriodError::DuplicateInterval)]
    fn test_parse_errors(#[case] text: &str, #[case] expected: PeriodError) {
        assert_eq!(PeriodSpec::parse(text).unwrap_err(), expected);
    }

    #[test]
    fn test_parse_inverted_range() {
        assert!(matches!(
            PeriodSpec::parse("from 2024-02-01 to 2024-01-01"),
            Err(PeriodError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_natural_start() {
        // 2024-01-17 is a Wednesday
        let d = date(2024, 1, 17);
        assert_eq!(Interval::new(IntervalUnit::Week, 1).natural_start(d), date(2024, 1, 14));
        assert_eq!(Interval::new(IntervalUnit::Month, 1).natural_start(d), date(2024, 1, 1));
        assert_eq!(
            Interval::new(IntervalUnit::Quarter, 1).natural_start(date(2024, 8, 9)),
            date(2024, 7, 1)
        );
        assert_eq!(Interval::new(IntervalUnit::Year, 1).natural_start(d), date(2024, 1, 1));
    }

    #[test]
    fn test_monthly_bucket() {
        let monthly = Interval::new(IntervalUnit::Month, 1);
        let bucket = monthly.bucket(date(2024, 1, 1), date(2024, 2, 29)).unwrap();
        assert_eq!(bucket, DateRange::new(date(2024, 2, 1), date(2024, 2, 29)));
    }

    #[rstest]
    #[case(date(2024, 2, 28), date(2024, 1, 31), date(2024, 2, 28))]
    #[case(date(2024, 2, 29), date(2024, 2, 29), date(2024, 3, 30))]
    #[case(date(2024, 3, 30), date(2024, 2, 29), date(2024, 3, 30))]
    #[case(date(2024, 3, 31), date(2024, 3, 31), date(2024, 4, 29))]
    fn test_monthly_bucket_from_month_end(
        #[case] on: NaiveDate,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        let monthly = Interval::new(IntervalUnit::Month, 1);
        let bucket = monthly.bucket(date(2024, 1, 31), on).unwrap();
        assert_eq!(bucket, DateRange::new(start, end));
        assert!(bucket.contains_date(on));
    }

    #[test]
    fn test_bucket_before_anchor() {
        let weekly = Interval::new(IntervalUnit::Week, 1);
        let bucket = weekly.bucket(date(2024, 1, 14), date(2024, 1, 10)).unwrap();
        assert_eq!(bucket, DateRange::new(date(2024, 1, 7), date(2024, 1, 13)));

        let quarterly = Interval::new(IntervalUnit::Quarter, 1);
        let bucket = quarterly.bucket(date(2024, 1, 1), date(2023, 11, 5)).unwrap();
        assert_eq!(bucket, DateRange::new(date(2023, 10, 1), date(2023, 12, 31)));
    }

    #[test]
    fn test_multi_unit_bucket() {
        let every_ten = Interval::new(IntervalUnit::Day, 10);
        let bucket = every_ten.bucket(date(2024, 1, 1), date(2024, 1, 25)).unwrap();
        assert_eq!(bucket, DateRange::new(date(2024, 1, 21), date(2024, 1, 30)));
    }

    #[test]
    fn test_anchor_for() {
        let spec = PeriodSpec::parse("monthly").unwrap();
        assert_eq!(spec.anchor_for(date(2024, 3, 15)), date(2024, 3, 1));
        let spec = PeriodSpec::parse("monthly from 2024-01-10").unwrap();
        assert_eq!(spec.anchor_for(date(2024, 3, 15)), date(2024, 1, 10));
    }

    #[test]
    fn test_date_range_include() {
        let mut range = DateRange::new(date(2024, 1, 5), date(2024, 1, 5));
        range.include(date(2024, 1, 2));
        range.include(date(2024, 1, 9));
        assert_eq!(range, DateRange::new(date(2024, 1, 2), date(2024, 1, 9)));
        assert_eq!(range.to_string(), "2024-01-02 - 2024-01-09");
    }
}
