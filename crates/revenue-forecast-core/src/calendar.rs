use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::types::Granularity;
use crate::ForecastResult;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const MONTH_NAME_FORMATS: [&str; 2] = ["%d %b %Y", "%d %B %Y"];

/// Fiscal calendar supplied by the caller.
///
/// Quarters are counted from `start_month`. A fiscal year is labelled by the
/// calendar year in which it ends, so with the default January start the
/// fiscal year equals the calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalCalendar {
    /// First month of the fiscal year (1–12)
    pub start_month: u32,
}

impl Default for FiscalCalendar {
    fn default() -> Self {
        Self { start_month: 1 }
    }
}

impl FiscalCalendar {
    pub fn new(start_month: u32) -> ForecastResult<Self> {
        let calendar = Self { start_month };
        calendar.validate()?;
        Ok(calendar)
    }

    pub fn validate(&self) -> ForecastResult<()> {
        if !(1..=12).contains(&self.start_month) {
            return Err(ForecastError::invalid(
                "calendar.start_month",
                format!("Fiscal year start month must be 1-12 (got {})", self.start_month),
            ));
        }
        Ok(())
    }

    /// Fiscal quarter (1–4) containing `date`.
    pub fn quarter_of(&self, date: NaiveDate) -> u32 {
        (date.month() + 12 - self.start_month) % 12 / 3 + 1
    }

    /// Fiscal year containing `date`.
    pub fn fiscal_year_of(&self, date: NaiveDate) -> i32 {
        if self.start_month == 1 || date.month() < self.start_month {
            date.year()
        } else {
            date.year() + 1
        }
    }

    /// First day of the given fiscal quarter.
    pub fn quarter_start(&self, fiscal_year: i32, quarter: u32) -> Option<NaiveDate> {
        if !(1..=4).contains(&quarter) {
            return None;
        }
        let first_year = if self.start_month == 1 {
            fiscal_year
        } else {
            fiscal_year - 1
        };
        let year_start = NaiveDate::from_ymd_opt(first_year, self.start_month, 1)?;
        add_months(year_start, 3 * (quarter - 1))
    }

    /// Start date of the period containing `date`.
    pub fn period_start(&self, date: NaiveDate, granularity: Granularity) -> NaiveDate {
        match granularity {
            Granularity::Monthly => month_start(date),
            Granularity::Quarterly => self
                .quarter_start(self.fiscal_year_of(date), self.quarter_of(date))
                .unwrap_or_else(|| month_start(date)),
        }
    }

    /// Period label: `YYYY-MM` for months, `{fiscal_year}Q{n}` for quarters.
    pub fn label(&self, date: NaiveDate, granularity: Granularity) -> String {
        match granularity {
            Granularity::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
            Granularity::Quarterly => format!(
                "{}Q{}",
                self.fiscal_year_of(date),
                self.quarter_of(date)
            ),
        }
    }

    /// Parse a date-like period cell.
    ///
    /// Accepts ISO / slash / US dates, timestamps, `YYYY-MM`, month names
    /// (`Jan 2024`, `March 2024`) and quarter labels (`2024Q3`, `2024-Q3`,
    /// `Q3 2024`). Quarter labels resolve to the first day of that fiscal
    /// quarter.
    pub fn parse_period(&self, text: &str) -> Option<NaiveDate> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(date) = self.parse_quarter_label(trimmed) {
            return Some(date);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.date_naive());
        }

        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Some(dt.date());
            }
        }

        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
                return Some(d);
            }
        }

        // Year-month without a day
        for (sep, fmt) in [("-", "%Y-%m-%d"), ("/", "%Y/%m/%d")] {
            if trimmed.matches(sep).count() == 1 {
                if let Ok(d) = NaiveDate::parse_from_str(&format!("{trimmed}{sep}01"), fmt) {
                    return Some(d);
                }
            }
        }

        let day_first = format!("01 {trimmed}");
        for fmt in MONTH_NAME_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(&day_first, fmt) {
                return Some(d);
            }
        }

        None
    }

    fn parse_quarter_label(&self, text: &str) -> Option<NaiveDate> {
        let compact: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();

        let (year_part, quarter_part) = if let Some(rest) = compact.strip_prefix('Q') {
            // Q3 2024
            (rest.get(1..)?, rest.get(..1)?)
        } else {
            let (year, quarter) = compact.split_once('Q')?;
            (year, quarter)
        };

        if year_part.len() != 4 || quarter_part.len() != 1 {
            return None;
        }
        let year: i32 = year_part.parse().ok()?;
        let quarter: u32 = quarter_part.parse().ok()?;
        self.quarter_start(year, quarter)
    }
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

pub fn sub_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_sub_months(Months::new(months))
}

/// Sort items chronologically by period label.
///
/// Labels compare as dates when every one of them parses; otherwise the
/// whole set falls back to text order.
pub fn sort_by_period<T>(items: &mut [T], label: impl Fn(&T) -> &str) {
    let calendar = FiscalCalendar::default();
    if items.iter().all(|item| calendar.parse_period(label(item)).is_some()) {
        items.sort_by_cached_key(|item| (calendar.parse_period(label(item)), label(item).to_string()));
    } else {
        items.sort_by(|a, b| label(a).cmp(label(b)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_calendar_quarters_default() {
        let cal = FiscalCalendar::default();
        assert_eq!(cal.quarter_of(d(2024, 1, 15)), 1);
        assert_eq!(cal.quarter_of(d(2024, 3, 31)), 1);
        assert_eq!(cal.quarter_of(d(2024, 4, 1)), 2);
        assert_eq!(cal.quarter_of(d(2024, 12, 31)), 4);
        assert_eq!(cal.fiscal_year_of(d(2024, 12, 31)), 2024);
    }

    #[test]
    fn test_october_fiscal_year() {
        let cal = FiscalCalendar::new(10).unwrap();
        assert_eq!(cal.quarter_of(d(2023, 10, 1)), 1);
        assert_eq!(cal.fiscal_year_of(d(2023, 10, 1)), 2024);
        assert_eq!(cal.quarter_of(d(2024, 9, 30)), 4);
        assert_eq!(cal.fiscal_year_of(d(2024, 9, 30)), 2024);
        assert_eq!(cal.quarter_start(2024, 1), Some(d(2023, 10, 1)));
        assert_eq!(cal.quarter_start(2024, 3), Some(d(2024, 4, 1)));
    }

    #[test]
    fn test_invalid_start_month_rejected() {
        assert!(FiscalCalendar::new(0).is_err());
        assert!(FiscalCalendar::new(13).is_err());
    }

    #[test]
    fn test_labels() {
        let cal = FiscalCalendar::default();
        assert_eq!(cal.label(d(2024, 7, 1), Granularity::Monthly), "2024-07");
        assert_eq!(cal.label(d(2024, 7, 1), Granularity::Quarterly), "2024Q3");
    }

    #[test]
    fn test_period_start_quarterly() {
        let cal = FiscalCalendar::default();
        assert_eq!(
            cal.period_start(d(2024, 8, 19), Granularity::Quarterly),
            d(2024, 7, 1)
        );
        assert_eq!(
            cal.period_start(d(2024, 8, 19), Granularity::Monthly),
            d(2024, 8, 1)
        );
    }

    #[test]
    fn test_parse_period_formats() {
        let cal = FiscalCalendar::default();
        assert_eq!(cal.parse_period("2024-03-15"), Some(d(2024, 3, 15)));
        assert_eq!(cal.parse_period("2024/03/15"), Some(d(2024, 3, 15)));
        assert_eq!(cal.parse_period("03/15/2024"), Some(d(2024, 3, 15)));
        assert_eq!(cal.parse_period("2024-03"), Some(d(2024, 3, 1)));
        assert_eq!(cal.parse_period("2024/03"), Some(d(2024, 3, 1)));
        assert_eq!(cal.parse_period("2024-03-15T10:30:00"), Some(d(2024, 3, 15)));
        assert_eq!(
            cal.parse_period("2024-03-15T10:30:00+02:00"),
            Some(d(2024, 3, 15))
        );
        assert_eq!(cal.parse_period("2024Q3"), Some(d(2024, 7, 1)));
        assert_eq!(cal.parse_period("2024-Q3"), Some(d(2024, 7, 1)));
        assert_eq!(cal.parse_period("Q3 2024"), Some(d(2024, 7, 1)));
        assert_eq!(cal.parse_period("Jan 2024"), Some(d(2024, 1, 1)));
        assert_eq!(cal.parse_period("September 2024"), Some(d(2024, 9, 1)));
    }

    #[test]
    fn test_sort_by_period_is_chronological() {
        let mut labels = vec!["Mar 2024", "Jan 2024", "Dec 2023", "Feb 2024"];
        sort_by_period(&mut labels, |l| *l);
        assert_eq!(labels, vec!["Dec 2023", "Jan 2024", "Feb 2024", "Mar 2024"]);

        let mut quarters = vec!["Q1 2025", "2024Q4", "2024-Q3"];
        sort_by_period(&mut quarters, |l| *l);
        assert_eq!(quarters, vec!["2024-Q3", "2024Q4", "Q1 2025"]);
    }

    #[test]
    fn test_sort_by_period_falls_back_to_text() {
        let mut labels = vec!["Mar 2024", "launch", "Jan 2024"];
        sort_by_period(&mut labels, |l| *l);
        assert_eq!(labels, vec!["Jan 2024", "Mar 2024", "launch"]);
    }

    #[test]
    fn test_parse_period_rejects_garbage() {
        let cal = FiscalCalendar::default();
        assert_eq!(cal.parse_period(""), None);
        assert_eq!(cal.parse_period("next quarter"), None);
        assert_eq!(cal.parse_period("2024Q5"), None);
        assert_eq!(cal.parse_period("2024-13"), None);
    }
}
