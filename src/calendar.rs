use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate, Weekday};
use std::fmt;

/// A calendar month, the unit the time grid is rendered over
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(anyhow!("month out of range: {}", month));
        }
        Ok(Self { year, month })
    }

    /// Parse a "YYYY-MM" string
    pub fn parse(s: &str) -> Result<Self> {
        let (year_str, month_str) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("invalid month format (expected YYYY-MM): {}", s))?;
        let year: i32 = year_str
            .parse()
            .map_err(|_| anyhow!("invalid year in month: {}", s))?;
        let month: u32 = month_str
            .parse()
            .map_err(|_| anyhow!("invalid month in: {}", s))?;
        Self::new(year, month)
    }

    /// The month containing today's local date
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Whether a date falls inside this month
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(self) -> NaiveDate {
        // Month is validated on construction, so day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("first of month must exist")
    }

    /// Number of days in this month (28-31)
    pub fn day_count(self) -> u32 {
        let next_first = self.next().first_day();
        next_first
            .signed_duration_since(self.first_day())
            .num_days() as u32
    }

    /// Enumerate every day of the month for the grid header
    pub fn days(self) -> Vec<CalendarDay> {
        let today = Local::now().date_naive();
        self.days_with_today(today)
    }

    pub fn days_with_today(self, today: NaiveDate) -> Vec<CalendarDay> {
        (1..=self.day_count())
            .map(|day| {
                let date = NaiveDate::from_ymd_opt(self.year, self.month, day)
                    .expect("day within month must exist");
                CalendarDay {
                    date,
                    day_of_month: day,
                    weekday: date.weekday(),
                    is_today: date == today,
                }
            })
            .collect()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A single day cell in the month header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub weekday: Weekday,
    pub is_today: bool,
}

impl CalendarDay {
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday, Weekday::Sat | Weekday::Sun)
    }
}

/// Format milliseconds as a running clock: "H:MM:SS" with hours, "MM:SS" without
pub fn format_clock(milliseconds: i64) -> String {
    let total_seconds = (milliseconds / 1000).max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Format a manual minutes value: whole numbers bare, otherwise one decimal
pub fn format_minutes_decimal(minutes: f64) -> String {
    if (minutes - minutes.round()).abs() < f64::EPSILON {
        format!("{}", minutes.round() as i64)
    } else {
        format!("{:.1}", minutes)
    }
}

pub fn minutes_to_millis(minutes: f64) -> i64 {
    (minutes * 60_000.0).round() as i64
}
