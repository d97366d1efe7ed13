use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use teamgrid_core::{GridError, GridResult};

/// One calendar quarter, e.g. Q3 2025. The quarter window is an ordered list
/// of these, each expanded into its Monday-aligned week sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Quarter {
    pub year: i32,
    pub number: u8,
}

impl Quarter {
    pub fn new(year: i32, number: u8) -> GridResult<Self> {
        if (1..=4).contains(&number) {
            Ok(Self { year, number })
        } else {
            Err(GridError::Validation(format!(
                "quarter number {number} out of range 1..=4"
            )))
        }
    }

    /// The quarter containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            number: ((date.month0() / 3) + 1) as u8,
        }
    }

    /// Next quarter, rolling the year over at 4 -> 1.
    pub fn next(self) -> Self {
        if self.number == 4 {
            Self { year: self.year + 1, number: 1 }
        } else {
            Self { year: self.year, number: self.number + 1 }
        }
    }

    /// Previous quarter, rolling the year over at 1 -> 4.
    pub fn prev(self) -> Self {
        if self.number == 1 {
            Self { year: self.year - 1, number: 4 }
        } else {
            Self { year: self.year, number: self.number - 1 }
        }
    }

    pub fn first_day(self) -> NaiveDate {
        let month = (self.number as u32 - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1).expect("valid quarter start")
    }

    pub fn last_day(self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    /// Monday-aligned week starts covering the whole quarter, including the
    /// partial weeks at both boundaries.
    pub fn week_starts(self) -> Vec<NaiveDate> {
        let first_monday = monday_on_or_before(self.first_day());
        let last_monday = monday_on_or_before(self.last_day());

        let mut weeks = Vec::new();
        let mut monday = first_monday;
        while monday <= last_monday {
            weeks.push(monday);
            monday += Duration::days(7);
        }
        weeks
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.number, self.year)
    }
}

fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}
