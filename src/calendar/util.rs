use std::fmt;
use std::iter::successors;
use time::{Date, Month, Weekday};

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// Earliest and latest years that the calendar will show
pub(crate) const MIN_YEAR: i32 = 1;
pub(crate) const MAX_YEAR: i32 = 9999;

pub(crate) trait WeekdayExt {
    fn index0(&self) -> u16;
}

impl WeekdayExt for Weekday {
    fn index0(&self) -> u16 {
        self.number_days_from_sunday().into()
    }
}

/// A month of a particular year
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct YearMonth {
    pub(crate) year: i32,
    pub(crate) month: Month,
}

impl YearMonth {
    pub(crate) fn new(year: i32, month: Month) -> YearMonth {
        YearMonth { year, month }
    }

    pub(crate) fn of(date: Date) -> YearMonth {
        YearMonth::new(date.year(), date.month())
    }

    /// The month as 0 (January) through 11 (December)
    pub(crate) fn index0(self) -> u8 {
        u8::from(self.month) - 1
    }

    /// Months since January of year 0; used to compare and subtract months
    pub(crate) fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.index0())
    }

    pub(crate) fn next(self) -> Option<YearMonth> {
        let month = self.month.next();
        let year = if month == Month::January {
            self.year + 1
        } else {
            self.year
        };
        (year <= MAX_YEAR).then_some(YearMonth::new(year, month))
    }

    pub(crate) fn previous(self) -> Option<YearMonth> {
        let month = self.month.previous();
        let year = if month == Month::December {
            self.year - 1
        } else {
            self.year
        };
        (year >= MIN_YEAR).then_some(YearMonth::new(year, month))
    }

    /// Steps `n` months forwards (or backwards for negative `n`), stopping
    /// early at the edge of the calendar.  Returns `None` if no step at all
    /// could be taken.
    pub(crate) fn step(self, n: i64) -> Option<YearMonth> {
        let mut ym = self;
        for _ in 0..n.unsigned_abs() {
            let stepped = if n < 0 { ym.previous() } else { ym.next() };
            match stepped {
                Some(s) => ym = s,
                None => break,
            }
        }
        (ym != self || n == 0).then_some(ym)
    }

    pub(crate) fn first_day(self) -> Option<Date> {
        Date::from_calendar_date(self.year, self.month, 1).ok()
    }

    pub(crate) fn contains(self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

/// Iterates over `first` and the days after it that fall in the same month
pub(crate) fn days_of_month(first: Date) -> impl Iterator<Item = Date> {
    let month = first.month();
    successors(Some(first), |&d| d.next_day())
        .take_while(move |d| d.month() == month)
}

/// Returns the date `days` days after `date` (before it, if negative),
/// or `None` if that leaves the calendar
pub(crate) fn shift_days(date: Date, days: i64) -> Option<Date> {
    date.checked_add(time::Duration::days(days))
        .filter(|d| (MIN_YEAR..=MAX_YEAR).contains(&d.year()))
}
